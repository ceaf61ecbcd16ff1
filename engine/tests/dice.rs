use proptest::prelude::*;
use rpg_engine::{
    ability_mod, AbilityScoreMethod, AdMode, CombatError, Dice, DiceExpression, DiceRoller, KeepRule,
};

#[test]
fn parses_the_common_shapes() {
    let e = DiceExpression::parse("2d6+3").unwrap();
    assert_eq!((e.dice_count, e.dice_sides, e.modifier), (2, 6, 3));
    assert_eq!(e.keep, None);

    let e = DiceExpression::parse("d20").unwrap();
    assert_eq!((e.dice_count, e.dice_sides), (1, 20));

    let e = DiceExpression::parse("4d6kh3").unwrap();
    assert_eq!(e.keep, Some(KeepRule::Highest(3)));

    let e = DiceExpression::parse("1d20+5 advantage").unwrap();
    assert_eq!(e.mode, AdMode::Advantage);
    assert_eq!(e.modifier, 5);

    let e = DiceExpression::parse("1d20 adv dis").unwrap();
    assert_eq!(e.mode, AdMode::Normal);
}

#[test]
fn oversized_expressions_are_rejected() {
    for text in ["2000d6", "1d5000"] {
        assert!(matches!(
            DiceExpression::parse(text),
            Err(CombatError::InvalidExpression { .. })
        ));
    }
}

#[test]
fn roll_never_fails_it_reports() {
    let mut roller = DiceRoller::seeded(1);
    let res = roller.roll("2000d6", Some("Damage"));
    assert!(res.is_error());
    assert_eq!(res.total, 0);
    assert!(res.individual_rolls.is_empty());
}

#[test]
fn modifier_only_rolls_no_dice() {
    let mut roller = DiceRoller::seeded(1);
    let res = roller.roll("-3", None);
    assert_eq!(res.total, -3);
    assert!(res.individual_rolls.is_empty());
}

#[test]
fn advantage_keeps_the_higher_die() {
    let mut roller = DiceRoller::seeded(5);
    for _ in 0..50 {
        let res = roller.roll("1d20 advantage", None);
        assert_eq!(res.individual_rolls.len(), 2);
        assert_eq!(res.kept_rolls, vec![*res.individual_rolls.iter().max().unwrap()]);
        assert_eq!(res.dropped_rolls.len(), 1);
    }
    for _ in 0..50 {
        let res = roller.roll("1d20 disadvantage", None);
        assert_eq!(res.kept_rolls, vec![*res.individual_rolls.iter().min().unwrap()]);
    }
}

#[test]
fn advantage_is_ignored_on_other_dice() {
    let mut roller = DiceRoller::seeded(5);
    let res = roller.roll("2d6 advantage", None);
    assert_eq!(res.individual_rolls.len(), 2);
    assert_eq!(res.mode, AdMode::Normal);
    assert!(res.dropped_rolls.is_empty());
}

#[test]
fn advantage_raises_the_average() {
    let mut roller = DiceRoller::seeded(2024);
    let n = 2000;
    let sum: i32 = (0..n).map(|_| roller.roll("1d20 adv", None).total).sum();
    let mean = sum as f64 / n as f64;
    assert!(mean > 12.5, "mean with advantage was {mean}");
}

#[test]
fn disadvantage_lowers_the_average() {
    let mut roller = DiceRoller::seeded(2024);
    let n = 2000;
    let sum: i32 = (0..n).map(|_| roller.roll("1d20 dis", None).total).sum();
    let mean = sum as f64 / n as f64;
    assert!(mean < 8.5, "mean with disadvantage was {mean}");
}

#[test]
fn totals_past_i32_are_reported_not_wrapped() {
    let mut roller = DiceRoller::seeded(1);
    let res = roller.roll("1d20+2147483647", Some("Smite"));
    assert!(res.is_error());
    assert_eq!(res.total, 0);
    assert_eq!(res.context_label.as_deref(), Some("Smite"));
    assert_eq!(roller.history(None).len(), 1);

    let res = roller.roll("1d20-2147483647", None);
    assert!(!res.is_error());
    assert!(res.total < -2147483600);
    assert!(res.dice_display().contains(" - 2147483647"));

    let expr = DiceExpression::d20(i32::MAX, AdMode::Advantage);
    assert!(roller.roll_expression(&expr, None).is_error());
}

#[test]
fn hit_points_saturate_instead_of_wrapping() {
    let mut roller = DiceRoller::seeded(1);
    assert_eq!(roller.roll_hit_points(10, 1, i32::MAX), i32::MAX);
    assert_eq!(roller.roll_hit_points(10, 3, i32::MAX), i32::MAX);
    assert_eq!(roller.roll_hit_points(u32::MAX, 1, 0), i32::MAX);
    assert_eq!(roller.roll_hit_points(u32::MAX, 2, 5), i32::MAX);
    assert_eq!(roller.roll_hit_points(10, 1, i32::MIN), 1);
    assert_eq!(ability_mod(i32::MIN), i32::MIN / 2);
}

#[test]
fn crits_only_on_a_lone_d20() {
    let mut roller = DiceRoller::new(Dice::from_scripted(vec![20]));
    let res = roller.roll("1d20+2", None);
    assert!(res.critical_hit);
    assert_eq!(res.total, 22);

    let res = roller.roll("2d20", None);
    assert!(!res.critical_hit);
    assert_eq!(res.total, 40);

    let mut roller = DiceRoller::new(Dice::from_scripted(vec![1]));
    let res = roller.roll("1d20+7", None);
    assert!(res.critical_fail);
    assert!(!res.critical_hit);

    let mut roller = DiceRoller::new(Dice::from_scripted(vec![1, 20]));
    let res = roller.roll("1d20 advantage", None);
    assert_eq!(res.kept_rolls, vec![20]);
    assert!(res.critical_hit);
}

#[test]
fn keep_count_larger_than_dice_keeps_everything() {
    let mut roller = DiceRoller::new(Dice::from_scripted(vec![3, 5]));
    let res = roller.roll("2d6k5", None);
    assert_eq!(res.kept_rolls.len(), 2);
    assert!(res.dropped_rolls.is_empty());
    assert_eq!(res.total, 8);
}

#[test]
fn hit_points_take_the_maximum_at_first_level() {
    let mut roller = DiceRoller::seeded(9);
    assert_eq!(roller.roll_hit_points(10, 1, 2), 12);

    let mut roller = DiceRoller::new(Dice::from_scripted(vec![4, 7]));
    assert_eq!(roller.roll_hit_points(8, 3, 1), 8 + 1 + (4 + 1) + (7 + 1));

    let mut roller = DiceRoller::new(Dice::from_scripted(vec![1]));
    assert_eq!(roller.roll_hit_points(6, 2, -5), 1);
}

#[test]
fn ability_scores_drop_the_lowest_die() {
    let mut roller = DiceRoller::new(Dice::from_scripted(vec![2, 6, 4, 5]));
    let scores = roller.roll_ability_scores(AbilityScoreMethod::FourD6DropLowest);
    assert_eq!(scores, [15; 6]);
    assert_eq!(roller.history(None).len(), 6);

    let scores = roller.roll_ability_scores(AbilityScoreMethod::PointBuy);
    assert_eq!(scores, [8; 6]);
}

#[test]
fn history_tracks_labels() {
    let mut roller = DiceRoller::seeded(3);
    roller.roll("1d4", Some("Dagger"));
    roller.roll("1d6", Some("Shortsword"));
    let last = roller.history(Some(1));
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].context_label.as_deref(), Some("Shortsword"));
    roller.clear_history();
    assert!(roller.history(None).is_empty());
}

#[test]
fn checks_meet_or_beat_the_dc() {
    let mut roller = DiceRoller::new(Dice::from_scripted(vec![12]));
    let res = roller.check(3, 15, AdMode::Normal);
    assert_eq!(res.total, 15);
    assert!(res.passed);
    let res = roller.check(2, 15, AdMode::Normal);
    assert!(!res.passed);
    assert_eq!(res.roll.context_label.as_deref(), Some("Check"));

    assert_eq!(ability_mod(10), 0);
    assert_eq!(ability_mod(15), 2);
    assert_eq!(ability_mod(9), -1);
    assert_eq!(ability_mod(1), -5);
}

proptest! {
    #[test]
    fn total_is_kept_dice_plus_modifier(
        count in 1u32..=10,
        sides in 1u32..=100,
        modifier in -20i32..=20,
        seed in any::<u64>(),
    ) {
        let mut roller = DiceRoller::seeded(seed);
        let res = roller.roll(&format!("{count}d{sides}{modifier:+}"), None);
        prop_assert!(res.error.is_none());
        prop_assert_eq!(res.individual_rolls.len(), count as usize);
        prop_assert!(res.individual_rolls.iter().all(|r| (1..=sides).contains(r)));
        let sum: i32 = res.individual_rolls.iter().map(|r| *r as i32).sum();
        prop_assert_eq!(res.total, sum + modifier);
        prop_assert!(res.total >= count as i32 + modifier);
        prop_assert!(res.total <= (count * sides) as i32 + modifier);
    }

    #[test]
    fn keep_highest_never_drops_a_bigger_die(
        count in 1u32..=8,
        keep in 1u32..=8,
        seed in any::<u64>(),
    ) {
        let mut roller = DiceRoller::seeded(seed);
        let res = roller.roll(&format!("{count}d6kh{keep}"), None);
        prop_assert_eq!(res.kept_rolls.len(), keep.min(count) as usize);
        prop_assert_eq!(res.kept_rolls.len() + res.dropped_rolls.len(), count as usize);
        let min_kept = res.kept_rolls.iter().min().copied().unwrap_or(0);
        prop_assert!(res.dropped_rolls.iter().all(|d| *d <= min_kept));
    }

    #[test]
    fn keep_lowest_never_keeps_a_bigger_die(
        count in 1u32..=8,
        keep in 1u32..=8,
        seed in any::<u64>(),
    ) {
        let mut roller = DiceRoller::seeded(seed);
        let res = roller.roll(&format!("{count}d6kl{keep}"), None);
        prop_assert_eq!(res.kept_rolls.len(), keep.min(count) as usize);
        prop_assert_eq!(res.kept_rolls.len() + res.dropped_rolls.len(), count as usize);
        let max_kept = res.kept_rolls.iter().max().copied().unwrap_or(0);
        prop_assert!(res.dropped_rolls.iter().all(|d| *d >= max_kept));
        let sum: i32 = res.kept_rolls.iter().map(|r| *r as i32).sum();
        prop_assert_eq!(res.total, sum);
    }

    #[test]
    fn seeded_rollers_replay(seed in any::<u64>()) {
        let mut a = DiceRoller::seeded(seed);
        let mut b = DiceRoller::seeded(seed);
        for text in ["1d20+3", "4d6kh3", "2d8-1", "1d20 disadvantage"] {
            prop_assert_eq!(a.roll(text, None), b.roll(text, None));
        }
    }
}
