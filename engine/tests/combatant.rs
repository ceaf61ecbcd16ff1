use rpg_engine::{
    ActionType, Combatant, CombatantId, CombatantSpec, CombatError, Condition, DamageType,
    DeathSaveOutcome,
};

fn hero() -> Combatant {
    Combatant::new(CombatantId(1), CombatantSpec::new("Hero", 12, 15).player())
}

fn goblin() -> Combatant {
    Combatant::new(CombatantId(2), CombatantSpec::new("Goblin", 7, 15))
}

#[test]
fn players_fall_unconscious_and_monsters_die() {
    let mut h = hero();
    let out = h.take_damage(20, DamageType::Slashing);
    assert_eq!(out.new_hp, 0);
    assert!(out.unconscious && !out.dead && out.dropped);
    assert!(!h.is_alive());

    let mut g = goblin();
    let out = g.take_damage(7, DamageType::Piercing);
    assert!(out.dead && out.dropped);
    assert!(g.is_dead());
}

#[test]
fn damage_to_the_dead_changes_nothing() {
    let mut g = goblin();
    g.take_damage(10, DamageType::Fire);
    let out = g.take_damage(5, DamageType::Fire);
    assert_eq!(out.new_hp, 0);
    assert!(out.dead);
    assert!(!out.dropped);
}

#[test]
fn negative_amounts_count_as_zero() {
    let mut g = goblin();
    assert_eq!(g.take_damage(-4, DamageType::Cold).new_hp, 7);
    g.take_damage(3, DamageType::Cold);
    assert_eq!(g.heal(-2).healing_applied, 0);
}

#[test]
fn healing_caps_at_max_and_revives_the_unconscious() {
    let mut h = hero();
    h.take_damage(5, DamageType::Bludgeoning);
    let out = h.heal(50);
    assert_eq!(out.new_hp, 12);
    assert_eq!(out.healing_applied, 5);
    assert!(!out.revived);

    h.take_damage(30, DamageType::Bludgeoning);
    let out = h.heal(4);
    assert!(out.revived);
    assert_eq!(h.current_hp(), 4);
    assert!(h.is_alive());
}

#[test]
fn huge_heals_stop_at_max_hp() {
    let mut h = hero();
    h.take_damage(5, DamageType::Bludgeoning);
    let out = h.heal(i32::MAX);
    assert_eq!(out.new_hp, 12);
    assert_eq!(out.healing_applied, 5);

    h.take_damage(i32::MAX, DamageType::Bludgeoning);
    assert_eq!(h.current_hp(), 0);
    let out = h.heal(i32::MAX);
    assert!(out.revived);
    assert_eq!(out.new_hp, 12);
}

#[test]
fn the_dead_cannot_be_healed() {
    let mut g = goblin();
    g.take_damage(7, DamageType::Acid);
    let out = g.heal(10);
    assert_eq!(out.healing_applied, 0);
    assert_eq!(g.current_hp(), 0);
    assert!(g.is_dead());
}

#[test]
fn max_hp_is_at_least_one() {
    let c = Combatant::new(CombatantId(9), CombatantSpec::new("Wisp", 0, 10));
    assert_eq!(c.max_hp(), 1);
    assert_eq!(c.current_hp(), 1);
}

#[test]
fn death_saves_follow_the_table() {
    let mut h = hero();
    assert_eq!(h.record_death_save(15), DeathSaveOutcome::NotDying);

    h.take_damage(12, DamageType::Necrotic);
    assert_eq!(h.record_death_save(12), DeathSaveOutcome::Success { successes: 1 });
    assert_eq!(h.record_death_save(1), DeathSaveOutcome::Failure { failures: 2 });
    assert_eq!(h.record_death_save(5), DeathSaveOutcome::Died);
    assert!(h.is_dead());

    let mut h = hero();
    h.take_damage(12, DamageType::Necrotic);
    assert_eq!(h.record_death_save(20), DeathSaveOutcome::Revived);
    assert_eq!(h.current_hp(), 1);

    let mut h = hero();
    h.take_damage(12, DamageType::Necrotic);
    assert!(h.stabilize());
    assert_eq!(h.record_death_save(3), DeathSaveOutcome::NotDying);
}

#[test]
fn action_economy_is_spent_and_reset() {
    let mut h = hero();
    h.spend(ActionType::Action).unwrap();
    assert!(matches!(
        h.spend(ActionType::Action),
        Err(CombatError::NoActionAvailable { resource: ActionType::Action, .. })
    ));
    h.spend(ActionType::FreeAction).unwrap();
    h.spend(ActionType::FreeAction).unwrap();

    assert_eq!(h.spend_movement(20).unwrap(), 10);
    assert!(h.spend_movement(15).is_err());

    h.reset_turn();
    assert!(h.has_action && h.has_bonus_action && h.has_reaction);
    assert_eq!(h.movement_remaining, 30);
}

#[test]
fn reset_turn_leaves_conditions_alone() {
    let mut h = hero();
    h.add_condition(Condition::new("blessed", 1));
    h.reset_turn();
    assert!(h.has_condition("blessed"));
    assert_eq!(h.update_conditions(), vec!["blessed".to_string()]);
    assert!(!h.has_condition("blessed"));
}

#[test]
fn conditions_replace_by_name() {
    let mut h = hero();
    assert!(h.add_condition(Condition::new("poisoned", 3)).is_none());
    let old = h.add_condition(Condition::new("poisoned", 5).with_source("Spider"));
    assert_eq!(old.map(|c| c.duration_rounds), Some(3));
    assert_eq!(h.conditions.len(), 1);

    h.add_condition(Condition::permanent("cursed"));
    for _ in 0..10 {
        h.update_conditions();
    }
    assert!(h.has_condition("cursed"));
    assert!(!h.has_condition("poisoned"));
}
