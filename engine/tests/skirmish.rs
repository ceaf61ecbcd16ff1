use rpg_engine::api::{
    builtin_roster, engine_with_roster, parse_roster, simulate_skirmish, Winner,
};
use rpg_engine::config::ContentFormat;
use rpg_engine::{CombatEngine, CombatPhase, CombatantSpec, Dice, EngineConfig};

#[test]
fn builtin_rosters_parse() {
    let ambush = builtin_roster("goblin_ambush").expect("goblin_ambush roster");
    assert_eq!(ambush.len(), 5);
    assert_eq!(ambush.iter().filter(|s| s.is_player_controlled).count(), 2);
    assert!(builtin_roster("duel").is_ok());
    assert!(builtin_roster("dragon_lair").is_err());
}

#[test]
fn yaml_rosters_fill_in_defaults() {
    let yaml = "- name: Scout\n  max_hp: 9\n  is_player_controlled: true\n- name: Rat\n  max_hp: 2\n";
    let roster = parse_roster(yaml, ContentFormat::Yaml).unwrap();
    assert_eq!(roster[0].armor_class, 10);
    assert_eq!(roster[0].damage_dice, "1d6");
    assert!(roster[0].is_player_controlled);
    assert!(!roster[1].is_player_controlled);
}

#[test]
fn seeded_skirmish_replays_exactly() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let run = |seed| {
        let roster = builtin_roster("goblin_ambush").unwrap();
        let (mut engine, _) = engine_with_roster(EngineConfig::seeded(seed), roster);
        simulate_skirmish(&mut engine, 30).unwrap()
    };
    let first = run(2025);
    let second = run(2025);
    assert_eq!(first.log, second.log);
    assert_eq!(first.winner, second.winner);

    assert!(first.log[0].starts_with("[INIT]"));
    assert!(first.log.last().unwrap().starts_with("[END]"));
    assert!((1..=30).contains(&first.rounds));
}

#[test]
fn the_winner_is_the_side_left_standing() {
    let roster = builtin_roster("goblin_ambush").unwrap();
    let (mut engine, _) = engine_with_roster(EngineConfig::seeded(7), roster);
    let report = simulate_skirmish(&mut engine, 50).unwrap();
    assert_eq!(engine.phase(), CombatPhase::Ended);

    let standing = |players: bool| {
        engine
            .combatants()
            .any(|c| c.is_player_controlled == players && c.is_alive())
    };
    match report.winner {
        Winner::Players => assert!(standing(true) && !standing(false)),
        Winner::Enemies => assert!(!standing(true) && standing(false)),
        Winner::Draw => assert!(standing(true) == standing(false)),
    }
}

#[test]
fn one_blow_ends_a_lopsided_fight_in_round_one() {
    let mut engine = CombatEngine::with_dice(EngineConfig::default(), Dice::from_scripted(vec![20]));
    engine.add_combatant(
        CombatantSpec::new("Aria", 25, 16)
            .player()
            .initiative(3)
            .weapon(5, "1d8", 3),
    );
    engine.add_combatant(CombatantSpec::new("Rat", 5, 10));

    let report = simulate_skirmish(&mut engine, 10).unwrap();
    assert_eq!(report.winner, Winner::Players);
    assert_eq!(report.rounds, 1);
    assert_eq!(report.summary.casualties, vec!["Rat".to_string()]);
    assert!(report.log.iter().any(|l| l.contains("CRIT!")));
}

#[test]
fn round_cap_ends_in_a_draw() {
    let mut engine = CombatEngine::new(EngineConfig::seeded(1));
    engine.add_combatant(CombatantSpec::new("Wall", 100, 40).player());
    engine.add_combatant(CombatantSpec::new("Other Wall", 100, 40));
    let report = simulate_skirmish(&mut engine, 3).unwrap();
    assert_eq!(report.winner, Winner::Draw);
    assert_eq!(report.rounds, 3);
    assert_eq!(report.summary.survivors.len(), 2);
}

#[test]
fn ended_combat_cannot_be_simulated() {
    let mut engine = CombatEngine::new(EngineConfig::seeded(1));
    engine.add_combatant(CombatantSpec::new("A", 10, 10).player());
    engine.add_combatant(CombatantSpec::new("B", 10, 10));
    engine.end_combat();
    assert!(simulate_skirmish(&mut engine, 5).is_err());
}
