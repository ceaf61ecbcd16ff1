use std::collections::HashMap;

/// Built-in rosters (JSON lists of combatant specs), keyed by id.
pub fn builtin_rosters() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "goblin_ambush",
            include_str!("../content/rosters/goblin_ambush.json"),
        ),
        ("duel", include_str!("../content/rosters/duel.json")),
    ])
}
