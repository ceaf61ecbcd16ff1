//! Roster loading and an automated skirmish driver built on [`CombatEngine`].

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::combat::{CombatEngine, CombatPhase, CombatSummary, TurnAdvance};
use crate::combatant::{Combatant, CombatantId, CombatantSpec};
use crate::config::{load_file, ContentFormat, EngineConfig};
use crate::content::builtin_rosters;

pub const DEFAULT_MAX_ROUNDS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Players,
    Enemies,
    Draw,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkirmishReport {
    pub winner: Winner,
    pub rounds: u32,
    pub log: Vec<String>,
    pub summary: CombatSummary,
}

pub fn parse_roster(text: &str, format: ContentFormat) -> Result<Vec<CombatantSpec>> {
    format.parse(text).context("failed to parse roster")
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<CombatantSpec>> {
    load_file(path.as_ref())
}

pub fn builtin_roster(id: &str) -> Result<Vec<CombatantSpec>> {
    let text = builtin_rosters()
        .get(id)
        .copied()
        .ok_or_else(|| anyhow!("unknown builtin roster '{}'", id))?;
    parse_roster(text, ContentFormat::Json).with_context(|| format!("builtin roster '{}'", id))
}

/// A fresh engine holding `roster`, with ids in roster order.
pub fn engine_with_roster(
    config: EngineConfig,
    roster: Vec<CombatantSpec>,
) -> (CombatEngine, Vec<CombatantId>) {
    let mut engine = CombatEngine::new(config);
    let ids = roster.into_iter().map(|s| engine.add_combatant(s)).collect();
    (engine, ids)
}

fn first_living_foe(engine: &CombatEngine, attacker: &Combatant) -> Option<CombatantId> {
    engine
        .initiative_order()
        .iter()
        .filter_map(|id| engine.combatant(*id))
        .find(|c| c.is_alive() && c.is_player_controlled != attacker.is_player_controlled)
        .map(|c| c.id)
}

fn side_alive(engine: &CombatEngine, players: bool) -> bool {
    engine
        .combatants()
        .any(|c| c.is_player_controlled == players && c.is_alive())
}

/// Fight until one side is down or `max_rounds` have passed.
///
/// Each living combatant, on its turn, attacks the first living member of the
/// other side in initiative order. Starts combat if it has not started yet.
pub fn simulate_skirmish(engine: &mut CombatEngine, max_rounds: u32) -> Result<SkirmishReport> {
    let mut logs = Vec::new();

    if engine.phase() == CombatPhase::Inactive {
        let report = engine.start_combat()?;
        let order: Vec<String> = report
            .entries
            .iter()
            .map(|e| format!("{} {}", e.name, e.total))
            .collect();
        logs.push(format!("[INIT] {}", order.join(", ")));
    }
    if engine.phase() != CombatPhase::Active {
        return Err(anyhow!("cannot run a skirmish while combat is {}", engine.phase()));
    }

    logs.push(format!("[ROUND] {}", engine.round_number()));
    while engine.round_number() <= max_rounds
        && side_alive(engine, true)
        && side_alive(engine, false)
    {
        let target = engine
            .current_combatant()
            .filter(|c| c.is_alive())
            .and_then(|c| first_living_foe(engine, c).map(|t| (c.id, t)));
        if let Some((attacker, target)) = target {
            let attack = engine.make_attack(attacker, target, false, false)?;
            logs.push(attack.description);
        }
        if !side_alive(engine, true) || !side_alive(engine, false) {
            break;
        }

        match engine.next_turn()? {
            TurnAdvance::NoLivingCombatants { .. } => break,
            TurnAdvance::Turn(info) => {
                if info.new_round && info.round <= max_rounds {
                    logs.push(format!("[ROUND] {}", info.round));
                }
            }
        }
    }

    let winner = match (side_alive(engine, true), side_alive(engine, false)) {
        (true, false) => Winner::Players,
        (false, true) => Winner::Enemies,
        _ => Winner::Draw,
    };
    let summary = engine.end_combat();
    let rounds = summary.rounds.min(max_rounds);
    logs.push(format!(
        "[END] winner={:?} rounds={} survivors={} casualties={}",
        winner,
        rounds,
        summary.survivors.len(),
        summary.casualties.len()
    ));

    Ok(SkirmishReport {
        winner,
        rounds,
        log: logs,
        summary,
    })
}
