//! Combat engine: initiative, turn order, rounds and the combat lifecycle.
//!
//! Phases run `Inactive → Initiative → Active ⇄ Paused`, and any phase can
//! move to `Ended`, which is terminal. `start_combat` passes through
//! `Initiative` within a single call.

pub mod actions;
pub mod log;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::combatant::{Combatant, CombatantId, CombatantSpec, DamageOutcome, DamageType, HealOutcome};
use crate::conditions::Condition;
use crate::config::{ConditionTiming, EngineConfig};
use crate::error::{CombatError, Result};
use crate::notation::DiceExpression;
use crate::roller::{DiceRoller, RollResult};
use crate::{AdMode, Dice};

pub use actions::{AttackResult, SpellCast};
use log::ActionLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    #[default]
    Inactive,
    Initiative,
    Active,
    Paused,
    Ended,
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CombatPhase::Inactive => "inactive",
            CombatPhase::Initiative => "initiative",
            CombatPhase::Active => "active",
            CombatPhase::Paused => "paused",
            CombatPhase::Ended => "ended",
        })
    }
}

/// An engine behind one lock, for hosts that call in from several threads.
/// Hold the guard for the whole operation so reads and the following
/// mutation stay atomic.
pub type SharedEngine = Arc<Mutex<CombatEngine>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeEntry {
    pub id: CombatantId,
    pub name: String,
    pub roll: RollResult,
    pub total: i32,
}

/// Initiative results in turn order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeReport {
    pub entries: Vec<InitiativeEntry>,
    pub round: u32,
}

impl InitiativeReport {
    pub fn order(&self) -> Vec<CombatantId> {
        self.entries.iter().map(|e| e.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInfo {
    pub combatant_id: CombatantId,
    pub name: String,
    pub round: u32,
    pub turn_index: usize,
    /// The turn order wrapped on the way here.
    pub new_round: bool,
    /// Combatants passed over because they were not alive.
    pub skipped: Vec<CombatantId>,
    pub expired_conditions: Vec<(CombatantId, String)>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TurnAdvance {
    Turn(TurnInfo),
    /// Nobody in the turn order can act; the turn did not move.
    NoLivingCombatants { round: u32 },
}

impl TurnAdvance {
    pub fn turn(&self) -> Option<&TurnInfo> {
        match self {
            TurnAdvance::Turn(info) => Some(info),
            TurnAdvance::NoLivingCombatants { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorSummary {
    pub id: CombatantId,
    pub name: String,
    pub current_hp: i32,
    pub max_hp: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSummary {
    pub rounds: u32,
    pub total_actions: usize,
    pub survivors: Vec<SurvivorSummary>,
    pub casualties: Vec<String>,
}

/// One fight's worth of state. The engine owns its combatants, turn order,
/// dice and action log; every change goes through its methods.
#[derive(Debug)]
pub struct CombatEngine {
    config: EngineConfig,
    roller: DiceRoller,
    combatants: IndexMap<CombatantId, Combatant>,
    initiative_order: Vec<CombatantId>,
    current_turn_index: usize,
    round_number: u32,
    phase: CombatPhase,
    log: ActionLog,
    next_id: u64,
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl CombatEngine {
    pub fn new(config: EngineConfig) -> Self {
        let dice = match config.seed {
            Some(seed) => Dice::from_seed(seed),
            None => Dice::from_entropy(),
        };
        Self::with_dice(config, dice)
    }

    /// Use `dice` instead of the source `config.seed` describes.
    pub fn with_dice(config: EngineConfig, dice: Dice) -> Self {
        Self {
            config,
            roller: DiceRoller::new(dice),
            combatants: IndexMap::new(),
            initiative_order: Vec::new(),
            current_turn_index: 0,
            round_number: 0,
            phase: CombatPhase::Inactive,
            log: ActionLog::new(),
            next_id: 1,
        }
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }

    pub fn initiative_order(&self) -> &[CombatantId] {
        &self.initiative_order
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.log
    }

    pub fn roller(&self) -> &DiceRoller {
        &self.roller
    }

    /// Ad-hoc rolls share the engine's dice, keeping seeded runs reproducible.
    pub fn roller_mut(&mut self) -> &mut DiceRoller {
        &mut self.roller
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(&id)
    }

    /// All combatants in the order they were added.
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.values()
    }

    pub fn current_combatant(&self) -> Option<&Combatant> {
        match self.phase {
            CombatPhase::Active | CombatPhase::Paused => self
                .initiative_order
                .get(self.current_turn_index)
                .and_then(|id| self.combatants.get(id)),
            _ => None,
        }
    }

    pub(crate) fn get(&self, id: CombatantId) -> Result<&Combatant> {
        self.combatants
            .get(&id)
            .ok_or(CombatError::InvalidCombatant(id))
    }

    pub(crate) fn get_mut(&mut self, id: CombatantId) -> Result<&mut Combatant> {
        self.combatants
            .get_mut(&id)
            .ok_or(CombatError::InvalidCombatant(id))
    }

    /// Add a combatant and return its new id.
    ///
    /// Combatants added after `start_combat` are not placed in the initiative
    /// order and so never get a turn in the running fight.
    pub fn add_combatant(&mut self, mut spec: CombatantSpec) -> CombatantId {
        let id = CombatantId(self.next_id);
        self.next_id += 1;
        spec.max_movement.get_or_insert(self.config.default_movement);
        let combatant = Combatant::new(id, spec);
        match self.phase {
            CombatPhase::Inactive => debug!(%id, name = %combatant.name, "combatant added"),
            phase => warn!(
                %id,
                name = %combatant.name,
                %phase,
                "combatant added after initiative; it is not in the turn order"
            ),
        }
        self.combatants.insert(id, combatant);
        id
    }

    /// Remove a combatant from the table and the turn order.
    pub fn remove_combatant(&mut self, id: CombatantId) -> Result<Combatant> {
        let removed = self
            .combatants
            .shift_remove(&id)
            .ok_or(CombatError::InvalidCombatant(id))?;
        self.initiative_order.retain(|other| *other != id);
        if self.current_turn_index >= self.initiative_order.len() {
            self.current_turn_index = 0;
        }
        debug!(%id, name = %removed.name, "combatant removed");
        Ok(removed)
    }

    /// Roll initiative for everyone and open round 1.
    ///
    /// Ties keep the order in which combatants were added.
    pub fn start_combat(&mut self) -> Result<InitiativeReport> {
        if self.phase != CombatPhase::Inactive {
            return Err(CombatError::InvalidTransition {
                from: self.phase,
                to: CombatPhase::Initiative,
            });
        }
        if self.combatants.is_empty() {
            return Err(CombatError::NoCombatants);
        }
        self.phase = CombatPhase::Initiative;

        let mut entries = Vec::with_capacity(self.combatants.len());
        for combatant in self.combatants.values_mut() {
            let label = format!("Initiative ({})", combatant.name);
            let roll = self.roller.roll_expression(
                &DiceExpression::d20(combatant.initiative_bonus, AdMode::Normal),
                Some(&label),
            );
            combatant.initiative_roll = Some(roll.total);
            entries.push(InitiativeEntry {
                id: combatant.id,
                name: combatant.name.clone(),
                total: roll.total,
                roll,
            });
        }
        // Stable sort: equal totals stay in insertion order.
        entries.sort_by(|a, b| b.total.cmp(&a.total));

        self.initiative_order = entries.iter().map(|e| e.id).collect();
        self.round_number = 1;
        self.current_turn_index = 0;
        for combatant in self.combatants.values_mut() {
            combatant.reset_turn();
        }
        self.phase = CombatPhase::Active;

        let order: Vec<String> = entries
            .iter()
            .map(|e| format!("{} ({})", e.name, e.total))
            .collect();
        info!("[INIT] {}", order.join(", "));

        Ok(InitiativeReport {
            entries,
            round: self.round_number,
        })
    }

    /// Advance to the next combatant in the turn order.
    ///
    /// Wrapping past the end starts a new round. With `auto_end_dead_turns`,
    /// combatants that are not alive are skipped; if nobody in the order is
    /// alive the turn stays put and `NoLivingCombatants` comes back.
    pub fn next_turn(&mut self) -> Result<TurnAdvance> {
        if self.phase != CombatPhase::Active {
            return Err(CombatError::CombatNotActive(self.phase));
        }
        let skip_dead = self.config.auto_end_dead_turns;
        let anyone_alive = self
            .initiative_order
            .iter()
            .any(|id| self.combatants.get(id).is_some_and(Combatant::is_alive));
        if self.initiative_order.is_empty() || (skip_dead && !anyone_alive) {
            warn!(round = self.round_number, "no living combatants left to take a turn");
            return Ok(TurnAdvance::NoLivingCombatants {
                round: self.round_number,
            });
        }

        let mut skipped = Vec::new();
        let mut expired = Vec::new();
        let mut new_round = false;
        // Bounded: at least one combatant in the order is alive, or nobody is skipped.
        loop {
            self.current_turn_index += 1;
            if self.current_turn_index >= self.initiative_order.len() {
                self.current_turn_index = 0;
                self.round_number += 1;
                new_round = true;
                info!("[ROUND] {}", self.round_number);
                if self.config.condition_timing == ConditionTiming::RoundEnd {
                    for combatant in self.combatants.values_mut() {
                        let id = combatant.id;
                        expired.extend(combatant.update_conditions().into_iter().map(|n| (id, n)));
                    }
                }
            }

            let id = self.initiative_order[self.current_turn_index];
            let timing = self.config.condition_timing;
            let combatant = self
                .combatants
                .get_mut(&id)
                .ok_or(CombatError::InvalidCombatant(id))?;
            combatant.reset_turn();
            if timing == ConditionTiming::TurnStart {
                expired.extend(combatant.update_conditions().into_iter().map(|n| (id, n)));
            }

            if skip_dead && !combatant.is_alive() {
                debug!("[TURN][{}] is down; skipping", combatant.name);
                skipped.push(id);
                continue;
            }

            let description = format!(
                "[TURN] Round {}: {}'s turn ({}/{} HP)",
                self.round_number,
                combatant.name,
                combatant.current_hp(),
                combatant.max_hp()
            );
            info!("{}", description);
            return Ok(TurnAdvance::Turn(TurnInfo {
                combatant_id: id,
                name: combatant.name.clone(),
                round: self.round_number,
                turn_index: self.current_turn_index,
                new_round,
                skipped,
                expired_conditions: expired,
                description,
            }));
        }
    }

    /// End `combatant_id`'s turn. Only the combatant whose turn it is may.
    pub fn end_turn(&mut self, combatant_id: CombatantId) -> Result<TurnAdvance> {
        if self.phase != CombatPhase::Active {
            return Err(CombatError::CombatNotActive(self.phase));
        }
        let current = self.initiative_order.get(self.current_turn_index).copied();
        if current != Some(combatant_id) {
            return Err(CombatError::NotYourTurn {
                combatant: combatant_id,
                current,
            });
        }
        self.next_turn()
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.phase != CombatPhase::Active {
            return Err(CombatError::InvalidTransition {
                from: self.phase,
                to: CombatPhase::Paused,
            });
        }
        self.phase = CombatPhase::Paused;
        info!(round = self.round_number, "combat paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.phase != CombatPhase::Paused {
            return Err(CombatError::InvalidTransition {
                from: self.phase,
                to: CombatPhase::Active,
            });
        }
        self.phase = CombatPhase::Active;
        info!(round = self.round_number, "combat resumed");
        Ok(())
    }

    /// Close the fight and summarise it. Calling it again re-summarises.
    pub fn end_combat(&mut self) -> CombatSummary {
        self.phase = CombatPhase::Ended;
        let (alive, down): (Vec<&Combatant>, Vec<&Combatant>) =
            self.combatants.values().partition(|c| c.is_alive());
        let summary = CombatSummary {
            rounds: self.round_number,
            total_actions: self.log.len(),
            survivors: alive
                .into_iter()
                .map(|c| SurvivorSummary {
                    id: c.id,
                    name: c.name.clone(),
                    current_hp: c.current_hp(),
                    max_hp: c.max_hp(),
                })
                .collect(),
            casualties: down.into_iter().map(|c| c.name.clone()).collect(),
        };
        info!(
            "[END] rounds={} actions={} survivors={} casualties={}",
            summary.rounds,
            summary.total_actions,
            summary.survivors.len(),
            summary.casualties.len()
        );
        summary
    }

    pub fn damage_combatant(
        &mut self,
        id: CombatantId,
        amount: i32,
        damage_type: DamageType,
    ) -> Result<DamageOutcome> {
        Ok(self.get_mut(id)?.take_damage(amount, damage_type))
    }

    pub fn heal_combatant(&mut self, id: CombatantId, amount: i32) -> Result<HealOutcome> {
        Ok(self.get_mut(id)?.heal(amount))
    }

    /// Returns the condition this one replaced, if any.
    pub fn apply_condition(&mut self, id: CombatantId, condition: Condition) -> Result<Option<Condition>> {
        Ok(self.get_mut(id)?.add_condition(condition))
    }

    pub fn remove_condition(&mut self, id: CombatantId, name: &str) -> Result<Option<Condition>> {
        Ok(self.get_mut(id)?.remove_condition(name))
    }
}
