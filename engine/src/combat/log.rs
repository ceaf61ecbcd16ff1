//! Append-only record of what happened in a fight.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::combatant::{CombatantId, DamageType};
use crate::roller::RollResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

/// The action-economy slot an action uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Action,
    BonusAction,
    Reaction,
    Movement,
    FreeAction,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionType::Action => "action",
            ActionType::BonusAction => "bonus action",
            ActionType::Reaction => "reaction",
            ActionType::Movement => "movement",
            ActionType::FreeAction => "free action",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEntry {
    pub target_id: CombatantId,
    pub amount: i32,
    pub damage_type: DamageType,
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatAction {
    pub id: ActionId,
    pub combatant_id: CombatantId,
    pub action_type: ActionType,
    pub name: String,
    pub description: String,
    pub target_ids: Vec<CombatantId>,
    pub roll_results: Vec<RollResult>,
    pub damage_results: Vec<DamageEntry>,
    /// Free-form tags such as `hit`, `critical` or `target_dead`.
    pub effects: Vec<String>,
    /// Round in which the action happened; 0 before combat starts.
    pub round: u32,
    pub timestamp: DateTime<Utc>,
}

/// The parts of a [`CombatAction`] the caller chooses; the log assigns the
/// id, round and timestamp.
#[derive(Debug, Clone)]
pub struct NewAction {
    pub combatant_id: CombatantId,
    pub action_type: ActionType,
    pub name: String,
    pub description: String,
    pub target_ids: Vec<CombatantId>,
    pub roll_results: Vec<RollResult>,
    pub damage_results: Vec<DamageEntry>,
    pub effects: Vec<String>,
}

impl NewAction {
    pub fn new(combatant_id: CombatantId, action_type: ActionType, name: impl Into<String>) -> Self {
        Self {
            combatant_id,
            action_type,
            name: name.into(),
            description: String::new(),
            target_ids: Vec::new(),
            roll_results: Vec::new(),
            damage_results: Vec::new(),
            effects: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionLog {
    entries: Vec<CombatAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, action: NewAction, round: u32) -> &CombatAction {
        let id = ActionId(self.entries.len() as u64 + 1);
        self.entries.push(CombatAction {
            id,
            combatant_id: action.combatant_id,
            action_type: action.action_type,
            name: action.name,
            description: action.description,
            target_ids: action.target_ids,
            roll_results: action.roll_results,
            damage_results: action.damage_results,
            effects: action.effects,
            round,
            timestamp: Utc::now(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[CombatAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ActionId) -> Option<&CombatAction> {
        self.entries.iter().find(|a| a.id == id)
    }

    /// The last `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> &[CombatAction] {
        &self.entries[self.entries.len().saturating_sub(limit)..]
    }

    pub fn for_combatant(&self, id: CombatantId) -> impl Iterator<Item = &CombatAction> {
        self.entries.iter().filter(move |a| a.combatant_id == id)
    }
}
