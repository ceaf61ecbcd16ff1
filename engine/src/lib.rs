//! Deterministic combat and dice resolution for tabletop RPG assistants.
//!
//! The crate is a programmatic core: callers parse and roll dice notation
//! through [`DiceRoller`], and drive turn-based fights through
//! [`CombatEngine`]. Every random draw goes through a single [`Dice`] owned by
//! the roller, so a seeded engine replays the same fight draw for draw.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub mod api;
pub mod checks;
pub mod combat;
pub mod combatant;
pub mod conditions;
pub mod config;
pub mod content;
pub mod error;
pub mod life;
pub mod notation;
pub mod roller;

pub use checks::{ability_mod, CheckResult};
pub use combat::log::{ActionId, ActionLog, ActionType, CombatAction, DamageEntry};
pub use combat::{
    AttackResult, CombatEngine, CombatPhase, CombatSummary, InitiativeEntry, InitiativeReport,
    SharedEngine, SpellCast, SurvivorSummary, TurnAdvance, TurnInfo,
};
pub use combatant::{Combatant, CombatantId, CombatantSpec, DamageOutcome, DamageType, HealOutcome};
pub use conditions::{Condition, ConditionSet};
pub use config::{ConditionTiming, EngineConfig};
pub use error::{CombatError, Result};
pub use life::{DeathSaveOutcome, DeathSaves, LifeState};
pub use notation::{DiceExpression, KeepRule};
pub use roller::{AbilityScoreMethod, DiceRoller, RollResult};

/// Advantage state of a d20 roll.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl AdMode {
    /// Both flags set cancel out, as in the 5e rules.
    pub fn from_flags(advantage: bool, disadvantage: bool) -> Self {
        match (advantage, disadvantage) {
            (true, false) => AdMode::Advantage,
            (false, true) => AdMode::Disadvantage,
            _ => AdMode::Normal,
        }
    }

    pub fn combine(self, other: AdMode) -> AdMode {
        use AdMode::*;
        match (self, other) {
            (Disadvantage, Advantage) | (Advantage, Disadvantage) => Normal,
            (Normal, x) => x,
            (x, Normal) => x,
            (Advantage, Advantage) => Advantage,
            (Disadvantage, Disadvantage) => Disadvantage,
        }
    }
}

#[derive(Debug, Clone)]
enum Source {
    Seeded(ChaCha8Rng),
    Scripted { values: Vec<u32>, cursor: usize },
}

/// The random source behind every roll.
///
/// Seeded dice draw from ChaCha8, which is stable across platforms. Scripted
/// dice replay a fixed list of faces (cycling when exhausted) and exist so
/// tests can force exact outcomes such as a natural 20.
#[derive(Debug, Clone)]
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: Source::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// Replay `values` in order. Each face is clamped into `1..=sides` of the
    /// die being rolled; an empty script always yields 1.
    pub fn from_scripted(values: Vec<u32>) -> Self {
        Self {
            source: Source::Scripted { values, cursor: 0 },
        }
    }

    /// Roll one die with `sides` faces. `sides` must be at least 1.
    pub fn die(&mut self, sides: u32) -> u32 {
        let sides = sides.max(1);
        match &mut self.source {
            Source::Seeded(rng) => rng.gen_range(1..=sides),
            Source::Scripted { values, cursor } => {
                if values.is_empty() {
                    return 1;
                }
                let face = values[*cursor % values.len()];
                *cursor += 1;
                face.clamp(1, sides)
            }
        }
    }

    /// Roll a d20 honouring (dis)advantage. Returns the physical dice and the kept face.
    pub fn d20(&mut self, mode: AdMode) -> (Vec<u32>, u32) {
        match mode {
            AdMode::Normal => {
                let r = self.die(20);
                (vec![r], r)
            }
            AdMode::Advantage => {
                let a = self.die(20);
                let b = self.die(20);
                (vec![a, b], a.max(b))
            }
            AdMode::Disadvantage => {
                let a = self.die(20);
                let b = self.die(20);
                (vec![a, b], a.min(b))
            }
        }
    }
}
