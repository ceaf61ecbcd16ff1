//! Per-combatant state and the mutators that change it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::combat::log::ActionType;
use crate::conditions::{Condition, ConditionSet};
use crate::error::{CombatError, Result};
use crate::life::{DeathSaveOutcome, DeathSaves, Health, LifeState};

pub const DEFAULT_MOVEMENT: u32 = 30;

/// Engine-assigned identity. Names may collide; ids never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub u64);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Bludgeoning,
    Piercing,
    Slashing,
    Fire,
    Cold,
    Lightning,
    Acid,
    Poison,
    Psychic,
    Radiant,
    Necrotic,
    Thunder,
    Force,
}

impl FromStr for DamageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use DamageType::*;
        match s.trim().to_lowercase().as_str() {
            "bludgeoning" => Ok(Bludgeoning),
            "piercing" => Ok(Piercing),
            "slashing" => Ok(Slashing),
            "fire" => Ok(Fire),
            "cold" => Ok(Cold),
            "lightning" => Ok(Lightning),
            "acid" => Ok(Acid),
            "poison" => Ok(Poison),
            "psychic" => Ok(Psychic),
            "radiant" => Ok(Radiant),
            "necrotic" => Ok(Necrotic),
            "thunder" => Ok(Thunder),
            "force" => Ok(Force),
            other => Err(format!("unknown damage type '{other}'")),
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Piercing => "piercing",
            DamageType::Slashing => "slashing",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Lightning => "lightning",
            DamageType::Acid => "acid",
            DamageType::Poison => "poison",
            DamageType::Psychic => "psychic",
            DamageType::Radiant => "radiant",
            DamageType::Necrotic => "necrotic",
            DamageType::Thunder => "thunder",
            DamageType::Force => "force",
        };
        f.write_str(s)
    }
}

fn default_damage_dice() -> String {
    "1d6".to_string()
}

fn default_armor_class() -> i32 {
    10
}

/// Attributes a caller supplies to create a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantSpec {
    pub name: String,
    pub max_hp: i32,
    #[serde(default = "default_armor_class")]
    pub armor_class: i32,
    #[serde(default)]
    pub initiative_bonus: i32,
    #[serde(default)]
    pub is_player_controlled: bool,
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default = "default_damage_dice")]
    pub damage_dice: String,
    #[serde(default)]
    pub damage_bonus: i32,
    #[serde(default)]
    pub damage_type: DamageType,
    /// Falls back to the engine's configured default when absent.
    #[serde(default)]
    pub max_movement: Option<u32>,
}

impl CombatantSpec {
    pub fn new(name: impl Into<String>, max_hp: i32, armor_class: i32) -> Self {
        Self {
            name: name.into(),
            max_hp,
            armor_class,
            initiative_bonus: 0,
            is_player_controlled: false,
            attack_bonus: 0,
            damage_dice: default_damage_dice(),
            damage_bonus: 0,
            damage_type: DamageType::default(),
            max_movement: None,
        }
    }

    pub fn player(mut self) -> Self {
        self.is_player_controlled = true;
        self
    }

    pub fn initiative(mut self, bonus: i32) -> Self {
        self.initiative_bonus = bonus;
        self
    }

    /// Attack bonus, damage dice and flat damage bonus.
    pub fn weapon(mut self, attack_bonus: i32, damage_dice: impl Into<String>, damage_bonus: i32) -> Self {
        self.attack_bonus = attack_bonus;
        self.damage_dice = damage_dice.into();
        self.damage_bonus = damage_bonus;
        self
    }

    pub fn damage_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = damage_type;
        self
    }

    pub fn movement(mut self, feet: u32) -> Self {
        self.max_movement = Some(feet);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    pub damage_taken: i32,
    pub damage_type: DamageType,
    pub new_hp: i32,
    pub unconscious: bool,
    pub dead: bool,
    /// True when this hit took the combatant from conscious to 0 HP.
    pub dropped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealOutcome {
    pub healing_applied: i32,
    pub new_hp: i32,
    pub revived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub health: Health,
    pub armor_class: i32,
    pub initiative_bonus: i32,
    /// Total of the initiative roll from the last `start_combat`.
    pub initiative_roll: Option<i32>,
    pub has_action: bool,
    pub has_bonus_action: bool,
    pub has_reaction: bool,
    pub movement_remaining: u32,
    pub max_movement: u32,
    pub attack_bonus: i32,
    pub damage_dice: String,
    pub damage_bonus: i32,
    pub damage_type: DamageType,
    pub conditions: ConditionSet,
    /// Player characters fall unconscious at 0 HP; everyone else dies.
    pub is_player_controlled: bool,
}

impl Combatant {
    pub fn new(id: CombatantId, spec: CombatantSpec) -> Self {
        if spec.max_hp < 1 {
            warn!(name = %spec.name, max_hp = spec.max_hp, "max HP below 1; clamping to 1");
        }
        let max_movement = spec.max_movement.unwrap_or(DEFAULT_MOVEMENT);
        Self {
            id,
            name: spec.name,
            health: Health::new(spec.max_hp),
            armor_class: spec.armor_class,
            initiative_bonus: spec.initiative_bonus,
            initiative_roll: None,
            has_action: true,
            has_bonus_action: true,
            has_reaction: true,
            movement_remaining: max_movement,
            max_movement,
            attack_bonus: spec.attack_bonus,
            damage_dice: spec.damage_dice,
            damage_bonus: spec.damage_bonus,
            damage_type: spec.damage_type,
            conditions: ConditionSet::new(),
            is_player_controlled: spec.is_player_controlled,
        }
    }

    pub fn current_hp(&self) -> i32 {
        self.health.current_hp
    }

    pub fn max_hp(&self) -> i32 {
        self.health.max_hp
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.health.state, LifeState::Dead)
    }

    pub fn is_unconscious(&self) -> bool {
        matches!(self.health.state, LifeState::Unconscious { .. })
    }

    /// Not dead and above 0 HP.
    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }

    pub fn death_saves(&self) -> DeathSaves {
        self.health.death_saves
    }

    /// Resistances and immunities are not applied here; `damage_type` is
    /// carried through for callers that layer them on top.
    pub fn take_damage(&mut self, amount: i32, damage_type: DamageType) -> DamageOutcome {
        let before = self.health.current_hp;
        let (damage_taken, dropped) = self
            .health
            .apply_damage(amount, !self.is_player_controlled);
        debug!(
            "[DMG][{}] {} → {} (−{} {})",
            self.name, before, self.health.current_hp, damage_taken, damage_type
        );
        if dropped {
            if self.is_dead() {
                info!("[STATE][{}] drops to 0 HP → Dead", self.name);
            } else {
                info!("[STATE][{}] drops to 0 HP → Unconscious", self.name);
            }
        }
        DamageOutcome {
            damage_taken,
            damage_type,
            new_hp: self.health.current_hp,
            unconscious: self.is_unconscious(),
            dead: self.is_dead(),
            dropped,
        }
    }

    pub fn heal(&mut self, amount: i32) -> HealOutcome {
        let before = self.health.current_hp;
        let (healing_applied, revived) = self.health.heal(amount);
        if revived {
            info!(
                "[HEAL][{}] +{} HP ({} → {}) and regains consciousness",
                self.name, healing_applied, before, self.health.current_hp
            );
        } else {
            debug!(
                "[HEAL][{}] +{} HP ({} → {})",
                self.name, healing_applied, before, self.health.current_hp
            );
        }
        HealOutcome {
            healing_applied,
            new_hp: self.health.current_hp,
            revived,
        }
    }

    /// Last write wins: a condition with an existing name replaces it.
    pub fn add_condition(&mut self, condition: Condition) -> Option<Condition> {
        debug!("[COND][{}] gains {}", self.name, condition.name);
        self.conditions.insert(condition)
    }

    pub fn remove_condition(&mut self, name: &str) -> Option<Condition> {
        let removed = self.conditions.remove(name);
        if removed.is_some() {
            debug!("[COND][{}] is no longer {}", self.name, name);
        }
        removed
    }

    pub fn has_condition(&self, name: &str) -> bool {
        self.conditions.contains(name)
    }

    /// Age every condition by one round; returns the names that expired.
    pub fn update_conditions(&mut self) -> Vec<String> {
        let expired = self.conditions.age();
        for name in &expired {
            debug!("[COND][{}] {} expires", self.name, name);
        }
        expired
    }

    /// Restore the action economy for a new turn. Conditions are aged by the
    /// engine according to its timing policy, not here.
    pub fn reset_turn(&mut self) {
        self.has_action = true;
        self.has_bonus_action = true;
        self.has_reaction = true;
        self.movement_remaining = self.max_movement;
    }

    /// Spend the resource behind `kind`. Free actions always succeed; movement
    /// is spent through [`Combatant::spend_movement`].
    pub fn spend(&mut self, kind: ActionType) -> Result<()> {
        let slot = match kind {
            ActionType::Action => &mut self.has_action,
            ActionType::BonusAction => &mut self.has_bonus_action,
            ActionType::Reaction => &mut self.has_reaction,
            ActionType::Movement | ActionType::FreeAction => return Ok(()),
        };
        if !*slot {
            return Err(CombatError::NoActionAvailable {
                combatant: self.name.clone(),
                resource: kind,
            });
        }
        *slot = false;
        Ok(())
    }

    pub fn spend_movement(&mut self, feet: u32) -> Result<u32> {
        if feet > self.movement_remaining {
            return Err(CombatError::NoActionAvailable {
                combatant: self.name.clone(),
                resource: ActionType::Movement,
            });
        }
        self.movement_remaining -= feet;
        Ok(self.movement_remaining)
    }

    pub fn stabilize(&mut self) -> bool {
        let stabilized = self.health.stabilize();
        if stabilized {
            info!("[STATE][{}] is stabilized at 0 HP", self.name);
        }
        stabilized
    }

    /// Record a death saving throw from its natural d20 face. The engine never
    /// rolls these on its own; the caller decides when they happen.
    pub fn record_death_save(&mut self, natural: u32) -> DeathSaveOutcome {
        let outcome = self.health.death_save(natural);
        if outcome != DeathSaveOutcome::NotDying {
            let saves = self.health.death_saves;
            info!(
                "[DEATHSAVE][{}] roll={} → {:?} (S={}, F={})",
                self.name, natural, outcome, saves.successes, saves.failures
            );
        }
        outcome
    }
}
