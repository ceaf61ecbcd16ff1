use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    #[default]
    Conscious,
    Unconscious {
        stable: bool,
    },
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeathSaves {
    pub successes: u8, // 0..=3
    pub failures: u8,  // 0..=3
}

/// What a single death saving throw did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathSaveOutcome {
    /// The creature is not dying (conscious, stable or dead); nothing rolled.
    NotDying,
    Success { successes: u8 },
    Failure { failures: u8 },
    /// Natural 20: back up with 1 HP.
    Revived,
    /// Third success.
    Stabilized,
    /// Third failure.
    Died,
}

/// Hit points and the life state they drive.
///
/// Invariant: `current_hp == 0` whenever the state is not `Conscious`, and a
/// conscious creature always has more than 0 HP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current_hp: i32,
    pub max_hp: i32,
    pub state: LifeState,
    pub death_saves: DeathSaves,
}

impl Health {
    pub fn new(max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self {
            current_hp: max_hp,
            max_hp,
            state: LifeState::Conscious,
            death_saves: DeathSaves::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        !matches!(self.state, LifeState::Dead) && self.current_hp > 0
    }

    /// Subtract `amount` (negative counts as 0). Dropping to 0 knocks out a
    /// creature, or kills it outright when `dies_at_zero`. Returns the amount
    /// applied and whether the creature went down on this hit.
    pub fn apply_damage(&mut self, amount: i32, dies_at_zero: bool) -> (i32, bool) {
        let amount = amount.max(0);
        let was_up = matches!(self.state, LifeState::Conscious);
        self.current_hp = (self.current_hp - amount).max(0);
        if self.current_hp == 0 {
            self.state = match self.state {
                LifeState::Dead => LifeState::Dead,
                _ if dies_at_zero => LifeState::Dead,
                _ => LifeState::Unconscious { stable: false },
            };
        }
        (amount, was_up && self.current_hp == 0)
    }

    /// Healing; if at 0/unconscious, wakes and resets death saves. The dead
    /// stay dead. Returns the HP actually restored and whether the creature woke.
    pub fn heal(&mut self, amount: i32) -> (i32, bool) {
        if matches!(self.state, LifeState::Dead) {
            return (0, false);
        }
        let before = self.current_hp;
        self.current_hp = self.current_hp.saturating_add(amount.max(0)).min(self.max_hp);
        let revived = matches!(self.state, LifeState::Unconscious { .. }) && self.current_hp > 0;
        if revived {
            self.state = LifeState::Conscious;
            self.death_saves = DeathSaves::default();
        }
        (self.current_hp - before, revived)
    }

    /// Stabilize an unconscious creature at 0 HP (no more death saves).
    pub fn stabilize(&mut self) -> bool {
        if let LifeState::Unconscious { stable: false } = self.state {
            self.state = LifeState::Unconscious { stable: true };
            return true;
        }
        false
    }

    /// Resolve one death saving throw from the natural d20 face.
    ///
    /// Nat 20 → 1 HP and wake; nat 1 → 2 failures; otherwise success on 10+.
    pub fn death_save(&mut self, natural: u32) -> DeathSaveOutcome {
        if !matches!(self.state, LifeState::Unconscious { stable: false }) || self.current_hp > 0 {
            return DeathSaveOutcome::NotDying;
        }
        let saves = &mut self.death_saves;
        if natural >= 20 {
            *saves = DeathSaves::default();
            self.current_hp = 1;
            self.state = LifeState::Conscious;
            return DeathSaveOutcome::Revived;
        }
        if natural <= 1 {
            saves.failures = (saves.failures + 2).min(3);
        } else if natural >= 10 {
            saves.successes = (saves.successes + 1).min(3);
        } else {
            saves.failures = (saves.failures + 1).min(3);
        }

        if saves.failures >= 3 {
            self.state = LifeState::Dead;
            DeathSaveOutcome::Died
        } else if saves.successes >= 3 {
            self.state = LifeState::Unconscious { stable: true };
            DeathSaveOutcome::Stabilized
        } else if natural >= 10 {
            DeathSaveOutcome::Success {
                successes: saves.successes,
            }
        } else {
            DeathSaveOutcome::Failure {
                failures: saves.failures,
            }
        }
    }
}
