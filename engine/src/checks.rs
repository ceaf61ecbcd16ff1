use serde::{Deserialize, Serialize};

use crate::notation::DiceExpression;
use crate::roller::{DiceRoller, RollResult};
use crate::AdMode;

/// A d20 check against a difficulty class.
#[derive(Debug, Clone, Copy)]
pub struct CheckInput {
    pub dc: i32,
    pub modifier: i32,
    pub mode: AdMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub roll: RollResult,
    pub total: i32,
    pub dc: i32,
    pub passed: bool,
}

/// Roll a d20 (with advantage/disadvantage), add modifier, compare vs DC.
/// The roll goes through `roller`, so it is part of its history.
pub fn check(roller: &mut DiceRoller, input: CheckInput, label: Option<&str>) -> CheckResult {
    let roll = roller.roll_expression(&DiceExpression::d20(input.modifier, input.mode), label);
    let total = roll.total;
    CheckResult {
        roll,
        total,
        dc: input.dc,
        passed: total >= input.dc,
    }
}

/// D&D ability modifier = floor((score - 10) / 2) for integer scores.
pub fn ability_mod(score: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    score.saturating_sub(10).div_euclid(2)
}

impl DiceRoller {
    pub fn check(&mut self, modifier: i32, dc: i32, mode: AdMode) -> CheckResult {
        check(self, CheckInput { dc, modifier, mode }, Some("Check"))
    }
}
