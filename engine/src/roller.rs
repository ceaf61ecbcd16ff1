//! Dice roller: executes parsed expressions against a [`Dice`] and keeps a
//! history of every result.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::notation::{DiceExpression, KeepRule};
use crate::{AdMode, Dice};

/// Everything about one roll: the physical dice, which of them counted, and
/// the total. Created once per roll and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: String,
    /// One entry per physical die, in the order rolled.
    pub individual_rolls: Vec<u32>,
    pub kept_rolls: Vec<u32>,
    pub dropped_rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
    pub critical_hit: bool,
    pub critical_fail: bool,
    pub mode: AdMode,
    pub context_label: Option<String>,
    /// Set when the expression failed to parse; `total` is then 0.
    pub error: Option<String>,
}

impl RollResult {
    fn failed(expression: &str, label: Option<&str>, reason: String) -> Self {
        Self {
            expression: expression.to_string(),
            individual_rolls: Vec::new(),
            kept_rolls: Vec::new(),
            dropped_rolls: Vec::new(),
            modifier: 0,
            total: 0,
            critical_hit: false,
            critical_fail: false,
            mode: AdMode::Normal,
            context_label: label.map(str::to_string),
            error: Some(reason),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn dice_sum(&self) -> i32 {
        self.kept_rolls
            .iter()
            .fold(0i32, |acc, r| acc.saturating_add(i32::try_from(*r).unwrap_or(i32::MAX)))
    }

    /// Dice as rolled, with dropped dice in parentheses: `[17, (4)] + 5`.
    pub fn dice_display(&self) -> String {
        let mut dropped = self.dropped_rolls.clone();
        let shown: Vec<String> = self
            .individual_rolls
            .iter()
            .map(|r| match dropped.iter().position(|d| d == r) {
                Some(idx) => {
                    dropped.remove(idx);
                    format!("({r})")
                }
                None => r.to_string(),
            })
            .collect();
        let dice = if shown.is_empty() {
            String::new()
        } else {
            format!("[{}]", shown.join(", "))
        };
        match (dice.is_empty(), self.modifier) {
            (true, m) => m.to_string(),
            (false, 0) => dice,
            (false, m) if m > 0 => format!("{dice} + {m}"),
            (false, m) => format!("{dice} - {}", m.unsigned_abs()),
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.context_label {
            write!(f, "{label}: ")?;
        }
        if let Some(err) = &self.error {
            return write!(f, "{} → error: {err}", self.expression);
        }
        write!(f, "{} → {} = {}", self.expression, self.dice_display(), self.total)?;
        if self.critical_hit {
            write!(f, " (NAT20)")?;
        } else if self.critical_fail {
            write!(f, " (NAT1)")?;
        }
        Ok(())
    }
}

/// How to generate one ability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityScoreMethod {
    /// Roll 4d6 and drop the lowest die.
    #[default]
    FourD6DropLowest,
    ThreeD6,
    /// Every score starts at 8 before points are spent.
    PointBuy,
}

/// Rolls dice expressions against one random source and records the results.
///
/// History grows without bound; use [`DiceRoller::history`] with a limit or
/// [`DiceRoller::clear_history`] to keep it in check.
#[derive(Debug, Clone)]
pub struct DiceRoller {
    dice: Dice,
    history: Vec<RollResult>,
}

impl Default for DiceRoller {
    fn default() -> Self {
        Self::new(Dice::from_entropy())
    }
}

impl DiceRoller {
    pub fn new(dice: Dice) -> Self {
        Self {
            dice,
            history: Vec::new(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Dice::from_seed(seed))
    }

    /// Parse and roll `text`. Malformed text never fails: the result has
    /// `total == 0` and `error` set, and it still lands in the history.
    pub fn roll(&mut self, text: &str, label: Option<&str>) -> RollResult {
        let result = match DiceExpression::parse(text) {
            Ok(expr) => execute(&mut self.dice, &expr, text.trim(), label),
            Err(err) => {
                warn!(expression = text, %err, "dice expression rejected; rolling 0");
                RollResult::failed(text, label, err.to_string())
            }
        };
        self.record(result)
    }

    pub fn roll_expression(&mut self, expr: &DiceExpression, label: Option<&str>) -> RollResult {
        let result = execute(&mut self.dice, expr, &expr.to_string(), label);
        self.record(result)
    }

    fn record(&mut self, result: RollResult) -> RollResult {
        debug!(
            expression = %result.expression,
            label = result.context_label.as_deref().unwrap_or(""),
            rolls = ?result.individual_rolls,
            total = result.total,
            "roll"
        );
        self.history.push(result.clone());
        result
    }

    /// The last `limit` rolls (all of them when `None`), oldest first.
    pub fn history(&self, limit: Option<usize>) -> &[RollResult] {
        let len = self.history.len();
        let start = limit.map_or(0, |n| len.saturating_sub(n));
        &self.history[start..]
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn roll_ability_score(&mut self, method: AbilityScoreMethod) -> i32 {
        match method {
            AbilityScoreMethod::FourD6DropLowest => {
                let expr = DiceExpression {
                    dice_count: 4,
                    dice_sides: 6,
                    modifier: 0,
                    keep: Some(KeepRule::Highest(3)),
                    mode: AdMode::Normal,
                };
                self.roll_expression(&expr, Some("Ability Score")).total
            }
            AbilityScoreMethod::ThreeD6 => {
                let expr = DiceExpression {
                    dice_count: 3,
                    dice_sides: 6,
                    modifier: 0,
                    keep: None,
                    mode: AdMode::Normal,
                };
                self.roll_expression(&expr, Some("Ability Score")).total
            }
            AbilityScoreMethod::PointBuy => 8,
        }
    }

    /// A full array of six scores, in STR, DEX, CON, INT, WIS, CHA order.
    pub fn roll_ability_scores(&mut self, method: AbilityScoreMethod) -> [i32; 6] {
        std::array::from_fn(|_| self.roll_ability_score(method))
    }

    /// Hit points for a character of `level`: the die's maximum at level 1,
    /// a rolled die at every level after, the constitution modifier each
    /// level, and never less than 1 in total. Sums saturate at `i32::MAX`.
    pub fn roll_hit_points(&mut self, hit_die: u32, level: u32, constitution_modifier: i32) -> i32 {
        let max_die = i32::try_from(hit_die).unwrap_or(i32::MAX);
        let mut total = max_die.saturating_add(constitution_modifier);
        for lvl in 2..=level {
            let expr = DiceExpression {
                dice_count: 1,
                dice_sides: hit_die,
                modifier: 0,
                keep: None,
                mode: AdMode::Normal,
            };
            let label = format!("Hit Points (level {lvl})");
            let rolled = self.roll_expression(&expr, Some(&label)).total;
            total = total.saturating_add(rolled).saturating_add(constitution_modifier);
        }
        total.max(1)
    }
}

fn execute(dice: &mut Dice, expr: &DiceExpression, text: &str, label: Option<&str>) -> RollResult {
    let mut result = RollResult {
        expression: text.to_string(),
        individual_rolls: Vec::new(),
        kept_rolls: Vec::new(),
        dropped_rolls: Vec::new(),
        modifier: expr.modifier,
        total: expr.modifier,
        critical_hit: false,
        critical_fail: false,
        mode: AdMode::Normal,
        context_label: label.map(str::to_string),
        error: None,
    };

    if expr.is_modifier_only() {
        return result;
    }

    if expr.is_single_d20() && expr.mode != AdMode::Normal {
        let (rolled, kept) = dice.d20(expr.mode);
        let mut dropped = rolled.clone();
        if let Some(idx) = dropped.iter().position(|r| *r == kept) {
            dropped.remove(idx);
        }
        result.individual_rolls = rolled;
        result.kept_rolls = vec![kept];
        result.dropped_rolls = dropped;
        result.mode = expr.mode;
    } else {
        let rolled: Vec<u32> = (0..expr.dice_count)
            .map(|_| dice.die(expr.dice_sides))
            .collect();
        let (kept, dropped) = match expr.keep {
            Some(rule) => {
                let mut sorted = rolled.clone();
                match rule {
                    KeepRule::Highest(_) => sorted.sort_unstable_by(|a, b| b.cmp(a)),
                    KeepRule::Lowest(_) => sorted.sort_unstable(),
                }
                let dropped = sorted.split_off((rule.count() as usize).min(sorted.len()));
                (sorted, dropped)
            }
            None => (rolled.clone(), Vec::new()),
        };
        result.individual_rolls = rolled;
        result.kept_rolls = kept;
        result.dropped_rolls = dropped;
    }

    let Some(total) = result.dice_sum().checked_add(expr.modifier) else {
        warn!(expression = text, modifier = expr.modifier, "roll total overflows; rolling 0");
        return RollResult::failed(
            text,
            label,
            format!("total of '{text}' does not fit in a 32-bit integer"),
        );
    };
    result.total = total;
    if expr.is_single_d20() {
        result.critical_hit = result.kept_rolls == [20];
        result.critical_fail = result.kept_rolls == [1];
    }
    result
}
