//! Dice notation parser.
//!
//! Accepted forms (case and whitespace insensitive):
//!
//! - `NdM`, `dM` (count defaults to 1)
//! - keep suffix: `kN` / `hN` / `khN` keep the highest N, `lN` / `klN` keep the lowest N
//! - trailing modifier: `+N` / `-N`
//! - the keywords `advantage`/`adv` and `disadvantage`/`dis` anywhere in the text
//! - a bare signed integer, which is a pure modifier with no dice
//!
//! Only the first dice group is read. `1d6+1d4` parses as `1d6`.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};
use crate::AdMode;

pub const MAX_DICE_COUNT: u32 = 1000;
pub const MAX_DICE_SIDES: u32 = 1000;

static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Longest alternatives first: "disadvantage" contains "advantage".
    Regex::new(r"disadvantage|advantage|dis|adv").expect("keyword pattern compiles")
});

static DICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?P<count>\d*)
        d
        (?P<sides>\d+)
        (?:
            (?P<keep>kh|kl|k|h|l)
            (?P<keep_n>\d+)
        )?
        (?:
            (?P<sign>[+-])
            (?P<modifier>\d+)
            (?P<next_group>d)?
        )?
        ",
    )
    .expect("dice pattern compiles")
});

static MODIFIER_ONLY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("modifier pattern compiles"));

/// Which dice of a pool count towards the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepRule {
    Highest(u32),
    Lowest(u32),
}

impl KeepRule {
    pub fn count(self) -> u32 {
        match self {
            KeepRule::Highest(n) | KeepRule::Lowest(n) => n,
        }
    }
}

/// A parsed, immutable dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceExpression {
    pub dice_count: u32,
    pub dice_sides: u32,
    pub modifier: i32,
    pub keep: Option<KeepRule>,
    pub mode: AdMode,
}

impl DiceExpression {
    pub fn parse(text: &str) -> Result<Self> {
        let lowered = text.to_lowercase();

        let mut mode = AdMode::Normal;
        for found in KEYWORD_PATTERN.find_iter(&lowered) {
            let keyword = match found.as_str() {
                "advantage" | "adv" => AdMode::Advantage,
                _ => AdMode::Disadvantage,
            };
            mode = mode.combine(keyword);
        }
        let stripped = KEYWORD_PATTERN.replace_all(&lowered, "");
        let compact: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.is_empty() {
            return Err(CombatError::invalid_expression(text, "no dice or modifier"));
        }

        if MODIFIER_ONLY_PATTERN.is_match(&compact) {
            let modifier = parse_number::<i32>(text, &compact, "modifier")?;
            return Ok(Self::modifier_only(modifier).with_mode(mode));
        }

        let caps = DICE_PATTERN
            .captures(&compact)
            .ok_or_else(|| CombatError::invalid_expression(text, "no dice group found"))?;

        let dice_count = match caps.name("count").map(|m| m.as_str()) {
            None | Some("") => 1,
            Some(digits) => parse_number::<u32>(text, digits, "dice count")?,
        };
        let dice_sides = parse_number::<u32>(text, &caps["sides"], "die size")?;

        if dice_count > MAX_DICE_COUNT {
            return Err(CombatError::invalid_expression(
                text,
                format!("at most {MAX_DICE_COUNT} dice per roll"),
            ));
        }
        if dice_count > 0 && dice_sides == 0 {
            return Err(CombatError::invalid_expression(text, "dice need at least one side"));
        }
        if dice_sides > MAX_DICE_SIDES {
            return Err(CombatError::invalid_expression(
                text,
                format!("dice have at most {MAX_DICE_SIDES} sides"),
            ));
        }

        let keep = match (caps.name("keep"), caps.name("keep_n")) {
            (Some(kind), Some(n)) => {
                let n = parse_number::<u32>(text, n.as_str(), "keep count")?;
                Some(match kind.as_str() {
                    "l" | "kl" => KeepRule::Lowest(n),
                    _ => KeepRule::Highest(n),
                })
            }
            _ => None,
        };

        // A signed number that opens a second dice group is not a modifier.
        let modifier = match (caps.name("sign"), caps.name("modifier"), caps.name("next_group")) {
            (Some(sign), Some(value), None) => {
                let value = parse_number::<i32>(text, value.as_str(), "modifier")?;
                if sign.as_str() == "-" { -value } else { value }
            }
            _ => 0,
        };

        Ok(Self {
            dice_count,
            dice_sides,
            modifier,
            keep,
            mode,
        })
    }

    pub fn modifier_only(modifier: i32) -> Self {
        Self {
            dice_count: 0,
            dice_sides: 0,
            modifier,
            keep: None,
            mode: AdMode::Normal,
        }
    }

    /// `1d20+modifier`, the shape of attack rolls, checks and initiative.
    pub fn d20(modifier: i32, mode: AdMode) -> Self {
        Self {
            dice_count: 1,
            dice_sides: 20,
            modifier,
            keep: None,
            mode,
        }
    }

    pub fn with_mode(mut self, mode: AdMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_modifier_only(&self) -> bool {
        self.dice_count == 0
    }

    /// True for a lone d20 without a keep rule: the only shape that can roll
    /// with (dis)advantage or score a critical.
    pub fn is_single_d20(&self) -> bool {
        self.dice_count == 1 && self.dice_sides == 20 && self.keep.is_none()
    }
}

fn parse_number<T: FromStr>(text: &str, digits: &str, what: &str) -> Result<T> {
    digits
        .parse()
        .map_err(|_| CombatError::invalid_expression(text, format!("{what} '{digits}' is out of range")))
}

impl FromStr for DiceExpression {
    type Err = CombatError;

    fn from_str(s: &str) -> Result<Self> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_modifier_only() {
            write!(f, "{}", self.modifier)?;
        } else {
            write!(f, "{}d{}", self.dice_count, self.dice_sides)?;
            match self.keep {
                Some(KeepRule::Highest(n)) => write!(f, "k{n}")?,
                Some(KeepRule::Lowest(n)) => write!(f, "l{n}")?,
                None => {}
            }
            if self.modifier > 0 {
                write!(f, "+{}", self.modifier)?;
            } else if self.modifier < 0 {
                write!(f, "{}", self.modifier)?;
            }
        }
        match self.mode {
            AdMode::Normal => Ok(()),
            AdMode::Advantage => write!(f, " advantage"),
            AdMode::Disadvantage => write!(f, " disadvantage"),
        }
    }
}
