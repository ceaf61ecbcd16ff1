use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::combatant::DEFAULT_MOVEMENT;

/// When conditions lose a round of duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTiming {
    /// Every combatant's conditions age once each time the turn order wraps.
    #[default]
    RoundEnd,
    /// A combatant's conditions age at the start of each of its own turns.
    TurnStart,
}

fn default_true() -> bool {
    true
}

fn default_movement() -> u32 {
    DEFAULT_MOVEMENT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Seed for the engine's dice; `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Skip the turns of combatants that are dead or at 0 HP.
    #[serde(default = "default_true")]
    pub auto_end_dead_turns: bool,
    #[serde(default)]
    pub condition_timing: ConditionTiming,
    /// Movement for combatants whose spec does not set one.
    #[serde(default = "default_movement")]
    pub default_movement: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            auto_end_dead_turns: true,
            condition_timing: ConditionTiming::default(),
            default_movement: DEFAULT_MOVEMENT,
        }
    }
}

impl EngineConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse config text already read by the caller, e.g. after decoding a BOM.
    pub fn from_str_with(text: &str, format: ContentFormat) -> Result<Self> {
        format.parse(text).context("failed to parse engine config")
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_str_with(text, ContentFormat::Yaml)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_str_with(text, ContentFormat::Json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_file(path.as_ref())
    }
}

/// Serialization formats accepted for config and roster files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Json,
    Yaml,
}

impl ContentFormat {
    /// `.json` is JSON; anything else is read as YAML, which also accepts JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ContentFormat::Json,
            _ => ContentFormat::Yaml,
        }
    }

    pub fn parse<T: DeserializeOwned>(self, text: &str) -> Result<T> {
        Ok(match self {
            ContentFormat::Json => serde_json::from_str(text)?,
            ContentFormat::Yaml => serde_yaml::from_str(text)?,
        })
    }
}

pub(crate) fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ContentFormat::from_path(path)
        .parse(&text)
        .with_context(|| format!("failed to parse {}", path.display()))
}
