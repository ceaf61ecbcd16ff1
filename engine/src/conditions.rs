//! Named, timed conditions carried by combatants.
//!
//! The engine only tracks names and durations. What a condition *does* is up
//! to the caller, which can stash parameters in [`Condition::effects`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Duration that never expires.
pub const PERMANENT: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Remaining rounds. Negative is permanent; 0 expires at the next aging pass.
    #[serde(default = "permanent")]
    pub duration_rounds: i32,
    #[serde(default)]
    pub source: String,
    /// Opaque parameters for the caller's rules layer.
    #[serde(default)]
    pub effects: IndexMap<String, Value>,
}

fn permanent() -> i32 {
    PERMANENT
}

impl Condition {
    pub fn new(name: impl Into<String>, duration_rounds: i32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            duration_rounds,
            source: String::new(),
            effects: IndexMap::new(),
        }
    }

    pub fn permanent(name: impl Into<String>) -> Self {
        Self::new(name, PERMANENT)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_effect(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.effects.insert(key.into(), value.into());
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.duration_rounds < 0
    }
}

/// Conditions keyed by name, in the order they were first applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionSet {
    inner: IndexMap<String, Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `condition`, replacing any condition with the same name. Returns
    /// the replaced condition.
    pub fn insert(&mut self, condition: Condition) -> Option<Condition> {
        self.inner.insert(condition.name.clone(), condition)
    }

    pub fn remove(&mut self, name: &str) -> Option<Condition> {
        self.inner.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Condition> {
        self.inner.get(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.inner.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// One aging pass: every positive duration drops by one, then everything
    /// sitting at exactly 0 is removed. A condition applied with duration 0
    /// therefore lasts until the next pass. Returns the expired names.
    pub fn age(&mut self) -> Vec<String> {
        for cond in self.inner.values_mut() {
            if cond.duration_rounds > 0 {
                cond.duration_rounds -= 1;
            }
        }
        let expired: Vec<String> = self
            .inner
            .values()
            .filter(|c| c.duration_rounds == 0)
            .map(|c| c.name.clone())
            .collect();
        self.inner.retain(|_, c| c.duration_rounds != 0);
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_replaces() {
        let mut set = ConditionSet::new();
        set.insert(Condition::new("Poisoned", 3).with_source("Spider"));
        let old = set.insert(Condition::new("Poisoned", 1).with_source("Trap"));
        assert_eq!(old.map(|c| c.source), Some("Spider".to_string()));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("Poisoned").map(|c| c.duration_rounds), Some(1));
    }

    #[test]
    fn aging_counts_down_and_purges() {
        let mut set = ConditionSet::new();
        set.insert(Condition::new("Dodging", 0));
        set.insert(Condition::new("Blessed", 2));
        set.insert(Condition::permanent("Cursed"));

        assert_eq!(set.age(), vec!["Dodging".to_string()]);
        assert_eq!(set.get("Blessed").map(|c| c.duration_rounds), Some(1));

        assert_eq!(set.age(), vec!["Blessed".to_string()]);
        assert!(set.age().is_empty());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["Cursed"]);
    }

    #[test]
    fn names_match_exactly() {
        let mut set = ConditionSet::new();
        set.insert(Condition::permanent("Prone"));
        assert!(set.contains("Prone"));
        assert!(!set.contains("prone"));
        assert!(set.remove("prone").is_none());
        assert!(set.remove("Prone").is_some());
    }
}
