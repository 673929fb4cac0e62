/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! World state facts - the predicates Goals, preconditions and effects are made of.
//!
//! A `WorldStateFact` is an atomic `key: value` pair, e.g. `holding: item` or `at: dropoff`.
//! A `WorldState` is a *partial* description of the world built out of those facts.
//! It holds at most one value per key; setting a key that is already present overwrites it
//! (last write wins), which is also how Action effects get applied.
//!
//! Facts are matched by exact key AND value equality - there are no wildcards.
//!
//! The backing map is ordered by key, so iteration, hashing and therefore planning
//! are fully deterministic.

use alloc::collections::BTreeMap;

use bevy::platform::prelude::String;

use crate::identifiers::FactKey;
use crate::types::ActionTarget;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};


/// The value half of a WorldStateFact.
///
/// This is deliberately opaque to the planner - all it ever does with these is compare them.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum FactValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Entity(ActionTarget),
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for FactValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ActionTarget> for FactValue {
    fn from(value: ActionTarget) -> Self {
        Self::Entity(value)
    }
}

impl core::fmt::Display for FactValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bool(b) => b.fmt(f),
            Self::Int(i) => i.fmt(f),
            Self::Text(s) => s.fmt(f),
            Self::Entity(e) => e.fmt(f),
        }
    }
}


/// An atomic `key: value` predicate about the world or the agent itself.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct WorldStateFact {
    pub key: FactKey,
    pub value: FactValue,
}

impl WorldStateFact {
    pub fn new<K: Into<FactKey>, V: Into<FactValue>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl core::fmt::Display for WorldStateFact {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}


/// A partial world state: a set of facts with at most one value per key.
#[derive(Debug, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct WorldState {
    facts: BTreeMap<FactKey, FactValue>,
}

impl WorldState {
    pub const fn new() -> Self {
        Self { facts: BTreeMap::new() }
    }

    /// Builder-style insert, handy for declaring preconditions and effects inline.
    pub fn with<K: Into<FactKey>, V: Into<FactValue>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a fact, returning the value it replaced (if any).
    pub fn set<K: Into<FactKey>, V: Into<FactValue>>(&mut self, key: K, value: V) -> Option<FactValue> {
        self.facts.insert(key.into(), value.into())
    }

    pub fn insert_fact(&mut self, fact: WorldStateFact) -> Option<FactValue> {
        self.facts.insert(fact.key, fact.value)
    }

    pub fn remove(&mut self, key: &str) -> Option<FactValue> {
        self.facts.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.facts.get(key)
    }

    /// True if this state has exactly this key with exactly this value.
    pub fn holds(&self, key: &FactKey, value: &FactValue) -> bool {
        self.facts.get(key).is_some_and(|current| current == value)
    }

    pub fn holds_fact(&self, fact: &WorldStateFact) -> bool {
        self.holds(&fact.key, &fact.value)
    }

    /// True if every fact of `required` holds in this state.
    /// An empty requirement is trivially satisfied.
    pub fn satisfies(&self, required: &WorldState) -> bool {
        required.iter().all(|(key, value)| self.holds(key, value))
    }

    /// Counts the facts of `required` that do NOT hold in this state.
    pub fn unsatisfied_count(&self, required: &WorldState) -> usize {
        required.iter().filter(|(key, value)| !self.holds(key, value)).count()
    }

    /// True if both states mention some key with different values,
    /// i.e. no single world could satisfy both at once.
    pub fn contradicts(&self, other: &WorldState) -> bool {
        other.iter().any(|(key, value)| {
            self.facts.get(key).is_some_and(|current| current != value)
        })
    }

    /// True if at least one fact of `other` is also a fact of this state.
    pub fn shares_any_fact_with(&self, other: &WorldState) -> bool {
        other.iter().any(|(key, value)| self.holds(key, value))
    }

    /// Applies effects on top of this state; same-key facts get overwritten.
    pub fn apply(&mut self, effects: &WorldState) -> &mut Self {
        for (key, value) in effects.iter() {
            self.facts.insert(key.to_owned(), value.to_owned());
        }
        self
    }

    /// Non-mutating flavor of [`WorldState::apply`].
    pub fn applied(&self, effects: &WorldState) -> Self {
        let mut out = self.clone();
        out.apply(effects);
        out
    }

    /// Removes every fact that `provided` already establishes (same key AND value).
    pub fn without_facts_of(&self, provided: &WorldState) -> Self {
        let facts = self.facts
            .iter()
            .filter(|(key, value)| !provided.holds(key, value))
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        Self { facts }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FactKey, &FactValue)> {
        self.facts.iter()
    }

    pub fn facts(&self) -> impl Iterator<Item = WorldStateFact> + '_ {
        self.facts.iter().map(|(key, value)| WorldStateFact {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

impl FromIterator<WorldStateFact> for WorldState {
    fn from_iter<T: IntoIterator<Item = WorldStateFact>>(iter: T) -> Self {
        let mut state = Self::new();
        state.extend(iter);
        state
    }
}

impl Extend<WorldStateFact> for WorldState {
    fn extend<T: IntoIterator<Item = WorldStateFact>>(&mut self, iter: T) {
        for fact in iter {
            self.insert_fact(fact);
        }
    }
}

impl core::fmt::Display for WorldState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (idx, (key, value)) in self.facts.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}

/// Shorthand for building a WorldState out of `key => value` pairs.
///
/// ```
/// use cranium_goap_core::world_state;
/// let goal = world_state! { "at" => "dropoff", "holding" => false };
/// assert_eq!(goal.len(), 2);
/// ```
#[macro_export]
macro_rules! world_state {
    () => { $crate::world_state::WorldState::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut state = $crate::world_state::WorldState::new();
            $(state.set($key, $value);)+
            state
        }
    };
}
