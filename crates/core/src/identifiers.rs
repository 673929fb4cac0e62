//! Identifiers for key types.
//!
//! These are, broadly speaking, simple newtype wrappers whose main purpose is to
//! future-proof the library and allow for the implementations of assorted Traits
//! that will not 'leak' into the underlying, wrapped type.
//!
//! Both are cheap to convert into a `&str`, so maps keyed by them can be queried
//! with plain string slices.

use core::borrow::Borrow;

use bevy::platform::prelude::String;
use bevy::reflect::Reflect;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};


/// The key half of a WorldStateFact, e.g. `"holding"` in `holding: item`.
#[derive(Reflect, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct FactKey(String);

impl FactKey {
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<IS: Into<String>> From<IS> for FactKey {
    fn from(value: IS) -> Self {
        Self::from_string(value.into())
    }
}

impl Borrow<str> for FactKey {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

impl core::fmt::Display for FactKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}


/// A category tag partitioning Goals and the agents eligible to perform them
/// (e.g. "Hauling", "Construction").
///
/// Each Specialization gets its own queue in the GoalDispatcher, so
/// unrelated kinds of work never contend with each other.
#[derive(Reflect, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct Specialization(String);

impl Specialization {
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<IS: Into<String>> From<IS> for Specialization {
    fn from(value: IS) -> Self {
        Self::from_string(value.into())
    }
}

impl Borrow<str> for Specialization {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

impl Borrow<str> for &Specialization {
    fn borrow(&self) -> &str {
        self.0.borrow()
    }
}

impl core::fmt::Display for Specialization {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
