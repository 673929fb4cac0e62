//! This crate extends the Cranium GOAP library with a plugin used to standardize testing the library itself.
//!
//! It bundles a minimal App setup, a journal of everything the agents report, and a handful
//! of scripted collaborators so tests can spell out exactly how the world behaves.

mod helpers;
mod plugin;

pub use helpers::*;
pub use plugin::{CraniumGoapTestPlugin, GoapTestFrameBudget};
