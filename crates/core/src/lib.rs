/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! Core of the Cranium GOAP library: goal dispatch, planning and agent execution.
//!
//! - [`dispatcher::GoalDispatcher`] holds pending Goals, one priority queue per Specialization.
//! - [`planner::GoapPlanner`] finds the cheapest sequence of Actions satisfying a Goal.
//! - [`agent::GoapAgent`] is the per-AI state machine tying the two together.
//!
//! Everything works as plain Rust; the [`systems`] and [`events`] modules add the
//! Bevy-native integration on top.
extern crate alloc;

pub mod actions;
pub mod action_state;
pub mod agent;
pub mod collaborators;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod goal;
pub mod identifiers;
pub mod pawn;
pub mod planner;
pub mod systems;
pub mod types;
pub mod world_state;

#[cfg(test)]
mod testing;
