/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/

//! This crate extends the Cranium GOAP library with a plugin that streamlines the integration
//! of GOAP agents into an existing Bevy application.
//!
//! The plugin handles the basic gruntwork - setting up the GoalDispatcher and planner Resources,
//! the goal registration Observers and the System ticking every GoapAgent.
//!
//! What's left for you to do after adding it in is plugging in your movement and world-state
//! collaborators (the `GoapMovement` and `GoapWorldView` Resources), spawning agents with
//! their Actions and posting Goals.

mod plugin;

pub use plugin::CraniumGoapPlugin;
