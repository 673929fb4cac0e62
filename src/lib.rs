/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
#![doc = include_str!("../README.md")]
#![no_std]

pub use cranium_goap_core::*;

pub mod prelude {
    pub use cranium_goap_core::*;
    pub use cranium_goap_core::types::*;
    pub use cranium_goap_core::actions::{ActionCost, GoapAction};
    pub use cranium_goap_core::action_state::ActionOutcome;
    pub use cranium_goap_core::agent::{AgentState, GoapAgent};
    pub use cranium_goap_core::collaborators::{
        GoapMovement, GoapWorldView, MoveStatus, MovementProvider, WorldStateProvider,
    };
    pub use cranium_goap_core::dispatcher::GoalDispatcher;
    pub use cranium_goap_core::errors::{GoapError, PlanningError};
    pub use cranium_goap_core::events::{
        GoalRegistrationRequested, GoalUnregistrationRequested,
        GoapActionCompleted, GoapAgentStateChanged, GoapGoalAssigned,
        GoapGoalCompleted, GoapPlanAborted, GoapPlanFailed, GoapPlanFound,
    };
    pub use cranium_goap_core::goal::Goal;
    pub use cranium_goap_core::pawn::Pawn;
    pub use cranium_goap_core::planner::{GoapPlanner, Plan, PlannerConfig, PlannerConfigBuilder};

    #[cfg(any(feature = "bevy_plugin", feature = "testing"))]
    pub use cranium_goap_bevy_plugin::CraniumGoapPlugin;

    #[cfg(feature = "testing")]
    pub use cranium_goap_test_plugin::CraniumGoapTestPlugin;
}
