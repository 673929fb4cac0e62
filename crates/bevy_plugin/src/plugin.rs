/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/

use bevy::ecs::schedule::{InternedScheduleLabel, ScheduleLabel};
use bevy::prelude::*;
use cranium_goap_core::collaborators::{GoapMovement, GoapWorldView};
use cranium_goap_core::dispatcher::GoalDispatcher;
use cranium_goap_core::planner::{GoapPlanner, PlannerConfig};
use cranium_goap_core::systems;

/// Wires GOAP into an App.
///
/// By default, agents get ticked in `FixedUpdate`, so their pace does not depend on the
/// framerate. Use [`CraniumGoapPlugin::in_schedule()`] to pick another schedule.
///
/// Collaborator Resources already present in the App are left alone; otherwise agents
/// get a movement collaborator that is always in range and an empty world view.
pub struct CraniumGoapPlugin {
    schedule: InternedScheduleLabel,
    planner_config: Option<PlannerConfig>,
}

impl CraniumGoapPlugin {
    pub fn in_schedule(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
            planner_config: None,
        }
    }

    /// Overrides the planner settings. Without this, any GoapPlanner
    /// already in the App is kept, or a default one is created.
    pub fn with_planner_config(mut self, config: PlannerConfig) -> Self {
        self.planner_config = Some(config);
        self
    }
}

impl Default for CraniumGoapPlugin {
    fn default() -> Self {
        Self::in_schedule(FixedUpdate)
    }
}

impl Plugin for CraniumGoapPlugin {
    fn build(&self, app: &mut App) {
        match &self.planner_config {
            Some(config) => { app.insert_resource(GoapPlanner::new(config.clone())); }
            None => { app.init_resource::<GoapPlanner>(); }
        }

        app
        .init_resource::<GoalDispatcher>()
        .init_resource::<GoapMovement>()
        .init_resource::<GoapWorldView>()
        .add_observer(systems::handle_goal_registration_requests)
        .add_observer(systems::handle_goal_unregistration_requests)
        .add_systems(
            self.schedule,
            systems::goap_agent_tick_system,
        )
        ;

        #[cfg(feature = "logging")]
        bevy::log::debug!("CraniumGoapPlugin::build: agents will tick in {:?}", self.schedule);
    }
}
