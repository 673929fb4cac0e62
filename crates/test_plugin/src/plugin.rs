use core::time::Duration;

#[cfg(feature = "logging")]
use bevy::log::LogPlugin;
use bevy::{app::ScheduleRunnerPlugin, prelude::*};
use cranium_goap_bevy_plugin::CraniumGoapPlugin;

use crate::helpers::*;


/// Caps how many frames a test App may run for before it exits with an error.
#[derive(Resource, Debug, Clone, Copy)]
pub struct GoapTestFrameBudget(pub u32);

impl Default for GoapTestFrameBudget {
    fn default() -> Self {
        Self(500)
    }
}


/// Sets up a headless App with GOAP agents ticking once per `Update`.
///
/// Tests can either drive it frame by frame with `app.update()`, or hand it to
/// [`run_until_exit()`](crate::run_until_exit) and let it stop on its own once the
/// dispatcher runs out of Goals (or the frame budget runs out).
pub struct CraniumGoapTestPlugin {
    pub tick_interval: Duration,
}

impl Default for CraniumGoapTestPlugin {
    fn default() -> Self {
        Self { tick_interval: Duration::from_millis(1) }
    }
}

impl Plugin for CraniumGoapTestPlugin {
    fn build(&self, app: &mut App) {
        app
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(self.tick_interval)),
            #[cfg(feature = "logging")]
            LogPlugin {
                level: bevy::log::Level::DEBUG,
                custom_layer: |_| None,
                filter: "wgpu=error,bevy_render=info,bevy_ecs=info".to_string(),
                fmt_layer: |_| None,
            },
            CraniumGoapPlugin::in_schedule(Update),
        ))
        .init_resource::<GoapTestJournal>()
        .init_resource::<GoapTestFrameBudget>()
        .add_observer(journal_goal_assigned)
        .add_observer(journal_plan_found)
        .add_observer(journal_plan_failed)
        .add_observer(journal_action_completed)
        .add_observer(journal_plan_aborted)
        .add_observer(journal_goal_completed)
        .add_systems(
            Last,
            (
                exit_on_all_goals_done,
                exit_on_frame_budget_spent,
            ).chain()
        )
        ;
    }
}
