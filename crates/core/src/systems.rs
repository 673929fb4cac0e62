/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! Bevy Systems and Observers driving GOAP agents inside an App.
//!
//! The tick System advances every GoapAgent by one tick, feeding it the shared
//! dispatcher, planner and collaborator Resources, and re-emits whatever happened
//! as EntityEvents targeting the agent's Entity.

use bevy::prelude::*;

use crate::agent::{AgentTickContext, GoapAgent};
use crate::collaborators::{GoapMovement, GoapWorldView};
use crate::dispatcher::GoalDispatcher;
use crate::events::{self, GoalRegistrationRequested, GoalUnregistrationRequested, GoapAgentStateChanged};
use crate::planner::GoapPlanner;


/// Runs one tick of every GoapAgent.
///
/// Agents are ticked one after another; the movement and world collaborators are
/// exclusive Resources, so there is nothing to be gained from a parallel iteration.
pub fn goap_agent_tick_system(
    mut agents: Query<(Entity, &mut GoapAgent)>,
    dispatcher: Res<GoalDispatcher>,
    planner: Res<GoapPlanner>,
    mut movement: ResMut<GoapMovement>,
    mut world_view: ResMut<GoapWorldView>,
    mut commands: Commands,
) {
    for (entity, mut agent) in agents.iter_mut() {
        let mut ctx = AgentTickContext {
            dispatcher: &dispatcher,
            planner: &planner,
            movement: movement.0.as_mut(),
            world: world_view.0.as_mut(),
        };

        let report = agent.tick(&mut ctx);

        if report.changed_state() {
            commands.trigger(GoapAgentStateChanged {
                entity,
                from: report.previous_state,
                to: report.state,
            });
        }

        for event in report.events {
            events::trigger_tick_event(&mut commands, entity, event);
        }
    }
}

pub fn handle_goal_registration_requests(
    trigger: On<GoalRegistrationRequested>,
    dispatcher: Res<GoalDispatcher>,
) {
    let event = trigger.event();

    #[cfg(feature = "logging")]
    bevy::log::debug!("handle_goal_registration_requests: registering {:?}", event.goal);

    dispatcher.register_goal(event.goal.clone());
}

pub fn handle_goal_unregistration_requests(
    trigger: On<GoalUnregistrationRequested>,
    dispatcher: Res<GoalDispatcher>,
) {
    let event = trigger.event();

    #[cfg(feature = "logging")]
    bevy::log::debug!("handle_goal_unregistration_requests: unregistering {:?}", event.goal);

    dispatcher.unregister_goal(&event.goal);
}


#[cfg(test)]
mod tests {
    #[cfg(feature = "logging")]
    use bevy::log::LogPlugin;
    use bevy::{app::ScheduleRunnerPlugin, prelude::*};

    use super::*;
    use crate::action_state::ActionOutcome;
    use crate::agent::AgentState;
    use crate::events::{GoapActionCompleted, GoapGoalCompleted, GoapPlanAborted, GoapPlanFailed};
    use crate::goal::{Goal, GoalHandle};
    use crate::testing::{FactWorld, StubAction};
    use crate::world_state::WorldState;
    use crate::world_state;

    #[derive(Resource, Default, Debug)]
    struct Journal {
        completed_actions: Vec<(Entity, String)>,
        completed_goals: Vec<(Entity, GoalHandle)>,
        failures: Vec<Entity>,
    }

    fn record_actions(trigger: On<GoapActionCompleted>, mut journal: ResMut<Journal>) {
        let event = trigger.event();
        journal.completed_actions.push((event.entity, event.action_name.clone()));
    }

    fn record_goals(trigger: On<GoapGoalCompleted>, mut journal: ResMut<Journal>) {
        let event = trigger.event();
        journal.completed_goals.push((event.entity, event.goal.clone()));
    }

    fn record_plan_failures(trigger: On<GoapPlanFailed>, mut journal: ResMut<Journal>) {
        journal.failures.push(trigger.event().entity);
    }

    fn record_aborts(trigger: On<GoapPlanAborted>, mut journal: ResMut<Journal>) {
        journal.failures.push(trigger.event().entity);
    }

    fn test_app(world: WorldState) -> App {
        let mut app = App::new();

        app
        .add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_once()),
            #[cfg(feature = "logging")]
            LogPlugin {
                level: bevy::log::Level::DEBUG,
                custom_layer: |_| None,
                filter: "wgpu=error,bevy_render=info,bevy_ecs=info".to_string(),
                fmt_layer: |_| None,
            }
        ))
        .init_resource::<GoalDispatcher>()
        .init_resource::<GoapPlanner>()
        .init_resource::<GoapMovement>()
        .insert_resource(GoapWorldView::new(FactWorld::new(world)))
        .init_resource::<Journal>()
        .add_observer(handle_goal_registration_requests)
        .add_observer(handle_goal_unregistration_requests)
        .add_observer(record_actions)
        .add_observer(record_goals)
        .add_observer(record_plan_failures)
        .add_observer(record_aborts)
        .add_systems(Update, goap_agent_tick_system)
        ;

        app
    }

    fn hauler() -> GoapAgent {
        GoapAgent::new(["Hauling"])
            .with_action(StubAction::new("Deliver", 2).pre("holding", "item").eff("at", "dropoff"))
            .with_action(StubAction::new("PickUp", 1).eff("holding", "item"))
    }

    #[test]
    fn agent_completes_goal_in_app() {
        let mut app = test_app(WorldState::new());
        let agent = app.world_mut().spawn(hauler()).id();

        let goal = Goal::new(world_state! { "at" => "dropoff" }, 1, "Hauling").into_handle();
        app.world_mut().trigger(GoalRegistrationRequested::new(goal.clone()));
        assert!(app.world().resource::<GoalDispatcher>().contains(&goal));

        // Plan, PickUp, Deliver.
        for _ in 0..3 {
            app.update();
        }

        let journal = app.world().resource::<Journal>();
        assert_eq!(
            journal.completed_actions,
            vec![(agent, "PickUp".to_string()), (agent, "Deliver".to_string())]
        );
        assert_eq!(journal.completed_goals, vec![(agent, goal.clone())]);
        assert!(journal.failures.is_empty());

        assert!(app.world().resource::<GoalDispatcher>().is_empty());
        assert_eq!(app.world().get::<GoapAgent>(agent).map(|a| a.state()), Some(AgentState::Idle));
    }

    #[test]
    fn unregistered_goals_are_not_picked_up() {
        let mut app = test_app(WorldState::new());
        let agent = app.world_mut().spawn(hauler()).id();

        let goal = Goal::new(world_state! { "at" => "dropoff" }, 1, "Hauling").into_handle();
        app.world_mut().trigger(GoalRegistrationRequested::new(goal.clone()));
        app.world_mut().trigger(GoalUnregistrationRequested::new(goal.clone()));

        app.update();

        assert!(app.world().resource::<GoalDispatcher>().is_empty());
        assert_eq!(app.world().get::<GoapAgent>(agent).and_then(|a| a.current_goal().cloned()), None);
    }

    #[test]
    fn despawned_agents_give_their_goal_back() {
        let mut app = test_app(WorldState::new());

        let worker = app.world_mut().spawn(
            GoapAgent::new(["Hauling"]).with_action(
                StubAction::new("PickUp", 1)
                    .eff("at", "dropoff")
                    .script([ActionOutcome::InProgress; 8])
            )
        ).id();

        let goal = Goal::new(world_state! { "at" => "dropoff" }, 1, "Hauling").into_handle();
        app.world_mut().trigger(GoalRegistrationRequested::new(goal.clone()));

        app.update();
        app.update();
        assert!(goal.is_taken());

        assert!(app.world_mut().despawn(worker));
        assert!(!goal.is_taken());

        let newcomer = app.world_mut().spawn(hauler()).id();
        for _ in 0..3 {
            app.update();
        }

        let journal = app.world().resource::<Journal>();
        assert_eq!(journal.completed_goals, vec![(newcomer, goal.clone())]);
        assert!(goal.is_completed());
    }

    #[test]
    fn failures_are_reported_per_agent() {
        let mut app = test_app(WorldState::new());

        let quitter = app.world_mut().spawn(
            GoapAgent::new(["Construction"]).with_action(
                StubAction::new("Build", 1)
                    .eff("built", "wall")
                    .script([ActionOutcome::Failed])
            )
        ).id();

        let goal = Goal::new(world_state! { "built" => "wall" }, 1, "Construction").into_handle();
        app.world_mut().resource::<GoalDispatcher>().register_goal(goal.clone());

        app.update();
        app.update();

        let journal = app.world().resource::<Journal>();
        assert_eq!(journal.failures, vec![quitter]);
        assert!(journal.completed_goals.is_empty());
        assert!(!goal.is_taken());
    }
}
