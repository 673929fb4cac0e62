use bevy::prelude::*;

use crate::agent::{AgentState, AgentTickEvent};
use crate::errors::{GoapError, PlanningError};
use crate::goal::GoalHandle;
use crate::types::{ActionCostValue, ActionIndex, AgentEntity};


/// Asks the library to put a Goal on offer in the GoalDispatcher.
///
/// You can just call `GoalDispatcher::register_goal()` directly if you have the
/// Resource at hand; this Event is for code that would rather not.
#[derive(Event, Debug, Clone)]
pub struct GoalRegistrationRequested {
    pub goal: GoalHandle,
}

impl GoalRegistrationRequested {
    pub fn new<G: Into<GoalHandle>>(goal: G) -> Self {
        Self { goal: goal.into() }
    }
}

/// Asks the library to withdraw a Goal from the GoalDispatcher, e.g. because
/// the job it represents got cancelled. No-op if the Goal is not queued.
///
/// Note that an agent already working on it will keep going until its current
/// plan ends one way or the other; abandon it explicitly to stop it right away.
#[derive(Event, Debug, Clone)]
pub struct GoalUnregistrationRequested {
    pub goal: GoalHandle,
}

impl GoalUnregistrationRequested {
    pub fn new(goal: GoalHandle) -> Self {
        Self { goal }
    }
}


/// An agent got handed a Goal by the dispatcher.
#[derive(EntityEvent, Debug, Clone)]
pub struct GoapGoalAssigned {
    /// The agent Entity.
    pub entity: AgentEntity,
    pub goal: GoalHandle,
}

/// An agent came up with a plan for its Goal.
#[derive(EntityEvent, Debug, Clone)]
pub struct GoapPlanFound {
    pub entity: AgentEntity,
    pub goal: GoalHandle,
    pub steps: Vec<ActionIndex>,
    pub total_cost: ActionCostValue,
}

/// An agent could not plan for its Goal; the Goal went back to the dispatcher.
#[derive(EntityEvent, Debug, Clone)]
pub struct GoapPlanFailed {
    pub entity: AgentEntity,
    pub goal: GoalHandle,
    pub error: PlanningError,
}

/// An agent finished one Action of its plan.
#[derive(EntityEvent, Debug, Clone)]
pub struct GoapActionCompleted {
    pub entity: AgentEntity,
    pub goal: GoalHandle,
    pub action: ActionIndex,
    pub action_name: String,
}

/// An agent gave up on its plan midway; the Goal went back to the dispatcher.
#[derive(EntityEvent, Debug, Clone)]
pub struct GoapPlanAborted {
    pub entity: AgentEntity,
    pub goal: GoalHandle,
    pub error: GoapError,
}

/// An agent completed its Goal; the Goal is no longer queued.
#[derive(EntityEvent, Debug, Clone)]
pub struct GoapGoalCompleted {
    pub entity: AgentEntity,
    pub goal: GoalHandle,
}

/// An agent's state machine moved to a different state.
#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct GoapAgentStateChanged {
    pub entity: AgentEntity,
    pub from: AgentState,
    pub to: AgentState,
}


/// Turns one of the agent's tick notes into the matching EntityEvent and triggers it.
pub(crate) fn trigger_tick_event(commands: &mut Commands, entity: AgentEntity, event: AgentTickEvent) {
    match event {
        AgentTickEvent::GoalAssigned { goal } => {
            commands.trigger(GoapGoalAssigned { entity, goal });
        }
        AgentTickEvent::PlanFound { goal, steps, total_cost } => {
            commands.trigger(GoapPlanFound { entity, goal, steps, total_cost });
        }
        AgentTickEvent::PlanFailed { goal, error } => {
            commands.trigger(GoapPlanFailed { entity, goal, error });
        }
        AgentTickEvent::ActionCompleted { goal, action, action_name } => {
            commands.trigger(GoapActionCompleted { entity, goal, action, action_name });
        }
        AgentTickEvent::PlanAborted { goal, error } => {
            commands.trigger(GoapPlanAborted { entity, goal, error });
        }
        AgentTickEvent::GoalCompleted { goal } => {
            commands.trigger(GoapGoalCompleted { entity, goal });
        }
    }
}
