/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! The GOAP agent - a small state machine that turns Goals into Actions.
//!
//! Every tick, the agent runs exactly one handler for its current state:
//!
//! - Idle: let go of any leftover Goal, ask the dispatcher for a new one and plan for it.
//! - MovingTo: ask the movement collaborator to bring the pawn in range of the next Action.
//! - PerformingAction: run the next Action for one tick and react to its outcome.
//!
//! Nothing in here blocks; long-running work (walking, building) is spread across
//! many ticks by whoever implements the collaborators and Actions.
//!
//! Any failure drops the whole plan and hands the Goal back to the dispatcher,
//! so no Goal is ever left marked as taken by an agent that gave up on it.

use alloc::collections::VecDeque;

use bevy::prelude::*;

use crate::action_state::ActionOutcome;
use crate::actions::GoapAction;
use crate::collaborators::{MoveStatus, MovementProvider, WorldStateProvider};
use crate::dispatcher::GoalDispatcher;
use crate::errors::{GoapError, PlanningError};
use crate::goal::GoalHandle;
use crate::pawn::Pawn;
use crate::planner::GoapPlanner;
use crate::types::{ActionCostValue, ActionIndex, BoxedAction, Specialization};

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum AgentState {
    #[default]
    Idle,
    MovingTo,
    PerformingAction,
}


/// Everything an agent needs from the outside world for one tick.
pub struct AgentTickContext<'a> {
    pub dispatcher: &'a GoalDispatcher,
    pub planner: &'a GoapPlanner,
    pub movement: &'a mut dyn MovementProvider,
    pub world: &'a mut dyn WorldStateProvider,
}

/// Noteworthy things that happened during a tick, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentTickEvent {
    GoalAssigned {
        goal: GoalHandle,
    },
    PlanFound {
        goal: GoalHandle,
        steps: Vec<ActionIndex>,
        total_cost: ActionCostValue,
    },
    PlanFailed {
        goal: GoalHandle,
        error: PlanningError,
    },
    ActionCompleted {
        goal: GoalHandle,
        action: ActionIndex,
        action_name: String,
    },
    PlanAborted {
        goal: GoalHandle,
        error: GoapError,
    },
    GoalCompleted {
        goal: GoalHandle,
    },
}

impl AgentTickEvent {
    /// The error behind a failed plan or an aborted one; None for everything else.
    pub fn error(&self) -> Option<GoapError> {
        match self {
            Self::PlanFailed { error, .. } => Some((*error).into()),
            Self::PlanAborted { error, .. } => Some(*error),
            _ => None,
        }
    }
}

/// The result of a single `GoapAgent::tick()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTickReport {
    pub previous_state: AgentState,
    pub state: AgentState,
    pub events: Vec<AgentTickEvent>,
}

impl AgentTickReport {
    fn starting_from(state: AgentState) -> Self {
        Self {
            previous_state: state,
            state,
            events: Vec::new(),
        }
    }

    pub fn changed_state(&self) -> bool {
        self.previous_state != self.state
    }

    /// Every error this tick ran into, planning and execution alike.
    pub fn errors(&self) -> impl Iterator<Item = GoapError> + '_ {
        self.events.iter().filter_map(AgentTickEvent::error)
    }
}


/// A GOAP-driven AI, as a Component. Typically lives on the AI controller Entity
/// and drives a separate Pawn Entity, but it works just as well as a plain struct.
#[derive(Component)]
pub struct GoapAgent {
    state: AgentState,
    pawn: Pawn,
    specializations: Vec<Specialization>,
    actions: Vec<BoxedAction>,
    plan: VecDeque<ActionIndex>,
    current_goal: Option<GoalHandle>,
}

impl GoapAgent {
    pub fn new<I, S>(specializations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Specialization>,
    {
        Self {
            state: AgentState::Idle,
            pawn: Pawn::new_empty(),
            specializations: specializations.into_iter().map(Into::into).collect(),
            actions: Vec::new(),
            plan: VecDeque::new(),
            current_goal: None,
        }
    }

    pub fn with_pawn(mut self, pawn: Pawn) -> Self {
        self.pawn = pawn;
        self
    }

    pub fn with_action<A: GoapAction + 'static>(mut self, action: A) -> Self {
        self.add_action(action);
        self
    }

    pub fn add_action<A: GoapAction + 'static>(&mut self, action: A) -> ActionIndex {
        self.add_boxed_action(Box::new(action))
    }

    pub fn add_boxed_action(&mut self, action: BoxedAction) -> ActionIndex {
        self.actions.push(action);
        self.actions.len() - 1
    }

    /// Removes an Action from the agent's repertoire.
    ///
    /// Plans refer to Actions by index, so this also drops the current plan; the Goal
    /// being worked on gets handed back to the dispatcher on the next Idle tick.
    pub fn remove_action(&mut self, idx: ActionIndex) -> Option<BoxedAction> {
        if idx >= self.actions.len() {
            return None;
        }

        if !self.plan.is_empty() {
            #[cfg(feature = "logging")]
            bevy::log::debug!(
                "GoapAgent::remove_action: dropping the current plan, as action #{} is going away",
                idx
            );
            self.plan.clear();
        }
        self.state = AgentState::Idle;

        Some(self.actions.remove(idx))
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn pawn(&self) -> &Pawn {
        &self.pawn
    }

    pub fn set_pawn(&mut self, pawn: Pawn) {
        self.pawn = pawn;
    }

    pub fn specializations(&self) -> &[Specialization] {
        &self.specializations
    }

    pub fn actions(&self) -> &[BoxedAction] {
        &self.actions
    }

    /// The remaining plan, next Action first.
    pub fn plan(&self) -> impl Iterator<Item = ActionIndex> + '_ {
        self.plan.iter().copied()
    }

    pub fn has_plan(&self) -> bool {
        !self.plan.is_empty()
    }

    pub fn current_goal(&self) -> Option<&GoalHandle> {
        self.current_goal.as_ref()
    }

    pub fn current_action(&self) -> Option<&dyn GoapAction> {
        let idx = *self.plan.front()?;
        self.actions.get(idx).map(|action| action.as_ref())
    }

    /// Drops the current Goal and plan right away, handing the Goal back to the dispatcher.
    /// The completion callback does not run.
    pub fn abandon_goal(&mut self, dispatcher: &GoalDispatcher) -> Option<GoalHandle> {
        self.plan.clear();
        self.state = AgentState::Idle;

        let goal = self.current_goal.take()?;

        #[cfg(feature = "logging")]
        bevy::log::debug!("GoapAgent::abandon_goal: abandoning {:?}", goal);

        dispatcher.unbind_goal(&goal);
        Some(goal)
    }

    /// Advances the agent by one tick.
    pub fn tick(&mut self, ctx: &mut AgentTickContext<'_>) -> AgentTickReport {
        let mut report = AgentTickReport::starting_from(self.state);

        match self.state {
            AgentState::Idle => self.tick_idle(ctx, &mut report),
            AgentState::MovingTo => self.tick_moving(ctx, &mut report),
            AgentState::PerformingAction => self.tick_performing(ctx, &mut report),
        }

        report.state = self.state;

        #[cfg(feature = "logging")]
        if report.changed_state() {
            bevy::log::debug!(
                "GoapAgent::tick: agent for {:?} went {:?} -> {:?}",
                self.pawn, report.previous_state, report.state
            );
        }

        report
    }

    fn tick_idle(&mut self, ctx: &mut AgentTickContext<'_>, report: &mut AgentTickReport) {
        self.release_leftover_goal(ctx.dispatcher);

        let Some(goal) = ctx.dispatcher.get_next_goal_for(&self.specializations) else {
            return;
        };
        report.events.push(AgentTickEvent::GoalAssigned { goal: goal.clone() });

        let world = ctx.world.world_state_for(&self.pawn);

        let plan = match ctx.planner.plan(&mut self.actions, &world, goal.target_state()) {
            Ok(plan) => plan,
            Err(error) => {
                #[cfg(feature = "logging")]
                bevy::log::info!(
                    "GoapAgent::tick_idle: could not plan for {:?}: {}; will retry next tick",
                    goal, error
                );

                ctx.dispatcher.unbind_goal(&goal);
                report.events.push(AgentTickEvent::PlanFailed { goal, error });
                return;
            }
        };

        report.events.push(AgentTickEvent::PlanFound {
            goal: goal.clone(),
            steps: plan.steps().to_vec(),
            total_cost: plan.total_cost(),
        });
        self.current_goal = Some(goal);

        if plan.is_empty() {
            self.complete_goal(ctx.dispatcher, report);
            return;
        }

        for action in self.actions.iter_mut() {
            action.reset();
        }
        self.plan = plan.into_queue();
        self.state = self.state_for_next_action();
    }

    fn tick_moving(&mut self, ctx: &mut AgentTickContext<'_>, report: &mut AgentTickReport) {
        let Some(head) = self.checked_head(ctx.dispatcher) else {
            return;
        };
        let action = &mut self.actions[head];

        if !action.requires_in_range() || action.is_in_range() {
            self.state = AgentState::PerformingAction;
            return;
        }

        let Some(target) = action.target() else {
            #[cfg(feature = "logging")]
            bevy::log::error!(
                "GoapAgent::tick_moving: {} requires a target in range but has none; \
                 bind one in its check_procedural_precondition()",
                action.name()
            );
            self.abort(ctx.dispatcher, GoapError::TargetMissing { action: head }, report);
            return;
        };

        match ctx.movement.request_move_to(&self.pawn, target) {
            MoveStatus::Moving => {}
            MoveStatus::Arrived => {
                action.set_in_range(true);
                self.state = AgentState::PerformingAction;
            }
            MoveStatus::Unreachable => {
                #[cfg(feature = "logging")]
                bevy::log::warn!(
                    "GoapAgent::tick_moving: target {:?} of {} is unreachable",
                    target, action.name()
                );
                self.abort(ctx.dispatcher, GoapError::UnreachableTarget { action: head }, report);
            }
        }
    }

    fn tick_performing(&mut self, ctx: &mut AgentTickContext<'_>, report: &mut AgentTickReport) {
        let Some(head) = self.checked_head(ctx.dispatcher) else {
            return;
        };
        let action = &mut self.actions[head];

        if action.requires_in_range() && !action.is_in_range() {
            self.state = AgentState::MovingTo;
            return;
        }

        match action.perform(&self.pawn) {
            ActionOutcome::InProgress => {}
            ActionOutcome::Done => {
                ctx.world.apply_effects(&self.pawn, action.effects());
                let action_name = action.name().into();
                self.plan.pop_front();

                if let Some(goal) = self.current_goal.clone() {
                    report.events.push(AgentTickEvent::ActionCompleted { goal, action: head, action_name });
                }

                match self.plan.is_empty() {
                    true => self.complete_goal(ctx.dispatcher, report),
                    false => self.state = self.state_for_next_action(),
                }
            }
            ActionOutcome::Failed => {
                #[cfg(feature = "logging")]
                bevy::log::warn!("GoapAgent::tick_performing: {} failed, dropping the plan", action.name());

                self.abort(ctx.dispatcher, GoapError::ActionFailure { action: head }, report);
            }
        }
    }

    /// The index of the next planned Action, if the agent is in a state to run it.
    /// Bails out to Idle otherwise.
    fn checked_head(&mut self, dispatcher: &GoalDispatcher) -> Option<ActionIndex> {
        let head = self.plan
            .front()
            .copied()
            .filter(|&idx| idx < self.actions.len());

        if head.is_none() || self.current_goal.is_none() {
            #[cfg(feature = "logging")]
            bevy::log::warn!(
                "GoapAgent::checked_head: agent for {:?} is {:?} without a runnable plan, going Idle",
                self.pawn, self.state
            );
            self.abandon_goal(dispatcher);
            return None;
        }

        head
    }

    fn state_for_next_action(&self) -> AgentState {
        match self.current_action() {
            Some(action) if action.requires_in_range() && !action.is_in_range() => AgentState::MovingTo,
            Some(_) => AgentState::PerformingAction,
            None => AgentState::Idle,
        }
    }

    /// Hands back a Goal the agent is still holding while Idle; this only happens if
    /// something interrupted the normal flow (e.g. `remove_action()`).
    fn release_leftover_goal(&mut self, dispatcher: &GoalDispatcher) {
        self.plan.clear();

        let Some(goal) = self.current_goal.take() else {
            return;
        };

        match goal.is_completed() {
            true => { dispatcher.unregister_goal(&goal); }
            false => dispatcher.unbind_goal(&goal),
        }
    }

    fn complete_goal(&mut self, dispatcher: &GoalDispatcher, report: &mut AgentTickReport) {
        self.plan.clear();
        self.state = AgentState::Idle;

        let Some(goal) = self.current_goal.take() else {
            return;
        };

        #[cfg(feature = "logging")]
        bevy::log::info!("GoapAgent::complete_goal: completed {:?}", goal);

        goal.complete();
        dispatcher.unregister_goal(&goal);
        report.events.push(AgentTickEvent::GoalCompleted { goal });
    }

    fn abort(&mut self, dispatcher: &GoalDispatcher, error: GoapError, report: &mut AgentTickReport) {
        self.plan.clear();
        self.state = AgentState::Idle;

        let Some(goal) = self.current_goal.take() else {
            return;
        };

        #[cfg(feature = "logging")]
        bevy::log::info!("GoapAgent::abort: giving up on {:?}: {}", goal, error);

        dispatcher.unbind_goal(&goal);
        report.events.push(AgentTickEvent::PlanAborted { goal, error });
    }
}

// A despawned (or otherwise dropped) agent cannot hand its Goal back through the
// dispatcher anymore, but `taken` lives on the Goal itself, so clearing it is enough
// to put the Goal back on offer.
impl Drop for GoapAgent {
    fn drop(&mut self) {
        let Some(goal) = self.current_goal.take() else {
            return;
        };

        #[cfg(feature = "logging")]
        bevy::log::debug!("GoapAgent::drop: releasing {:?}", goal);

        goal.release();
    }
}

impl core::fmt::Debug for GoapAgent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GoapAgent")
            .field("state", &self.state)
            .field("pawn", &self.pawn)
            .field("specializations", &self.specializations)
            .field("actions", &self.actions.iter().map(|a| a.name()).collect::<Vec<_>>())
            .field("plan", &self.plan)
            .field("current_goal", &self.current_goal)
            .finish()
    }
}
