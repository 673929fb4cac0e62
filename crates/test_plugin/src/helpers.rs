use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy::app::PluginsState;
use bevy::platform::collections::{HashMap, HashSet};
use bevy::prelude::*;

use cranium_goap_core::action_state::ActionOutcome;
use cranium_goap_core::actions::{ActionCost, GoapAction};
use cranium_goap_core::collaborators::{MoveStatus, MovementProvider, WorldStateProvider};
use cranium_goap_core::dispatcher::GoalDispatcher;
use cranium_goap_core::errors::GoapError;
use cranium_goap_core::events::{
    GoapActionCompleted, GoapGoalAssigned, GoapGoalCompleted,
    GoapPlanAborted, GoapPlanFailed, GoapPlanFound,
};
use cranium_goap_core::identifiers::FactKey;
use cranium_goap_core::pawn::Pawn;
use cranium_goap_core::types::{ActionCostValue, ActionIndex, ActionTarget, GoalHandle};
use cranium_goap_core::world_state::{FactValue, WorldState};

use crate::plugin::GoapTestFrameBudget;


/// One line of the test journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoapTestRecord {
    GoalAssigned { agent: Entity, goal: GoalHandle },
    PlanFound { agent: Entity, goal: GoalHandle, steps: Vec<ActionIndex> },
    PlanFailed { agent: Entity, goal: GoalHandle, error: GoapError },
    ActionCompleted { agent: Entity, action_name: String },
    PlanAborted { agent: Entity, goal: GoalHandle, error: GoapError },
    GoalCompleted { agent: Entity, goal: GoalHandle },
}

/// Everything the agents reported, in the order the Observers saw it.
#[derive(Resource, Debug, Default)]
pub struct GoapTestJournal {
    pub records: Vec<GoapTestRecord>,
}

impl GoapTestJournal {
    pub fn completed_goals(&self) -> Vec<(Entity, GoalHandle)> {
        self.records
            .iter()
            .filter_map(|record| match record {
                GoapTestRecord::GoalCompleted { agent, goal } => Some((*agent, goal.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn completed_actions_of(&self, agent: Entity) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|record| match record {
                GoapTestRecord::ActionCompleted { agent: who, action_name } if *who == agent => {
                    Some(action_name.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn aborts(&self) -> Vec<(Entity, GoapError)> {
        self.records
            .iter()
            .filter_map(|record| match record {
                GoapTestRecord::PlanAborted { agent, error, .. } => Some((*agent, *error)),
                _ => None,
            })
            .collect()
    }

    /// Every error reported so far, planning failures included.
    pub fn failures(&self) -> Vec<(Entity, GoapError)> {
        self.records
            .iter()
            .filter_map(|record| match record {
                GoapTestRecord::PlanFailed { agent, error, .. } => Some((*agent, *error)),
                GoapTestRecord::PlanAborted { agent, error, .. } => Some((*agent, *error)),
                _ => None,
            })
            .collect()
    }

    pub fn plan_failures(&self) -> usize {
        self.failures()
            .iter()
            .filter(|(_, error)| !error.is_execution_failure())
            .count()
    }
}

pub fn journal_goal_assigned(trigger: On<GoapGoalAssigned>, mut journal: ResMut<GoapTestJournal>) {
    let evt = trigger.event();
    journal.records.push(GoapTestRecord::GoalAssigned { agent: evt.entity, goal: evt.goal.clone() });
}

pub fn journal_plan_found(trigger: On<GoapPlanFound>, mut journal: ResMut<GoapTestJournal>) {
    let evt = trigger.event();
    journal.records.push(GoapTestRecord::PlanFound {
        agent: evt.entity,
        goal: evt.goal.clone(),
        steps: evt.steps.clone(),
    });
}

pub fn journal_plan_failed(trigger: On<GoapPlanFailed>, mut journal: ResMut<GoapTestJournal>) {
    let evt = trigger.event();
    #[cfg(feature = "logging")]
    bevy::log::info!("Agent {:?} failed to plan for {:?}: {}", evt.entity, evt.goal, evt.error);
    journal.records.push(GoapTestRecord::PlanFailed {
        agent: evt.entity,
        goal: evt.goal.clone(),
        error: evt.error.into(),
    });
}

pub fn journal_action_completed(trigger: On<GoapActionCompleted>, mut journal: ResMut<GoapTestJournal>) {
    let evt = trigger.event();
    journal.records.push(GoapTestRecord::ActionCompleted {
        agent: evt.entity,
        action_name: evt.action_name.clone(),
    });
}

pub fn journal_plan_aborted(trigger: On<GoapPlanAborted>, mut journal: ResMut<GoapTestJournal>) {
    let evt = trigger.event();
    #[cfg(feature = "logging")]
    bevy::log::info!("Agent {:?} aborted {:?}: {}", evt.entity, evt.goal, evt.error);
    journal.records.push(GoapTestRecord::PlanAborted {
        agent: evt.entity,
        goal: evt.goal.clone(),
        error: evt.error,
    });
}

pub fn journal_goal_completed(trigger: On<GoapGoalCompleted>, mut journal: ResMut<GoapTestJournal>) {
    let evt = trigger.event();
    journal.records.push(GoapTestRecord::GoalCompleted { agent: evt.entity, goal: evt.goal.clone() });
}

/// Steps the App one frame at a time until something asks it to exit.
///
/// Unlike `App::run()`, this leaves the App (and its World) in place,
/// so the test can inspect the journal afterwards.
pub fn run_until_exit(app: &mut App) -> AppExit {
    if app.plugins_state() == PluginsState::Ready {
        app.finish();
        app.cleanup();
    }

    loop {
        app.update();

        if let Some(exit) = app.should_exit() {
            return exit;
        }
    }
}

/// Requests an exit once at least one Goal got completed and nothing is left queued.
pub fn exit_on_all_goals_done(
    dispatcher: Res<GoalDispatcher>,
    journal: Res<GoapTestJournal>,
    mut exit: MessageWriter<AppExit>,
) {
    if dispatcher.is_empty() && !journal.completed_goals().is_empty() {
        #[cfg(feature = "logging")]
        bevy::log::info!("All Goals done, exiting");
        exit.write(AppExit::Success);
    }
}

/// Requests an error exit once the frame budget is spent.
pub fn exit_on_frame_budget_spent(
    mut budget: ResMut<GoapTestFrameBudget>,
    mut exit: MessageWriter<AppExit>,
) {
    match budget.0.checked_sub(1) {
        Some(left) => budget.0 = left,
        None => {
            #[cfg(feature = "logging")]
            bevy::log::error!("Frame budget spent with Goals still pending, exiting");
            exit.write(AppExit::error());
        }
    }
}


/// An Action with fixed preconditions/effects whose `perform()` plays back a script of
/// outcomes; once the script runs out, every further call returns `fallback`.
pub struct ScriptedAction {
    name: String,
    preconditions: WorldState,
    effects: WorldState,
    base_cost: ActionCostValue,
    cost: ActionCost,
    target: Option<ActionTarget>,
    requires_range: bool,
    in_range: bool,
    script: VecDeque<ActionOutcome>,
    fallback: ActionOutcome,
    performs: Arc<AtomicUsize>,
}

impl ScriptedAction {
    pub fn new<S: Into<String>>(name: S, cost: ActionCostValue) -> Self {
        Self {
            name: name.into(),
            preconditions: WorldState::new(),
            effects: WorldState::new(),
            base_cost: cost,
            cost: ActionCost::uncomputed(),
            target: None,
            requires_range: false,
            in_range: true,
            script: VecDeque::new(),
            fallback: ActionOutcome::Done,
            performs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_precondition<K: Into<FactKey>, V: Into<FactValue>>(mut self, key: K, value: V) -> Self {
        self.preconditions.set(key, value);
        self
    }

    pub fn with_effect<K: Into<FactKey>, V: Into<FactValue>>(mut self, key: K, value: V) -> Self {
        self.effects.set(key, value);
        self
    }

    /// The pawn has to walk up to `target` before this can be performed.
    pub fn at_target(mut self, target: Option<ActionTarget>) -> Self {
        self.target = target;
        self.requires_range = true;
        self.in_range = false;
        self
    }

    pub fn with_script<I: IntoIterator<Item = ActionOutcome>>(mut self, outcomes: I) -> Self {
        self.script = outcomes.into_iter().collect();
        self
    }

    pub fn with_fallback(mut self, outcome: ActionOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    /// A counter of `perform()` calls that stays readable after the Action is handed off.
    pub fn perform_counter(&self) -> Arc<AtomicUsize> {
        self.performs.clone()
    }
}

impl GoapAction for ScriptedAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn preconditions(&self) -> &WorldState {
        &self.preconditions
    }

    fn effects(&self) -> &WorldState {
        &self.effects
    }

    fn get_cost(&mut self, recompute: bool) -> ActionCostValue {
        let base_cost = self.base_cost;
        self.cost.get_or_compute(recompute, || base_cost)
    }

    fn requires_in_range(&self) -> bool {
        self.requires_range
    }

    fn is_in_range(&self) -> bool {
        self.in_range
    }

    fn set_in_range(&mut self, in_range: bool) {
        self.in_range = in_range;
    }

    fn target(&self) -> Option<ActionTarget> {
        self.target
    }

    fn perform(&mut self, _pawn: &Pawn) -> ActionOutcome {
        self.performs.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or(self.fallback)
    }

    fn reset(&mut self) {
        self.in_range = !self.requires_range;
    }
}


/// Pretends every trip takes a fixed number of ticks; some targets can be marked unreachable.
#[derive(Debug, Default)]
pub struct ScriptedMovement {
    ticks_per_trip: u32,
    unreachable: HashSet<ActionTarget>,
    progress: HashMap<(Pawn, ActionTarget), u32>,
}

impl ScriptedMovement {
    pub fn new(ticks_per_trip: u32) -> Self {
        Self {
            ticks_per_trip,
            ..Default::default()
        }
    }

    pub fn with_unreachable(mut self, target: ActionTarget) -> Self {
        self.unreachable.insert(target);
        self
    }
}

impl MovementProvider for ScriptedMovement {
    fn request_move_to(&mut self, pawn: &Pawn, target: ActionTarget) -> MoveStatus {
        if self.unreachable.contains(&target) {
            return MoveStatus::Unreachable;
        }

        let walked = self.progress.entry((*pawn, target)).or_insert(0);
        *walked += 1;

        match *walked > self.ticks_per_trip {
            true => {
                self.progress.remove(&(*pawn, target));
                MoveStatus::Arrived
            }
            false => MoveStatus::Moving,
        }
    }
}


/// A world-state collaborator backed by a single shared WorldState.
///
/// Clones share the same state, so a test can keep one around to inspect
/// what the agents did after the other got moved into the App.
#[derive(Debug, Default, Clone)]
pub struct SharedWorldView {
    state: Arc<Mutex<WorldState>>,
}

impl SharedWorldView {
    pub fn new(initial: WorldState) -> Self {
        Self { state: Arc::new(Mutex::new(initial)) }
    }

    pub fn snapshot(&self) -> WorldState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set<K: Into<FactKey>, V: Into<FactValue>>(&self, key: K, value: V) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).set(key, value);
    }
}

impl WorldStateProvider for SharedWorldView {
    fn world_state_for(&self, _pawn: &Pawn) -> WorldState {
        self.snapshot()
    }

    fn apply_effects(&mut self, _pawn: &Pawn, effects: &WorldState) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).apply(effects);
    }
}
