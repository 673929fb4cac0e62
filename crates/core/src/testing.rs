//! Test doubles shared by the unit tests of this crate.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use bevy::platform::prelude::String;

use crate::action_state::ActionOutcome;
use crate::actions::{ActionCost, GoapAction};
use crate::collaborators::{MoveStatus, MovementProvider, WorldStateProvider};
use crate::identifiers::FactKey;
use crate::pawn::Pawn;
use crate::types::{ActionCostValue, ActionTarget, BoxedAction};
use crate::world_state::{FactValue, WorldState};


#[derive(Debug, Default)]
struct StubCounters {
    recomputes: AtomicUsize,
    performs: AtomicUsize,
    resets: AtomicUsize,
}

/// Read-only view of what happened to a StubAction after it got boxed away.
#[derive(Debug, Clone)]
pub(crate) struct StubProbe(Arc<StubCounters>);

impl StubProbe {
    pub(crate) fn recomputes(&self) -> usize {
        self.0.recomputes.load(Ordering::SeqCst)
    }

    pub(crate) fn performs(&self) -> usize {
        self.0.performs.load(Ordering::SeqCst)
    }

    pub(crate) fn resets(&self) -> usize {
        self.0.resets.load(Ordering::SeqCst)
    }
}


/// A configurable Action; `perform()` plays back a script of outcomes, then reports Done.
pub(crate) struct StubAction {
    name: String,
    preconditions: WorldState,
    effects: WorldState,
    base_cost: ActionCostValue,
    cost: ActionCost,
    requires_range: bool,
    starts_in_range: bool,
    in_range: bool,
    target: Option<ActionTarget>,
    procedural_ok: bool,
    script: VecDeque<ActionOutcome>,
    counters: Arc<StubCounters>,
}

impl StubAction {
    pub(crate) fn new<S: Into<String>>(name: S, cost: ActionCostValue) -> Self {
        Self {
            name: name.into(),
            preconditions: WorldState::new(),
            effects: WorldState::new(),
            base_cost: cost,
            cost: ActionCost::uncomputed(),
            requires_range: false,
            starts_in_range: true,
            in_range: true,
            target: None,
            procedural_ok: true,
            script: VecDeque::new(),
            counters: Arc::new(StubCounters::default()),
        }
    }

    pub(crate) fn pre<K: Into<FactKey>, V: Into<FactValue>>(mut self, key: K, value: V) -> Self {
        self.preconditions.set(key, value);
        self
    }

    pub(crate) fn eff<K: Into<FactKey>, V: Into<FactValue>>(mut self, key: K, value: V) -> Self {
        self.effects.set(key, value);
        self
    }

    pub(crate) fn procedural(mut self, passes: bool) -> Self {
        self.procedural_ok = passes;
        self
    }

    /// Makes the Action require range of `target`, starting out of range.
    pub(crate) fn in_range_of(mut self, target: Option<ActionTarget>) -> Self {
        self.requires_range = true;
        self.starts_in_range = false;
        self.in_range = false;
        self.target = target;
        self
    }

    pub(crate) fn script<I: IntoIterator<Item = ActionOutcome>>(mut self, outcomes: I) -> Self {
        self.script = outcomes.into_iter().collect();
        self
    }

    pub(crate) fn with_probe(self) -> (Self, StubProbe) {
        let probe = StubProbe(self.counters.clone());
        (self, probe)
    }

    pub(crate) fn boxed(self) -> BoxedAction {
        Box::new(self)
    }
}

impl GoapAction for StubAction {
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
        if recompute {
            self.counters.recomputes.fetch_add(1, Ordering::SeqCst);
        }
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

    fn check_procedural_precondition(&mut self, _world: &WorldState) -> bool {
        self.procedural_ok
    }

    fn perform(&mut self, _pawn: &Pawn) -> ActionOutcome {
        self.counters.performs.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or(ActionOutcome::Done)
    }

    fn reset(&mut self) {
        self.counters.resets.fetch_add(1, Ordering::SeqCst);
        self.in_range = self.starts_in_range;
    }
}


/// Plays back a script of move results, then keeps repeating `fallback`.
#[derive(Debug)]
pub(crate) struct ScriptedMoves {
    pub(crate) script: VecDeque<MoveStatus>,
    pub(crate) fallback: MoveStatus,
    pub(crate) requests: Vec<ActionTarget>,
}

impl ScriptedMoves {
    pub(crate) fn new<I: IntoIterator<Item = MoveStatus>>(script: I, fallback: MoveStatus) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            requests: Vec::new(),
        }
    }

    pub(crate) fn always(status: MoveStatus) -> Self {
        Self::new([], status)
    }
}

impl MovementProvider for ScriptedMoves {
    fn request_move_to(&mut self, _pawn: &Pawn, target: ActionTarget) -> MoveStatus {
        self.requests.push(target);
        self.script.pop_front().unwrap_or(self.fallback)
    }
}


/// A single shared in-memory world that completed Actions write their effects into.
#[derive(Debug, Default, Clone)]
pub(crate) struct FactWorld {
    pub(crate) state: WorldState,
}

impl FactWorld {
    pub(crate) fn new(state: WorldState) -> Self {
        Self { state }
    }
}

impl WorldStateProvider for FactWorld {
    fn world_state_for(&self, _pawn: &Pawn) -> WorldState {
        self.state.clone()
    }

    fn apply_effects(&mut self, _pawn: &Pawn, effects: &WorldState) {
        self.state.apply(effects);
    }
}
