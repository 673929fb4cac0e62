//! Actions
//!
//! A GOAP Action is a primitive capability of an agent, e.g. PickUp, Deliver or OpenDoor.
//!
//! To the planner, an Action is nothing but data:
//! 1) a set of preconditions - facts that must hold before it can run,
//! 2) a set of effects - facts that will hold once it finished,
//! 3) a cost - how much we dislike doing it.
//!
//! To the agent executing the plan, an Action is also a per-tick behavior (`perform()`),
//! optionally bound to a target Entity the pawn needs to be in range of first.
//!
//! Each agent owns its own Action instances; they carry per-agent mutable state
//! (cached cost, bound target, progress) and are never shared between agents.

use crate::action_state::ActionOutcome;
use crate::pawn::Pawn;
use crate::types::{ActionCostValue, ActionTarget, UNCOMPUTED_COST};
use crate::world_state::WorldState;


/// The contract every concrete Action implements.
///
/// Only `name()`, `preconditions()`, `effects()`, `get_cost()` and `perform()` are
/// mandatory; the rest default to an Action that runs anywhere and needs no setup.
pub trait GoapAction: Send + Sync {
    /// Human-readable identifier, used in logs and events.
    fn name(&self) -> &str;

    fn preconditions(&self) -> &WorldState;

    fn effects(&self) -> &WorldState;

    /// Returns the cost of this Action.
    ///
    /// Actions with a static cost should just return it.
    /// Actions with a state-dependent cost (e.g. distance to target) should compute it
    /// if it has not been computed yet and cache it; if `recompute` is true, they must
    /// compute it anew even if a cached value exists. The [`ActionCost`] helper does
    /// exactly that bookkeeping.
    ///
    /// Costs are expected to be non-negative; the planner treats negatives as zero.
    fn get_cost(&mut self, recompute: bool) -> ActionCostValue;

    /// Whether the pawn needs to be in range of `target()` before `perform()` can run.
    fn requires_in_range(&self) -> bool {
        false
    }

    fn is_in_range(&self) -> bool {
        true
    }

    /// Called by the agent when the movement collaborator reports arrival at the target.
    /// Actions that require range should remember this until `reset()`.
    fn set_in_range(&mut self, _in_range: bool) {}

    fn target(&self) -> Option<ActionTarget> {
        None
    }

    /// Runtime check run once per planning attempt, against the agent's world view.
    ///
    /// This is the place to bind a target (find the nearest stockpile etc.).
    /// Returning false excludes the Action from this planning attempt.
    fn check_procedural_precondition(&mut self, _world: &WorldState) -> bool {
        true
    }

    /// Runs one tick worth of the Action. Called at most once per agent tick.
    fn perform(&mut self, pawn: &Pawn) -> ActionOutcome;

    /// Clears any per-run state (progress, in-range flags) before a fresh plan starts.
    fn reset(&mut self) {}
}

impl core::fmt::Debug for dyn GoapAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GoapAction")
            .field("name", &self.name())
            .field("preconditions", self.preconditions())
            .field("effects", self.effects())
            .field("requires_in_range", &self.requires_in_range())
            .field("target", &self.target())
            .finish()
    }
}


/// A tiny cache for Action costs, encoding 'not computed yet' as [`UNCOMPUTED_COST`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionCost {
    cached: ActionCostValue,
}

impl ActionCost {
    /// A cost that will be computed on first use.
    pub const fn uncomputed() -> Self {
        Self { cached: UNCOMPUTED_COST }
    }

    /// A static cost; this is never recomputed by `get_or_compute()`.
    pub const fn fixed(cost: ActionCostValue) -> Self {
        Self { cached: cost }
    }

    pub fn is_computed(&self) -> bool {
        self.cached != UNCOMPUTED_COST
    }

    pub fn cached(&self) -> Option<ActionCostValue> {
        match self.is_computed() {
            true => Some(self.cached),
            false => None,
        }
    }

    pub fn invalidate(&mut self) {
        self.cached = UNCOMPUTED_COST;
    }

    /// Returns the cached cost, running `compute` first if there is none
    /// or if a recompute was requested.
    pub fn get_or_compute<F: FnOnce() -> ActionCostValue>(
        &mut self,
        recompute: bool,
        compute: F,
    ) -> ActionCostValue {
        if recompute || !self.is_computed() {
            self.cached = compute();
        }
        self.cached
    }
}

impl Default for ActionCost {
    fn default() -> Self {
        Self::uncomputed()
    }
}
