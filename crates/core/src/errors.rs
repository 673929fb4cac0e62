//! Error types for planning and plan execution.
//!
//! Every one of these is recoverable: the agent drops what it was doing,
//! hands its Goal back to the dispatcher and tries again on a later tick.

use crate::types::ActionIndex;

/// Why the planner could not produce a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanningError {
    /// The agent has no (usable) Actions and the Goal is not already satisfied.
    NoActions,
    /// The search space was exhausted without reaching the current world state.
    NoPlan,
    /// The search hit the configured expansion budget before finding anything.
    ExpansionLimit { expansions: usize },
}

impl core::fmt::Display for PlanningError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoActions => write!(f, "no actions available to plan with"),
            Self::NoPlan => write!(f, "no sequence of actions satisfies the goal"),
            Self::ExpansionLimit { expansions } => write!(
                f, "gave up planning after expanding {} nodes", expansions
            ),
        }
    }
}

impl core::error::Error for PlanningError {}


/// Anything that can make an agent abandon its current Goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoapError {
    PlanningFailure(PlanningError),
    /// The Action reported `Failed` from `perform()`.
    ActionFailure { action: ActionIndex },
    /// The Action must be performed in range of a target, but has none.
    TargetMissing { action: ActionIndex },
    /// The movement collaborator cannot get the pawn to the Action's target.
    UnreachableTarget { action: ActionIndex },
}

impl GoapError {
    /// True for the errors raised while executing a plan (as opposed to making one).
    pub fn is_execution_failure(&self) -> bool {
        !matches!(self, Self::PlanningFailure(_))
    }
}

impl From<PlanningError> for GoapError {
    fn from(value: PlanningError) -> Self {
        Self::PlanningFailure(value)
    }
}

impl core::fmt::Display for GoapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PlanningFailure(err) => write!(f, "planning failed: {}", err),
            Self::ActionFailure { action } => write!(f, "action #{} failed", action),
            Self::TargetMissing { action } => write!(
                f, "action #{} requires a target in range, but has no target", action
            ),
            Self::UnreachableTarget { action } => write!(
                f, "target of action #{} is unreachable", action
            ),
        }
    }
}

impl core::error::Error for GoapError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::PlanningFailure(err) => Some(err),
            _ => None,
        }
    }
}
