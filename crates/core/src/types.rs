//! Type aliases and 'abstracting' newtypes.

/// Type alias to make it easier to switch out what datatype is used for Action costs.
/// Costs are integers; negative values are reserved for the 'not computed yet' sentinel.
pub type ActionCostValue = i32;

/// Sentinel cost value for Actions whose (state-dependent) cost has not been computed yet.
pub const UNCOMPUTED_COST: ActionCostValue = -1;

/// Goal priority; higher is more urgent.
pub type GoalPriority = i32;

/// Position of an Action within its owning agent's Action list.
/// Plans refer to Actions by index, as the Actions themselves are owned by the agent.
pub type ActionIndex = usize;

// Type aliases - to express intent better.
pub type AgentEntity = bevy::prelude::Entity;
pub type PawnEntity = bevy::prelude::Entity;
pub type PawnEntityRef = Option<PawnEntity>;

/// Whatever an Action needs to be in range of to run - a stockpile, a build site, a door...
pub type ActionTarget = bevy::prelude::Entity;

pub type FactKey = crate::identifiers::FactKey;
pub type Specialization = crate::identifiers::Specialization;

pub type BoxedAction = Box<dyn crate::actions::GoapAction>;

pub use crate::goal::GoalHandle;
pub use crate::world_state::{FactValue, WorldState, WorldStateFact};
