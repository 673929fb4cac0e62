/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! Narrow interfaces to the parts of the game this library does not own.
//!
//! Movement/pathfinding and the world's actual state live in your code; the agent
//! only ever talks to them through these two traits. In a Bevy App, they are plugged
//! in as the [`GoapMovement`] and [`GoapWorldView`] Resources.

use bevy::prelude::*;

use crate::pawn::Pawn;
use crate::types::ActionTarget;
use crate::world_state::WorldState;

/// What the movement collaborator reports back for a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum MoveStatus {
    /// The pawn is in range of the target now.
    Arrived,
    /// Still on the way; ask again next tick.
    Moving,
    /// No way to get there; the current plan is toast.
    Unreachable,
}

/// Moves pawns toward Action targets.
///
/// `request_move_to()` is called once per tick while an agent is in its MovingTo state,
/// so implementations should advance the move by one step (or just report progress
/// of a move handled elsewhere) and must never block.
pub trait MovementProvider: Send + Sync {
    fn request_move_to(&mut self, pawn: &Pawn, target: ActionTarget) -> MoveStatus;
}

/// Answers 'what does this pawn currently believe about the world'.
pub trait WorldStateProvider: Send + Sync {
    /// A snapshot of the facts relevant to planning for this pawn.
    fn world_state_for(&self, pawn: &Pawn) -> WorldState;

    /// Publishes the effects of an Action that just completed.
    ///
    /// Many games update the world as a side-effect of `perform()` and can leave this be.
    fn apply_effects(&mut self, _pawn: &Pawn, _effects: &WorldState) {}
}


/// A movement collaborator for agents that never need to go anywhere;
/// everything is always in reach.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stationary;

impl MovementProvider for Stationary {
    fn request_move_to(&mut self, _pawn: &Pawn, _target: ActionTarget) -> MoveStatus {
        MoveStatus::Arrived
    }
}

/// A world view that believes nothing is true. Every Goal has to be planned from scratch.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyWorld;

impl WorldStateProvider for EmptyWorld {
    fn world_state_for(&self, _pawn: &Pawn) -> WorldState {
        WorldState::new()
    }
}


/// Resource holding the movement collaborator used by the agent tick System.
#[derive(Resource)]
pub struct GoapMovement(pub Box<dyn MovementProvider>);

impl GoapMovement {
    pub fn new<M: MovementProvider + 'static>(provider: M) -> Self {
        Self(Box::new(provider))
    }
}

impl Default for GoapMovement {
    fn default() -> Self {
        Self::new(Stationary)
    }
}

/// Resource holding the world-state collaborator used by the agent tick System.
#[derive(Resource)]
pub struct GoapWorldView(pub Box<dyn WorldStateProvider>);

impl GoapWorldView {
    pub fn new<W: WorldStateProvider + 'static>(provider: W) -> Self {
        Self(Box::new(provider))
    }
}

impl Default for GoapWorldView {
    fn default() -> Self {
        Self::new(EmptyWorld)
    }
}
