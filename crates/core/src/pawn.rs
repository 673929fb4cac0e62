/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
use bevy::prelude::*;
use crate::types::{PawnEntity, PawnEntityRef};

// A GoapAgent on its own is just a planner with a to-do list.
// To do actual work, it needs to 'drive' another Entity - that Entity is the agent's Pawn.
// Movement and world-state collaborators get handed the Pawn, so they know whose legs to
// move and whose inventory to read. An empty Pawn is fine for purely abstract agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Reflect)]
pub struct Pawn(Option<PawnEntity>);

impl Pawn {
    pub fn new(maybe_pawn: PawnEntityRef) -> Self {
        Self(maybe_pawn)
    }

    pub const fn new_empty() -> Self {
        Self(None)
    }

    pub fn new_populated(pawn: PawnEntity) -> Self {
        Self(Some(pawn))
    }

    pub fn as_entity(&self) -> Option<&PawnEntity> {
        self.0.as_ref()
    }

    pub fn to_entity(self) -> PawnEntityRef {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl From<PawnEntity> for Pawn {
    fn from(value: PawnEntity) -> Self {
        Self::new_populated(value)
    }
}

impl core::borrow::Borrow<PawnEntityRef> for Pawn {
    fn borrow(&self) -> &PawnEntityRef {
        &self.0
    }
}
