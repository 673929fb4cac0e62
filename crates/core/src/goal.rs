/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! Goals - the high-level objectives the GoalDispatcher hands out to agents.
//!
//! A Goal is a target WorldState plus routing metadata (priority, Specialization).
//! The target state is immutable once created; the only mutable bits are the
//! `taken` flag (owned by the dispatcher) and the completion bookkeeping.
//!
//! Goals are shared between the dispatcher queue and whichever agent is working
//! on them, so they are passed around as [`GoalHandle`]s - cheap to clone,
//! compared by *identity* rather than by content. Two separately created Goals
//! with identical targets are still two different pieces of work.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use bevy::platform::prelude::String;

use crate::types::{GoalPriority, Specialization};
use crate::world_state::WorldState;

/// A one-shot hook fired when a Goal gets completed successfully.
pub type GoalCompletionCallback = Box<dyn FnOnce(&Goal) + Send + 'static>;

pub struct Goal {
    target_state: WorldState,
    priority: GoalPriority,
    specialization: Specialization,
    label: Option<String>,
    taken: AtomicBool,
    completed: AtomicBool,
    on_complete: Mutex<Option<GoalCompletionCallback>>,
}

impl Goal {
    pub fn new<S: Into<Specialization>>(
        target_state: WorldState,
        priority: GoalPriority,
        specialization: S,
    ) -> Self {
        Self {
            target_state,
            priority,
            specialization: specialization.into(),
            label: None,
            taken: AtomicBool::new(false),
            completed: AtomicBool::new(false),
            on_complete: Mutex::new(None),
        }
    }

    /// Attaches a human-readable name, used in logs and Debug output.
    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attaches a callback that runs exactly once, when the Goal is completed.
    /// It does NOT run if the Goal is abandoned, unbound or unregistered.
    pub fn with_on_complete<F: FnOnce(&Goal) + Send + 'static>(mut self, callback: F) -> Self {
        self.on_complete = Mutex::new(Some(Box::new(callback)));
        self
    }

    pub fn into_handle(self) -> GoalHandle {
        GoalHandle::new(self)
    }

    pub fn target_state(&self) -> &WorldState {
        &self.target_state
    }

    pub fn priority(&self) -> GoalPriority {
        self.priority
    }

    pub fn specialization(&self) -> &Specialization {
        &self.specialization
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_taken(&self) -> bool {
        self.taken.load(Ordering::Acquire)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Atomically claims the Goal. Returns false if something else got there first.
    pub(crate) fn try_take(&self) -> bool {
        self.taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn release(&self) {
        self.taken.store(false, Ordering::Release);
    }

    /// Marks the Goal as completed and fires the completion callback.
    ///
    /// Only the first call does anything; returns whether this call was the one.
    pub fn complete(&self) -> bool {
        if self.completed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let callback = self.on_complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        #[cfg(feature = "logging")]
        bevy::log::debug!("Goal::complete: {:?} completed", self);

        if let Some(callback) = callback {
            callback(self);
        }
        true
    }
}

impl core::fmt::Debug for Goal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Goal")
            .field("label", &self.label)
            .field("target_state", &self.target_state)
            .field("priority", &self.priority)
            .field("specialization", &self.specialization)
            .field("taken", &self.is_taken())
            .field("completed", &self.is_completed())
            .finish()
    }
}


/// A shared, identity-compared reference to a [`Goal`].
///
/// Cloning a handle is cheap and all clones refer to the same Goal,
/// so flipping `taken` through one is visible through all others.
#[derive(Clone)]
pub struct GoalHandle {
    wrapped: Arc<Goal>,
}

impl GoalHandle {
    #[inline]
    pub fn new(goal: Goal) -> Self {
        Self { wrapped: Arc::new(goal) }
    }

    /// True if both handles point at the very same Goal.
    #[inline]
    pub fn same_goal(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.wrapped, &other.wrapped)
    }
}

impl From<Goal> for GoalHandle {
    fn from(value: Goal) -> Self {
        Self::new(value)
    }
}

impl core::ops::Deref for GoalHandle {
    type Target = Goal;

    fn deref(&self) -> &Self::Target {
        self.wrapped.as_ref()
    }
}

impl PartialEq for GoalHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_goal(other)
    }
}

impl Eq for GoalHandle {}

impl core::hash::Hash for GoalHandle {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.wrapped).hash(state)
    }
}

impl core::fmt::Debug for GoalHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.wrapped.fmt(f)
    }
}


#[cfg(test)]
mod tests {
    use core::sync::atomic::AtomicUsize;
    use super::*;
    use crate::world_state;

    #[test]
    fn handles_compare_by_identity() {
        let a = Goal::new(world_state! { "at" => "dropoff" }, 1, "Hauling").into_handle();
        let b = Goal::new(world_state! { "at" => "dropoff" }, 1, "Hauling").into_handle();

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn take_is_exclusive_until_released() {
        let goal = Goal::new(WorldState::new(), 0, "Hauling").into_handle();
        let other_ref = goal.clone();

        assert!(goal.try_take());
        assert!(!other_ref.try_take());
        assert!(other_ref.is_taken());

        goal.release();
        assert!(other_ref.try_take());
    }

    #[test]
    fn completion_callback_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let goal = Goal::new(world_state! { "built" => "wall" }, 5, "Construction")
            .with_label("BuildWall")
            .with_on_complete(move |goal| {
                assert_eq!(goal.label(), Some("BuildWall"));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .into_handle();

        assert!(goal.complete());
        assert!(!goal.complete());
        assert!(goal.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
