/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! The GoalDispatcher - a central broker matching idle agents to pending Goals.
//!
//! Goals are partitioned into one queue per Specialization, so that e.g. Hauling
//! and Construction work never contend for the same lock. Within a queue, Goals are
//! kept sorted by descending priority; equal priorities are served first-come,
//! first-served (by registration order, which is tracked globally).
//!
//! A Goal stays queued for its whole lifetime. Handing it out to an agent only marks
//! it as `taken`; the agent either unregisters it once it's done, or unbinds it
//! (clears `taken`) to put it back on the market.
//!
//! Every method takes `&self`, so the dispatcher can be shared between threads
//! (and read by parallel Bevy Systems as a plain `Res<GoalDispatcher>`).

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::goal::GoalHandle;
use crate::types::Specialization;


#[derive(Debug)]
struct QueuedGoal {
    goal: GoalHandle,
    /// Global registration order, for FIFO tie-breaking.
    seq: u64,
}

impl QueuedGoal {
    /// True if this entry should be handed out before `other`.
    fn outranks(&self, other: &QueuedGoal) -> bool {
        (self.goal.priority(), core::cmp::Reverse(self.seq))
            > (other.goal.priority(), core::cmp::Reverse(other.seq))
    }
}

type GoalQueue = Vec<QueuedGoal>;
type SharedGoalQueue = Arc<Mutex<GoalQueue>>;

fn lock_queue(queue: &SharedGoalQueue) -> MutexGuard<'_, GoalQueue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}


#[derive(Resource, Default)]
pub struct GoalDispatcher {
    queues: RwLock<HashMap<Specialization, SharedGoalQueue>>,
    next_seq: AtomicU64,
}

impl GoalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_for(&self, specialization: &str) -> Option<SharedGoalQueue> {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        queues.get(specialization).cloned()
    }

    fn queue_for_or_create(&self, specialization: &Specialization) -> SharedGoalQueue {
        if let Some(queue) = self.queue_for(specialization.as_str()) {
            return queue;
        }

        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(specialization.to_owned())
            .or_insert_with(|| {
                #[cfg(feature = "logging")]
                bevy::log::debug!(
                    "GoalDispatcher::queue_for_or_create: creating a queue for {}",
                    specialization
                );
                Arc::new(Mutex::new(GoalQueue::new()))
            })
            .clone()
    }

    /// Queues a Goal under its Specialization.
    ///
    /// Returns false (and changes nothing) if this very Goal is already queued.
    pub fn register_goal(&self, goal: GoalHandle) -> bool {
        let queue = self.queue_for_or_create(goal.specialization());
        let mut queue = lock_queue(&queue);

        if queue.iter().any(|queued| queued.goal == goal) {
            #[cfg(feature = "logging")]
            bevy::log::debug!("GoalDispatcher::register_goal: {:?} is already queued, skipping", goal);
            return false;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let priority = goal.priority();
        // Highest priority first; the new entry goes behind everything of the same priority.
        let position = queue.partition_point(|queued| queued.goal.priority() >= priority);

        #[cfg(feature = "logging")]
        bevy::log::debug!(
            "GoalDispatcher::register_goal: queued {:?} at position {} of {}",
            goal, position, goal.specialization()
        );

        queue.insert(position, QueuedGoal { goal, seq });
        true
    }

    /// Removes a Goal from its queue, whether it is taken or not.
    ///
    /// Idempotent; returns false if the Goal was not queued in the first place.
    pub fn unregister_goal(&self, goal: &GoalHandle) -> bool {
        let Some(queue) = self.queue_for(goal.specialization().as_str()) else {
            return false;
        };
        let mut queue = lock_queue(&queue);

        match queue.iter().position(|queued| &queued.goal == goal) {
            Some(idx) => {
                queue.remove(idx);

                #[cfg(feature = "logging")]
                bevy::log::debug!("GoalDispatcher::unregister_goal: removed {:?}", goal);

                true
            }
            None => false,
        }
    }

    /// Hands out the best untaken Goal across the provided Specializations
    /// (highest priority first, then oldest registration), marking it as taken.
    ///
    /// Returns None if no queue has anything on offer. Safe to call concurrently;
    /// no Goal will ever be handed out twice without being unbound in between.
    pub fn get_next_goal_for(&self, specializations: &[Specialization]) -> Option<GoalHandle> {
        let mut candidates: Vec<(&Specialization, SharedGoalQueue)> = specializations
            .iter()
            .filter_map(|spec| self.queue_for(spec.as_str()).map(|queue| (spec, queue)))
            .collect();

        // Fixed lock order across callers, so multi-queue lookups cannot deadlock.
        candidates.sort_by(|(left, _), (right, _)| left.cmp(right));
        candidates.dedup_by(|(left, _), (right, _)| left == right);

        let guards: Vec<MutexGuard<'_, GoalQueue>> = candidates
            .iter()
            .map(|(_, queue)| lock_queue(queue))
            .collect();

        let mut best: Option<&QueuedGoal> = None;

        for guard in guards.iter() {
            // Queues are sorted, so the first untaken entry is that queue's best.
            let queue_best = guard.iter().find(|queued| !queued.goal.is_taken());

            best = match (best, queue_best) {
                (Some(current), Some(challenger)) if challenger.outranks(current) => Some(challenger),
                (None, challenger) => challenger,
                (current, _) => current,
            };
        }

        let chosen = best?;

        // We hold the lock on the owning queue, so nobody else can claim it first.
        if !chosen.goal.try_take() {
            #[cfg(feature = "logging")]
            bevy::log::warn!(
                "GoalDispatcher::get_next_goal_for: {:?} was claimed outside of the dispatcher",
                chosen.goal
            );
            return None;
        }

        #[cfg(feature = "logging")]
        bevy::log::debug!("GoalDispatcher::get_next_goal_for: handing out {:?}", chosen.goal);

        Some(chosen.goal.clone())
    }

    /// Puts a taken Goal back on offer, leaving it in its queue.
    ///
    /// The dispatcher never does this on its own; it is up to the agent holding the Goal.
    pub fn unbind_goal(&self, goal: &GoalHandle) {
        #[cfg(feature = "logging")]
        bevy::log::debug!("GoalDispatcher::unbind_goal: releasing {:?}", goal);

        goal.release();
    }

    pub fn contains(&self, goal: &GoalHandle) -> bool {
        self.queue_for(goal.specialization().as_str())
            .is_some_and(|queue| lock_queue(&queue).iter().any(|queued| &queued.goal == goal))
    }

    /// Number of Goals in a Specialization that are NOT currently taken.
    pub fn pending_count(&self, specialization: &str) -> usize {
        self.queue_for(specialization)
            .map(|queue| lock_queue(&queue).iter().filter(|queued| !queued.goal.is_taken()).count())
            .unwrap_or(0)
    }

    /// Number of Goals in a Specialization, taken or not.
    pub fn len(&self, specialization: &str) -> usize {
        self.queue_for(specialization)
            .map(|queue| lock_queue(&queue).len())
            .unwrap_or(0)
    }

    pub fn total_len(&self) -> usize {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        queues.values().map(|queue| lock_queue(queue).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// All Specializations a queue has ever been created for, sorted.
    pub fn specializations(&self) -> Vec<Specialization> {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<Specialization> = queues.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl core::fmt::Debug for GoalDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GoalDispatcher")
            .field("specializations", &self.specializations())
            .field("total_len", &self.total_len())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::goal::Goal;
    use crate::world_state::WorldState;

    fn goal(priority: i32, specialization: &str, label: &str) -> GoalHandle {
        Goal::new(WorldState::new(), priority, specialization)
            .with_label(label)
            .into_handle()
    }

    fn specs(names: &[&str]) -> Vec<Specialization> {
        names.iter().map(|name| Specialization::from(*name)).collect()
    }

    #[test]
    fn hands_out_goals_by_descending_priority() {
        let dispatcher = GoalDispatcher::new();
        for (priority, label) in [(1, "low"), (9, "urgent"), (5, "mid"), (-3, "whenever")] {
            dispatcher.register_goal(goal(priority, "Hauling", label));
        }

        let hauler = specs(&["Hauling"]);
        let order: Vec<i32> = core::iter::from_fn(|| dispatcher.get_next_goal_for(&hauler))
            .map(|goal| goal.priority())
            .collect();

        assert_eq!(order, vec![9, 5, 1, -3]);
        assert_eq!(dispatcher.len("Hauling"), 4);
        assert_eq!(dispatcher.pending_count("Hauling"), 0);
    }

    #[test]
    fn equal_priorities_are_fifo() {
        let dispatcher = GoalDispatcher::new();
        let first = goal(3, "Hauling", "first");
        let second = goal(3, "Hauling", "second");
        let third = goal(3, "Hauling", "third");

        dispatcher.register_goal(first.clone());
        dispatcher.register_goal(second.clone());
        dispatcher.register_goal(third.clone());

        let hauler = specs(&["Hauling"]);
        assert_eq!(dispatcher.get_next_goal_for(&hauler), Some(first));
        assert_eq!(dispatcher.get_next_goal_for(&hauler), Some(second));
        assert_eq!(dispatcher.get_next_goal_for(&hauler), Some(third));
        assert_eq!(dispatcher.get_next_goal_for(&hauler), None);
    }

    #[test]
    fn unregister_is_idempotent() {
        let dispatcher = GoalDispatcher::new();
        let queued = goal(1, "Hauling", "queued");
        let stranger = goal(1, "Construction", "never registered");

        assert!(dispatcher.register_goal(queued.clone()));
        assert!(!dispatcher.register_goal(queued.clone()));
        assert_eq!(dispatcher.len("Hauling"), 1);

        assert!(dispatcher.unregister_goal(&queued));
        assert!(!dispatcher.unregister_goal(&queued));
        assert!(!dispatcher.unregister_goal(&stranger));
        assert!(dispatcher.is_empty());
        assert!(!dispatcher.contains(&queued));
    }

    #[test]
    fn unbound_goals_go_back_on_offer() {
        let dispatcher = GoalDispatcher::new();
        let only = goal(1, "Hauling", "only");
        dispatcher.register_goal(only.clone());

        let hauler = specs(&["Hauling"]);
        let taken = dispatcher.get_next_goal_for(&hauler);
        assert_eq!(taken.as_ref(), Some(&only));
        assert_eq!(dispatcher.get_next_goal_for(&hauler), None);

        dispatcher.unbind_goal(&only);
        assert!(!only.is_taken());
        assert_eq!(dispatcher.pending_count("Hauling"), 1);
        assert_eq!(dispatcher.get_next_goal_for(&hauler), Some(only));
    }

    #[test]
    fn only_matching_specializations_are_considered() {
        let dispatcher = GoalDispatcher::new();
        let haul = goal(1, "Hauling", "haul");
        let build = goal(10, "Construction", "build");
        let cook = goal(50, "Cooking", "cook");

        dispatcher.register_goal(haul.clone());
        dispatcher.register_goal(build.clone());
        dispatcher.register_goal(cook);

        assert_eq!(dispatcher.get_next_goal_for(&specs(&["Mining"])), None);
        assert_eq!(dispatcher.get_next_goal_for(&[]), None);

        // Best across both queues, regardless of the order they are listed in.
        let generalist = specs(&["Hauling", "Construction", "Hauling"]);
        assert_eq!(dispatcher.get_next_goal_for(&generalist), Some(build));
        assert_eq!(dispatcher.get_next_goal_for(&generalist), Some(haul));
        assert_eq!(dispatcher.get_next_goal_for(&generalist), None);

        assert_eq!(
            dispatcher.specializations(),
            specs(&["Construction", "Cooking", "Hauling"])
        );
    }

    #[test]
    fn cross_queue_ties_use_registration_order() {
        let dispatcher = GoalDispatcher::new();
        let older = goal(2, "Hauling", "older");
        let newer = goal(2, "Construction", "newer");

        dispatcher.register_goal(older.clone());
        dispatcher.register_goal(newer.clone());

        let generalist = specs(&["Construction", "Hauling"]);
        assert_eq!(dispatcher.get_next_goal_for(&generalist), Some(older));
        assert_eq!(dispatcher.get_next_goal_for(&generalist), Some(newer));
    }

    #[test]
    fn concurrent_requests_never_share_a_goal() {
        let dispatcher = GoalDispatcher::new();
        let goal_count = 200;

        for idx in 0..goal_count {
            let specialization = if idx % 2 == 0 { "Hauling" } else { "Construction" };
            dispatcher.register_goal(goal(idx % 7, specialization, "job"));
        }

        let received: StdMutex<Vec<GoalHandle>> = StdMutex::new(Vec::new());
        let worker_specs = [
            specs(&["Hauling"]),
            specs(&["Construction"]),
            specs(&["Hauling", "Construction"]),
            specs(&["Construction", "Hauling"]),
        ];

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let dispatcher = &dispatcher;
                let received = &received;
                let my_specs = &worker_specs[worker % worker_specs.len()];

                scope.spawn(move || {
                    while let Some(goal) = dispatcher.get_next_goal_for(my_specs) {
                        received.lock().unwrap().push(goal);
                    }
                });
            }
        });

        let received = received.into_inner().unwrap();
        let unique: HashSet<GoalHandle> = received.iter().cloned().collect();

        assert_eq!(received.len(), goal_count as usize);
        assert_eq!(unique.len(), goal_count as usize);
        assert_eq!(dispatcher.pending_count("Hauling"), 0);
        assert_eq!(dispatcher.pending_count("Construction"), 0);
    }
}
