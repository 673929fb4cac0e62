/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
//! The GOAP planner.
//!
//! Given an agent's Actions, its current view of the world and a Goal's target state,
//! the planner finds the cheapest ordered sequence of Actions whose effects, applied
//! one after another, make every target fact true.
//!
//! The search runs *backwards* (regression), starting from the Goal. Each search node
//! is a set of requirements that must hold before the rest of the plan can run:
//!
//! 1) the root node requires the Goal's target state,
//! 2) an Action is relevant to a node if its effects provide at least one requirement
//!    and clobber none of them,
//! 3) going through a relevant Action replaces the requirements it provides with its
//!    own preconditions,
//! 4) a node whose requirements all hold in the current world is where the plan starts.
//!
//! Nodes are expanded cheapest-first, so the first starting node popped off the
//! frontier belongs to a minimum-cost plan. Among equally cheap nodes, the ones closer
//! to the current world (fewer requirements still false) go first, then older ones.
//! That count is only ever a tie-break and never gets added to the cost, so it cannot
//! trade plan cost for search speed.
//! Actions are tried in registration order, so results are fully reproducible.

use alloc::collections::{BinaryHeap, VecDeque};
use core::cmp::Reverse;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::errors::PlanningError;
use crate::types::{ActionCostValue, ActionIndex, BoxedAction};
use crate::world_state::WorldState;

/// The default cap on node expansions per planning attempt.
pub const DEFAULT_MAX_EXPANSIONS: usize = 10_000;


/// Planner settings. Use [`PlannerConfig::builder()`] to customize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    max_expansions: usize,
    recompute_costs: bool,
}

impl PlannerConfig {
    pub fn builder() -> PlannerConfigBuilder {
        PlannerConfigBuilder::default()
    }

    /// How many nodes a single planning attempt may expand before giving up.
    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    /// Whether Action costs are force-recomputed at the start of every attempt.
    pub fn recompute_costs(&self) -> bool {
        self.recompute_costs
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfigBuilder::new().build()
    }
}

/// Builder pattern for PlannerConfig
#[derive(Default, Debug, Clone)]
pub struct PlannerConfigBuilder {
    max_expansions: Option<usize>,
    recompute_costs: Option<bool>,
}

impl PlannerConfigBuilder {
    pub fn build(self) -> PlannerConfig {
        PlannerConfig {
            // A budget of zero could never even look at the root.
            max_expansions: self.max_expansions.unwrap_or(DEFAULT_MAX_EXPANSIONS).max(1),
            recompute_costs: self.recompute_costs.unwrap_or(true),
        }
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_expansions(mut self, val: usize) -> Self {
        self.max_expansions = Some(val); self
    }

    /// Turning this off makes the planner reuse cached costs between attempts.
    /// Only do that if none of your Action costs depend on world state.
    pub fn set_recompute_costs(mut self, val: bool) -> Self {
        self.recompute_costs = Some(val); self
    }

    /// Creates a new builder using an existing config as a starting point.
    pub fn from_reference_config(config: &PlannerConfig) -> Self {
        Self {
            max_expansions: Some(config.max_expansions),
            recompute_costs: Some(config.recompute_costs),
        }
    }
}

impl From<PlannerConfigBuilder> for PlannerConfig {
    fn from(value: PlannerConfigBuilder) -> Self {
        value.build()
    }
}

impl From<&PlannerConfig> for PlannerConfigBuilder {
    fn from(value: &PlannerConfig) -> Self {
        Self::from_reference_config(value)
    }
}


/// An ordered list of Actions (by index into the owning agent's Action list).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<ActionIndex>,
    total_cost: ActionCostValue,
}

impl Plan {
    /// The 'nothing to do' plan, for Goals that already hold.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[ActionIndex] {
        &self.steps
    }

    pub fn total_cost(&self) -> ActionCostValue {
        self.total_cost
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<ActionIndex> {
        self.steps
    }

    pub fn into_queue(self) -> VecDeque<ActionIndex> {
        self.steps.into()
    }

    /// Replays the plan forward from `world`, returning the resulting state.
    ///
    /// Returns None if some step's preconditions do not hold at the point
    /// it would run, or if a step points outside of `actions`.
    pub fn simulate(&self, actions: &[BoxedAction], world: &WorldState) -> Option<WorldState> {
        let mut state = world.clone();

        for &step in self.steps.iter() {
            let action = actions.get(step)?;
            if !state.satisfies(action.preconditions()) {
                return None;
            }
            state.apply(action.effects());
        }

        Some(state)
    }

    /// True if the plan runs cleanly from `world` and ends up satisfying `goal`.
    pub fn is_valid_from(&self, actions: &[BoxedAction], world: &WorldState, goal: &WorldState) -> bool {
        self.simulate(actions, world)
            .is_some_and(|end_state| end_state.satisfies(goal))
    }
}


struct SearchNode {
    requirements: WorldState,
    cost: ActionCostValue,
    /// The Action that leads from this node towards the Goal, plus the node it leads to.
    via: Option<(ActionIndex, usize)>,
}

/// (accumulated cost, requirements still false in the world, node index)
/// Node indices grow monotonically, so they double as the insertion order.
type FrontierEntry = Reverse<(ActionCostValue, usize, usize)>;


/// The planner Resource. Stateless apart from its configuration,
/// so any number of agents can plan with it in parallel.
#[derive(Resource, Debug, Clone, Default)]
pub struct GoapPlanner {
    config: PlannerConfig,
}

impl GoapPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PlannerConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Convenience function for tweaking the config in place.
    ///
    /// Creates a Config Builder seeded with the current config values,
    /// hands it to the closure and stores whatever the closure built.
    pub fn with_config_builder<F: FnOnce(PlannerConfigBuilder) -> PlannerConfigBuilder>(
        &mut self,
        builder: F,
    ) -> &mut Self {
        let configured = builder(PlannerConfigBuilder::from_reference_config(&self.config));
        self.config = configured.build();
        self
    }

    /// Finds the cheapest plan from `world` to `goal` using the provided Actions.
    ///
    /// The Actions are borrowed mutably only to refresh their costs and run their
    /// procedural preconditions; the returned Plan refers to them by index.
    pub fn plan(
        &self,
        actions: &mut [BoxedAction],
        world: &WorldState,
        goal: &WorldState,
    ) -> Result<Plan, PlanningError> {
        if world.satisfies(goal) {
            #[cfg(feature = "logging")]
            bevy::log::debug!("GoapPlanner::plan: goal {} already holds, nothing to do", goal);
            return Ok(Plan::empty());
        }

        let usable = self.usable_actions(actions, world);
        if usable.is_empty() {
            #[cfg(feature = "logging")]
            bevy::log::debug!(
                "GoapPlanner::plan: none of the {} actions are usable for goal {}",
                actions.len(), goal
            );
            return Err(PlanningError::NoActions);
        }

        let actions: &[BoxedAction] = actions;

        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut frontier: BinaryHeap<FrontierEntry> = BinaryHeap::new();
        let mut best_costs: HashMap<WorldState, ActionCostValue> = HashMap::default();
        let mut expansions: usize = 0;

        best_costs.insert(goal.clone(), 0);
        nodes.push(SearchNode { requirements: goal.clone(), cost: 0, via: None });
        frontier.push(Reverse((0, world.unsatisfied_count(goal), 0)));

        while let Some(Reverse((cost, _, node_idx))) = frontier.pop() {
            let requirements = nodes[node_idx].requirements.clone();

            // Stale entry; this requirement set got reached more cheaply since.
            if best_costs.get(&requirements).is_some_and(|&best| best < cost) {
                continue;
            }

            if world.satisfies(&requirements) {
                let plan = Self::unwind(&nodes, node_idx);

                #[cfg(feature = "logging")]
                bevy::log::debug!(
                    "GoapPlanner::plan: found plan {:?} (cost {}) for goal {} after {} expansions",
                    plan.steps(), plan.total_cost(), goal, expansions
                );

                return Ok(plan);
            }

            if expansions >= self.config.max_expansions {
                #[cfg(feature = "logging")]
                bevy::log::warn!(
                    "GoapPlanner::plan: expansion budget of {} exhausted for goal {}",
                    self.config.max_expansions, goal
                );
                return Err(PlanningError::ExpansionLimit { expansions });
            }
            expansions += 1;

            for &(action_idx, action_cost) in usable.iter() {
                let action = &actions[action_idx];
                let effects = action.effects();

                if !requirements.shares_any_fact_with(effects) || requirements.contradicts(effects) {
                    continue;
                }

                let mut regressed = requirements.without_facts_of(effects);
                if regressed.contradicts(action.preconditions()) {
                    continue;
                }
                regressed.apply(action.preconditions());

                let next_cost = cost.saturating_add(action_cost);
                if best_costs.get(&regressed).is_some_and(|&best| best <= next_cost) {
                    continue;
                }

                let heuristic = world.unsatisfied_count(&regressed);
                best_costs.insert(regressed.clone(), next_cost);

                let next_idx = nodes.len();
                nodes.push(SearchNode {
                    requirements: regressed,
                    cost: next_cost,
                    via: Some((action_idx, node_idx)),
                });
                frontier.push(Reverse((next_cost, heuristic, next_idx)));
            }
        }

        #[cfg(feature = "logging")]
        bevy::log::debug!(
            "GoapPlanner::plan: search space exhausted after {} expansions, no plan for goal {}",
            expansions, goal
        );

        Err(PlanningError::NoPlan)
    }

    /// Refreshes costs and filters out Actions that opted out of this attempt.
    /// Returns (index, cost) pairs in registration order.
    fn usable_actions(
        &self,
        actions: &mut [BoxedAction],
        world: &WorldState,
    ) -> Vec<(ActionIndex, ActionCostValue)> {
        let mut usable = Vec::with_capacity(actions.len());

        for (idx, action) in actions.iter_mut().enumerate() {
            if !action.check_procedural_precondition(world) {
                #[cfg(feature = "logging")]
                bevy::log::debug!(
                    "GoapPlanner::usable_actions: {} failed its procedural precondition",
                    action.name()
                );
                continue;
            }

            let mut cost = action.get_cost(self.config.recompute_costs);
            if cost < 0 {
                #[cfg(feature = "logging")]
                bevy::log::warn!(
                    "GoapPlanner::usable_actions: {} reported a negative cost ({}), treating it as 0",
                    action.name(), cost
                );
                cost = 0;
            }

            usable.push((idx, cost));
        }

        usable
    }

    /// Walks from the starting node back up to the Goal. As the search ran
    /// backwards, this visits the Actions in forward execution order already.
    fn unwind(nodes: &[SearchNode], start_idx: usize) -> Plan {
        let total_cost = nodes[start_idx].cost;
        let mut steps = Vec::new();
        let mut current = nodes[start_idx].via;

        while let Some((action_idx, towards_goal)) = current {
            steps.push(action_idx);
            current = nodes[towards_goal].via;
        }

        Plan { steps, total_cost }
    }
}
