//! Two haulers moving crates to a stockpile along a one-dimensional yard.
//!
//! Run with `cargo run --example hauling`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bevy::diagnostic::FrameCount;
use bevy::log::LogPlugin;
use bevy::platform::collections::HashMap;
use bevy::{app::ScheduleRunnerPlugin, prelude::*};

use cranium_goap::prelude::*;
use cranium_goap_bevy_plugin::CraniumGoapPlugin;

const HAULING: &str = "Hauling";
const MAX_FRAMES: u32 = 1_000;


/// Where everything is, plus the facts every agent plans against.
#[derive(Debug, Default)]
struct YardState {
    positions: HashMap<Entity, i32>,
    facts: WorldState,
}

#[derive(Debug, Default, Clone)]
struct Yard(Arc<Mutex<YardState>>);

impl Yard {
    fn lock(&self) -> MutexGuard<'_, YardState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn place(&self, entity: Entity, position: i32) {
        self.lock().positions.insert(entity, position);
    }

    fn distance(&self, from: Entity, to: Entity) -> Option<i32> {
        let yard = self.lock();
        let from = yard.positions.get(&from)?;
        let to = yard.positions.get(&to)?;
        Some((to - from).abs())
    }
}

impl MovementProvider for Yard {
    fn request_move_to(&mut self, pawn: &Pawn, target: ActionTarget) -> MoveStatus {
        let Some(&pawn_ent) = pawn.as_entity() else {
            return MoveStatus::Unreachable;
        };

        let mut yard = self.lock();
        let Some(&goal_pos) = yard.positions.get(&target) else {
            return MoveStatus::Unreachable;
        };
        let Some(pawn_pos) = yard.positions.get_mut(&pawn_ent) else {
            return MoveStatus::Unreachable;
        };

        *pawn_pos += (goal_pos - *pawn_pos).signum();

        match *pawn_pos == goal_pos {
            true => MoveStatus::Arrived,
            false => MoveStatus::Moving,
        }
    }
}

impl WorldStateProvider for Yard {
    fn world_state_for(&self, _pawn: &Pawn) -> WorldState {
        self.lock().facts.clone()
    }

    fn apply_effects(&mut self, _pawn: &Pawn, effects: &WorldState) {
        self.lock().facts.apply(effects);
    }
}


/// A hauling step done at some spot in the yard; costs more the further away it is.
struct YardAction {
    name: String,
    preconditions: WorldState,
    effects: WorldState,
    yard: Yard,
    pawn: Entity,
    spot: Entity,
    cost: ActionCost,
    in_range: bool,
    work_ticks: u32,
    worked: u32,
}

impl YardAction {
    fn new(name: String, yard: &Yard, pawn: Entity, spot: Entity, work_ticks: u32) -> Self {
        Self {
            name,
            preconditions: WorldState::new(),
            effects: WorldState::new(),
            yard: yard.clone(),
            pawn,
            spot,
            cost: ActionCost::uncomputed(),
            in_range: false,
            work_ticks,
            worked: 0,
        }
    }

    fn pre<V: Into<FactValue>>(mut self, key: &str, value: V) -> Self {
        self.preconditions.set(key, value);
        self
    }

    fn eff<V: Into<FactValue>>(mut self, key: &str, value: V) -> Self {
        self.effects.set(key, value);
        self
    }
}

impl GoapAction for YardAction {
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
        let (yard, pawn, spot) = (&self.yard, self.pawn, self.spot);
        let work = self.work_ticks as ActionCostValue;
        self.cost.get_or_compute(recompute, || {
            work + yard.distance(pawn, spot).unwrap_or(ActionCostValue::MAX / 4)
        })
    }

    fn requires_in_range(&self) -> bool {
        true
    }

    fn is_in_range(&self) -> bool {
        self.in_range || self.yard.distance(self.pawn, self.spot) == Some(0)
    }

    fn set_in_range(&mut self, in_range: bool) {
        self.in_range = in_range;
    }

    fn target(&self) -> Option<ActionTarget> {
        Some(self.spot)
    }

    fn perform(&mut self, _pawn: &Pawn) -> ActionOutcome {
        self.worked += 1;
        (self.worked >= self.work_ticks).into()
    }

    fn reset(&mut self) {
        self.in_range = false;
        self.worked = 0;
        self.cost.invalidate();
    }
}


fn spawn_hauler(commands: &mut Commands, yard: &Yard, name: &str, position: i32, crates: &[(Entity, &str)], stockpile: Entity) {
    let pawn = commands.spawn(Name::new(format!("{}'s body", name))).id();
    yard.place(pawn, position);

    let holding = format!("{}.holding", name);
    let mut agent = GoapAgent::new([HAULING]).with_pawn(Pawn::from(pawn));

    for &(crate_ent, crate_name) in crates {
        agent.add_action(
            YardAction::new(format!("PickUp({})", crate_name), yard, pawn, crate_ent, 1)
                .pre(&holding, "nothing")
                .eff(&holding, crate_name)
        );
        agent.add_action(
            YardAction::new(format!("Deliver({})", crate_name), yard, pawn, stockpile, 2)
                .pre(&holding, crate_name)
                .eff(&holding, "nothing")
                .eff(crate_name, "stockpile")
        );
    }

    yard.lock().facts.set(holding.as_str(), "nothing");
    commands.spawn((Name::new(name.to_string()), agent));
}

fn setup_yard(mut commands: Commands, yard: Res<DemoYard>, dispatcher: Res<GoalDispatcher>) {
    let yard = &yard.0;

    let stockpile = commands.spawn(Name::new("Stockpile")).id();
    yard.place(stockpile, 0);

    let crates: Vec<(Entity, &str)> = [("crate_a", 6), ("crate_b", -4), ("crate_c", 9)]
        .into_iter()
        .map(|(crate_name, position)| {
            let crate_ent = commands.spawn(Name::new(crate_name)).id();
            yard.place(crate_ent, position);
            yard.lock().facts.set(crate_name, "yard");
            (crate_ent, crate_name)
        })
        .collect();

    spawn_hauler(&mut commands, yard, "Alice", 2, &crates, stockpile);
    spawn_hauler(&mut commands, yard, "Bob", -2, &crates, stockpile);

    for (priority, (_, crate_name)) in crates.iter().enumerate() {
        let goal = Goal::new(world_state! { *crate_name => "stockpile" }, priority as GoalPriority, HAULING)
            .with_label(format!("Stockpile {}", crate_name))
            .with_on_complete(|goal| info!("Callback: {:?} is done", goal.label()));

        dispatcher.register_goal(goal.into_handle());
    }
}

#[derive(Resource)]
struct DemoYard(Yard);

fn log_plans(trigger: On<GoapPlanFound>, agents: Query<(&Name, &GoapAgent)>) {
    let event = trigger.event();
    let Ok((name, agent)) = agents.get(event.entity) else {
        return;
    };

    let steps: Vec<&str> = event.steps
        .iter()
        .filter_map(|&idx| agent.actions().get(idx).map(|action| action.name()))
        .collect();

    info!("{} plans {:?} for {:?} (cost {})", name, steps, event.goal.label(), event.total_cost);
}

fn log_actions(trigger: On<GoapActionCompleted>, names: Query<&Name>) {
    let event = trigger.event();
    let name = names.get(event.entity).map(Name::as_str).unwrap_or("?");
    info!("{} finished {}", name, event.action_name);
}

fn log_goals(trigger: On<GoapGoalCompleted>, names: Query<&Name>) {
    let event = trigger.event();
    let name = names.get(event.entity).map(Name::as_str).unwrap_or("?");
    info!("{} completed {:?}", name, event.goal.label());
}

fn log_aborts(trigger: On<GoapPlanAborted>) {
    let event = trigger.event();
    warn!("{:?} gave up on {:?}: {}", event.entity, event.goal.label(), event.error);
}

fn exit_when_done(
    dispatcher: Res<GoalDispatcher>,
    frames: Res<FrameCount>,
    yard: Res<DemoYard>,
    mut exit: MessageWriter<AppExit>,
) {
    if dispatcher.is_empty() {
        info!("All crates stockpiled after {} frames: {}", frames.0, yard.0.lock().facts);
        exit.write(AppExit::Success);
    } else if frames.0 >= MAX_FRAMES {
        error!("Ran out of frames with {} Goals pending", dispatcher.total_len());
        exit.write(AppExit::error());
    }
}

fn main() -> AppExit {
    let yard = Yard::default();

    App::new()
    .add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(10))),
        LogPlugin {
            level: bevy::log::Level::INFO,
            custom_layer: |_| None,
            filter: "wgpu=error,bevy_ecs=info".to_string(),
            fmt_layer: |_| None,
        },
        CraniumGoapPlugin::in_schedule(Update),
    ))
    .insert_resource(GoapMovement::new(yard.clone()))
    .insert_resource(GoapWorldView::new(yard.clone()))
    .insert_resource(DemoYard(yard))
    .add_observer(log_plans)
    .add_observer(log_actions)
    .add_observer(log_goals)
    .add_observer(log_aborts)
    .add_systems(Startup, setup_yard)
    .add_systems(Last, exit_when_done)
    .run()
}
