//! End-to-end allocation scenarios for `skyfleet-core`.
//!
//! Each test builds an engine from scratch, runs one or more passes and
//! checks the results against hand-computed expectations or against the
//! log audit.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::arithmetic_side_effects
)]

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skyfleet_core::{
    AllocationEngine, AllocationError, NoOpObserver, RecordingObserver, SchedulerConfig,
    verify_events,
};
use skyfleet_fleet::{Task, TaskSpec, Uav, UavSpec};
use skyfleet_types::{DepletionPolicy, EventKind, Position, PriorityFormula, TaskId, UavId};

fn uav_at(id: u64, energy: f64, position: Position) -> Uav {
    Uav::new(UavSpec {
        id: UavId::new(id),
        weight_capacity: 10.0,
        energy_capacity: energy,
        position,
    })
    .unwrap()
}

fn task_spec(id: u64, x: f64, y: f64) -> TaskSpec {
    TaskSpec {
        id: TaskId::new(id),
        position: Position::new(x, y),
        deadline: 100.0,
        initial_value: 50.0,
        decay_rate: 0.0,
        weight: 1.0,
    }
}

fn task(id: u64, x: f64, y: f64) -> Task {
    Task::new(task_spec(id, x, y)).unwrap()
}

fn engine_with(config: SchedulerConfig) -> AllocationEngine {
    AllocationEngine::new(config).unwrap()
}

/// A seeded fleet and task set spread around the origin.
fn random_world(seed: u64, config: SchedulerConfig) -> AllocationEngine {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut engine = engine_with(config);
    for id in 1..=4 {
        let energy = rng.random_range(40.0..200.0);
        engine
            .add_uav(uav_at(id, energy, Position::ORIGIN))
            .unwrap();
    }
    for id in 1..=25 {
        let spec = TaskSpec {
            id: TaskId::new(id),
            position: Position::new(rng.random_range(-60.0..60.0), rng.random_range(-60.0..60.0)),
            deadline: rng.random_range(1.0..50.0),
            initial_value: rng.random_range(1.0..100.0),
            decay_rate: rng.random_range(0.0..1.0),
            weight: rng.random_range(0.0..12.0),
        };
        engine.add_task(Task::new(spec).unwrap()).unwrap();
    }
    engine
}

#[test]
fn scenario_a_single_task_round_trip() {
    let mut engine = engine_with(SchedulerConfig::new(10.0, Position::ORIGIN));
    engine.add_uav(uav_at(1, 100.0, Position::ORIGIN)).unwrap();
    engine.add_task(task(1, 10.0, 0.0)).unwrap();

    let mut observer = RecordingObserver::default();
    let summary = engine.allocate(&mut observer).unwrap();

    assert_eq!(summary.tasks_assigned, 1);
    let events = &observer.events;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, EventKind::Assigned);
    assert_eq!(events[0].task_id, Some(TaskId::new(1)));
    assert!((events[0].remaining_energy - 90.0).abs() < 1e-9);
    assert_eq!(events[1].kind, EventKind::Returned);
    assert!((events[1].remaining_energy - 80.0).abs() < 1e-9);
    assert_eq!(
        events[0].to_string(),
        "ASSIGN: UAV 1 -> Task 1 (cost: 10.00, remaining energy: 90.00)"
    );
}

#[test]
fn scenario_b_unreachable_task_is_left_alone() {
    let mut engine = engine_with(SchedulerConfig::new(10.0, Position::ORIGIN));
    engine.add_uav(uav_at(1, 15.0, Position::ORIGIN)).unwrap();
    engine.add_task(task(1, 20.0, 0.0)).unwrap();

    let summary = engine.allocate(&mut NoOpObserver).unwrap();
    assert_eq!(summary.tasks_assigned, 0);
    assert!(engine.events().is_empty());
    let outcome = &summary.outcomes[0];
    assert!(outcome.assigned.is_empty());
    assert!((outcome.final_energy - 15.0).abs() < f64::EPSILON);
    assert!(!engine.task(TaskId::new(1)).unwrap().is_completed());
}

#[test]
fn scenario_c_value_hits_zero_at_deadline() {
    let t = Task::new(TaskSpec {
        id: TaskId::new(1),
        position: Position::ORIGIN,
        deadline: 5.0,
        initial_value: 100.0,
        decay_rate: 0.5,
        weight: 0.0,
    })
    .unwrap();
    assert!((t.current_value(0.0).unwrap() - 100.0).abs() < f64::EPSILON);
    assert!(t.current_value(5.0).unwrap().abs() < f64::EPSILON);
}

#[test]
fn scenario_d_equal_priorities_resolve_in_input_order() {
    let run = || {
        let mut engine = engine_with(SchedulerConfig::new(10.0, Position::ORIGIN));
        engine.add_uav(uav_at(1, 100.0, Position::ORIGIN)).unwrap();
        engine.add_task(task(5, 10.0, 0.0)).unwrap();
        engine.add_task(task(2, -10.0, 0.0)).unwrap();
        let summary = engine.allocate(&mut NoOpObserver).unwrap();
        summary.outcomes[0].assigned.clone()
    };
    let first = run();
    assert_eq!(first, vec![TaskId::new(5), TaskId::new(2)]);
    assert_eq!(first, run());
}

#[test]
fn legacy_formula_can_change_the_pick() {
    // Near task with a far deadline vs. a farther task due soon.
    let build = |formula| {
        let mut config = SchedulerConfig::new(10.0, Position::ORIGIN);
        config.priority_formula = formula;
        let mut engine = engine_with(config);
        engine.add_uav(uav_at(1, 40.0, Position::ORIGIN)).unwrap();
        let mut near = task_spec(1, 5.0, 0.0);
        near.deadline = 1000.0;
        let mut urgent = task_spec(2, 15.0, 0.0);
        urgent.deadline = 1.0;
        engine.add_task(Task::new(near).unwrap()).unwrap();
        engine.add_task(Task::new(urgent).unwrap()).unwrap();
        engine
    };

    let mut canonical = build(PriorityFormula::ValueUrgencyDistance);
    let summary = canonical.allocate(&mut NoOpObserver).unwrap();
    assert_eq!(summary.outcomes[0].assigned.first(), Some(&TaskId::new(2)));

    let mut legacy = build(PriorityFormula::ValueDistance);
    let summary = legacy.allocate(&mut NoOpObserver).unwrap();
    assert_eq!(summary.outcomes[0].assigned.first(), Some(&TaskId::new(1)));
}

#[test]
fn no_task_is_assigned_twice_across_passes() {
    for seed in 0..20 {
        let mut engine = random_world(seed, SchedulerConfig::new(10.0, Position::ORIGIN));
        let open_before = engine.open_tasks();
        let mut seen = BTreeSet::new();
        for _ in 0..3 {
            let summary = engine.allocate(&mut NoOpObserver).unwrap();
            for outcome in &summary.outcomes {
                for id in &outcome.assigned {
                    assert!(seen.insert(*id), "seed {seed}: task {id} assigned twice");
                    assert!(engine.task(*id).unwrap().is_completed());
                }
            }
            engine.refuel_pass(&mut NoOpObserver);
        }
        assert_eq!(open_before - engine.open_tasks(), seen.len());
        assert!(verify_events(engine.events(), engine.fleet()).is_clean());
    }
}

#[test]
fn uavs_starting_at_the_station_never_deplete() {
    for seed in 0..20 {
        let mut engine = random_world(seed, SchedulerConfig::new(10.0, Position::ORIGIN));
        let summary = engine.allocate(&mut NoOpObserver).unwrap();
        assert!(
            engine.events().iter().all(|e| e.kind != EventKind::Depleted),
            "seed {seed}: depletion after a checked round trip"
        );
        for outcome in &summary.outcomes {
            assert!(outcome.aborted.is_none());
            assert!(outcome.final_energy >= 0.0);
            assert_eq!(outcome.final_position, Position::ORIGIN);
        }
    }
}

#[test]
fn energy_only_rises_on_refuel() {
    let mut engine = random_world(7, SchedulerConfig::new(30.0, Position::ORIGIN));
    engine.allocate(&mut NoOpObserver).unwrap();
    engine.refuel_pass(&mut NoOpObserver);
    engine.allocate(&mut NoOpObserver).unwrap();

    for event in engine.events() {
        assert!(event.remaining_energy >= 0.0);
        if event.kind == EventKind::Refueled {
            continue;
        }
        assert!(event.remaining_energy <= event.energy_before);
    }
    assert!(verify_events(engine.events(), engine.fleet()).is_clean());
}

#[test]
fn refuel_pass_is_idempotent() {
    let mut engine = random_world(3, SchedulerConfig::new(30.0, Position::ORIGIN));
    engine.allocate(&mut NoOpObserver).unwrap();

    engine.refuel_pass(&mut NoOpObserver);
    let energies: Vec<f64> = engine.fleet().iter().map(Uav::energy).collect();
    let second = engine.refuel_pass(&mut NoOpObserver);

    assert!(second.refueled.is_empty());
    let after: Vec<f64> = engine.fleet().iter().map(Uav::energy).collect();
    assert_eq!(energies.len(), after.len());
    for (a, b) in energies.iter().zip(&after) {
        assert!((a - b).abs() < f64::EPSILON);
    }
}

#[test]
fn policy_does_not_matter_when_nothing_depletes() {
    let assignments = |policy| {
        let mut config = SchedulerConfig::new(10.0, Position::ORIGIN);
        config.depletion_policy = policy;
        let mut engine = random_world(11, config);
        let summary = engine.allocate(&mut NoOpObserver).unwrap();
        summary
            .outcomes
            .into_iter()
            .map(|o| o.assigned)
            .collect::<Vec<_>>()
    };
    assert_eq!(
        assignments(DepletionPolicy::Clamp),
        assignments(DepletionPolicy::Reject)
    );
}

#[test]
fn policies_diverge_for_a_stranded_uav() {
    let run = |policy| {
        let mut config = SchedulerConfig::new(40.0, Position::ORIGIN);
        config.depletion_policy = policy;
        let mut engine = engine_with(config);
        engine
            .add_uav(uav_at(1, 30.0, Position::new(40.0, 0.0)))
            .unwrap();
        let summary = engine.allocate(&mut NoOpObserver).unwrap();
        let refuel = engine.refuel_pass(&mut NoOpObserver);
        assert!(verify_events(engine.events(), engine.fleet()).is_clean());
        (summary, refuel, engine)
    };

    let (summary, refuel, engine) = run(DepletionPolicy::Clamp);
    assert!(summary.outcomes[0].aborted.is_none());
    assert_eq!(refuel.refueled, vec![UavId::new(1)]);
    assert_eq!(engine.uav(UavId::new(1)).unwrap().position(), Position::ORIGIN);

    let (summary, refuel, engine) = run(DepletionPolicy::Reject);
    assert!(summary.outcomes[0].aborted.is_some());
    assert_eq!(refuel.stranded.len(), 1);
    assert!((engine.uav(UavId::new(1)).unwrap().energy() - 30.0).abs() < f64::EPSILON);
}

#[test]
fn safety_margin_keeps_uavs_closer_to_home() {
    let run = |margin| {
        let mut config = SchedulerConfig::new(5.0, Position::ORIGIN);
        config.safety_margin_pct = margin;
        let mut engine = engine_with(config);
        engine.add_uav(uav_at(1, 100.0, Position::ORIGIN)).unwrap();
        engine.add_task(task(1, 48.0, 0.0)).unwrap();
        engine.allocate(&mut NoOpObserver).unwrap().tasks_assigned
    };
    assert_eq!(run(0.0), 1);
    assert_eq!(run(5.0), 0);
}

#[test]
fn remote_station_is_used_for_every_return() {
    let station = Position::new(0.0, 30.0);
    let mut engine = engine_with(SchedulerConfig::new(10.0, Position::ORIGIN));
    engine.set_refuel_station(station).unwrap();
    engine.add_uav(uav_at(1, 100.0, station)).unwrap();
    engine.add_task(task(1, 40.0, 30.0)).unwrap();

    let summary = engine.allocate(&mut NoOpObserver).unwrap();
    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.assigned, vec![TaskId::new(1)]);
    assert_eq!(outcome.final_position, station);
    assert!((outcome.final_energy - 20.0).abs() < 1e-9);
}

#[test]
fn heavy_tasks_wait_for_a_bigger_uav() {
    let mut engine = engine_with(SchedulerConfig::new(10.0, Position::ORIGIN));
    engine.add_uav(uav_at(1, 100.0, Position::ORIGIN)).unwrap();
    engine
        .add_uav(
            Uav::new(UavSpec {
                id: UavId::new(2),
                weight_capacity: 50.0,
                energy_capacity: 100.0,
                position: Position::ORIGIN,
            })
            .unwrap(),
        )
        .unwrap();
    let mut heavy = task_spec(1, 5.0, 0.0);
    heavy.weight = 20.0;
    engine.add_task(Task::new(heavy).unwrap()).unwrap();

    let summary = engine.allocate(&mut NoOpObserver).unwrap();
    assert!(summary.outcomes[0].assigned.is_empty());
    assert_eq!(summary.outcomes[1].assigned, vec![TaskId::new(1)]);
}

#[test]
fn tasks_assigned_counter_resets_each_pass() {
    let mut engine = engine_with(SchedulerConfig::new(10.0, Position::ORIGIN));
    engine.add_uav(uav_at(1, 100.0, Position::ORIGIN)).unwrap();
    engine.add_task(task(1, 5.0, 0.0)).unwrap();
    engine.allocate(&mut NoOpObserver).unwrap();
    assert_eq!(engine.tasks_assigned(), 1);
    engine.allocate(&mut NoOpObserver).unwrap();
    assert_eq!(engine.tasks_assigned(), 0);
}

#[test]
fn event_log_serializes_to_json() {
    let mut engine = engine_with(SchedulerConfig::new(10.0, Position::ORIGIN));
    engine.add_uav(uav_at(1, 100.0, Position::ORIGIN)).unwrap();
    engine.add_task(task(1, 5.0, 0.0)).unwrap();
    engine.allocate(&mut NoOpObserver).unwrap();

    let json = serde_json::to_value(engine.events()).unwrap();
    assert_eq!(json[0]["kind"], "assigned");
    assert_eq!(json[0]["task_id"], 1);
}

#[test]
fn allocation_errors_are_displayable() {
    let err = AllocationError::CorruptedState {
        uav_id: UavId::new(3),
        source: skyfleet_fleet::FleetError::TaskAlreadyCompleted(TaskId::new(9)),
    };
    assert!(err.to_string().contains("UAV 3"));
}
