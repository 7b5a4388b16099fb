//! The allocation engine: greedy per-UAV task assignment and refuelling.
//!
//! An allocation pass processes UAVs one at a time, in fleet order, each to
//! completion before the next starts:
//!
//! 1. **Seeking** -- rank every open task the UAV can carry and take the
//!    best (ties go to the earliest task).
//! 2. **Assigned** -- if the UAV can reach the task and still make it back
//!    to the station, fly there, complete the task and go back to 1.
//!    Otherwise, or when nothing is left, stop seeking.
//! 3. **Returning** -- fly back to the station if not already there.
//! 4. **Docked** -- done for this pass. Docking does not refuel.
//!
//! Seeking only continues while energy is strictly above the refuel
//! threshold. Every successful assignment completes one task, so a pass
//! performs at most as many assignments as there are open tasks.
//!
//! A separate [`AllocationEngine::refuel_pass`] runs afterwards and
//! refuels every UAV below the threshold.
//!
//! Every debit follows the configured [`DepletionPolicy`]. Every
//! observable transition is appended to the event log and handed to the
//! caller's [`AllocationObserver`].
//!
//! [`DepletionPolicy`]: skyfleet_types::DepletionPolicy

use std::collections::BTreeMap;

use chrono::Utc;
use skyfleet_fleet::{
    EnergyDebit, ErrorKind, Fleet, FleetError, Task, TaskRegistry, Uav, checked_distance,
};
use skyfleet_types::{
    AllocationEvent, EventId, EventKind, Position, RunId, TaskId, UavId, UavPhase,
};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, SchedulerConfig};
use crate::feasibility::{self, FeasibilityResult};
use crate::priority;

/// Errors that abort a whole pass.
///
/// Failures local to one UAV do not surface here; they are reported in
/// [`UavOutcome::aborted`] and the pass moves on to the next UAV.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    /// Shared task state is inconsistent. The pass was aborted.
    #[error("corrupted state while allocating for UAV {uav_id}: {source}")]
    CorruptedState {
        /// The UAV being processed when the corruption surfaced.
        uav_id: UavId,
        /// The underlying invariant violation.
        source: FleetError,
    },
}

/// Receives every event as the engine records it.
pub trait AllocationObserver {
    /// Called once per appended event, in log order.
    fn on_event(&mut self, event: &AllocationEvent);
}

/// An observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl AllocationObserver for NoOpObserver {
    fn on_event(&mut self, _event: &AllocationEvent) {}
}

/// Collects a copy of every event it sees.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    /// Events in the order they were observed.
    pub events: Vec<AllocationEvent>,
}

impl AllocationObserver for RecordingObserver {
    fn on_event(&mut self, event: &AllocationEvent) {
        self.events.push(event.clone());
    }
}

/// What happened to one UAV during an allocation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct UavOutcome {
    /// The UAV.
    pub uav_id: UavId,
    /// Tasks completed, in order.
    pub assigned: Vec<TaskId>,
    /// Energy after docking.
    pub final_energy: f64,
    /// Position after docking.
    pub final_position: Position,
    /// The failure that cut the UAV's pass short, if any.
    pub aborted: Option<FleetError>,
}

/// Summary of an allocation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSummary {
    /// Identifier of the pass; tags every event it produced.
    pub run_id: RunId,
    /// Number of tasks assigned during the pass.
    pub tasks_assigned: u64,
    /// Per-UAV results in fleet order.
    pub outcomes: Vec<UavOutcome>,
}

/// Summary of a refuel pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RefuelSummary {
    /// Identifier of the pass.
    pub run_id: RunId,
    /// UAVs that were refuelled.
    pub refueled: Vec<UavId>,
    /// UAVs that needed fuel but could not get back to the station.
    pub stranded: Vec<(UavId, FleetError)>,
}

/// Owns the fleet, the task registry and the event log, and runs the
/// allocation and refuel passes over them.
///
/// Callers only ever get shared references to tasks and UAVs; every
/// mutation goes through the engine.
#[derive(Debug)]
pub struct AllocationEngine {
    config: SchedulerConfig,
    fleet: Fleet,
    tasks: TaskRegistry,
    phases: BTreeMap<UavId, UavPhase>,
    events: Vec<AllocationEvent>,
    tasks_assigned: u64,
}

impl AllocationEngine {
    /// Create an engine with an empty fleet and task registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            fleet: Fleet::new(),
            tasks: TaskRegistry::new(),
            phases: BTreeMap::new(),
            events: Vec::new(),
            tasks_assigned: 0,
        })
    }

    /// The active configuration.
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The refuel station.
    pub const fn station(&self) -> Position {
        self.config.station
    }

    /// Move the refuel station. Takes effect from the next pass.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for non-finite coordinates; the
    /// station is left unchanged.
    pub fn set_refuel_station(&mut self, station: Position) -> Result<(), ConfigError> {
        let mut next = self.config.clone();
        next.station = station;
        next.validate()?;
        self.config = next;
        info!(%station, "Refuel station moved");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Registry management
    // -----------------------------------------------------------------------

    /// Add a UAV to the end of the fleet.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::DuplicateId`] if the ID is taken.
    pub fn add_uav(&mut self, uav: Uav) -> Result<(), FleetError> {
        let id = uav.id();
        self.fleet.insert(uav)?;
        self.phases.insert(id, UavPhase::Seeking);
        Ok(())
    }

    /// Remove a UAV from the fleet, returning it.
    pub fn remove_uav(&mut self, id: UavId) -> Option<Uav> {
        self.phases.remove(&id);
        self.fleet.remove(id)
    }

    /// Remove every UAV.
    pub fn clear_uavs(&mut self) {
        self.fleet.clear();
        self.phases.clear();
    }

    /// Add a task to the end of the registry.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::DuplicateId`] if the ID is taken.
    pub fn add_task(&mut self, task: Task) -> Result<(), FleetError> {
        self.tasks.insert(task)
    }

    /// Remove a task from the registry, returning it.
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.remove(id)
    }

    /// Remove every task.
    pub fn clear_tasks(&mut self) {
        self.tasks.clear();
    }

    /// The fleet, in processing order.
    pub const fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// The task registry, in tie-break order.
    pub const fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Look up a UAV.
    pub fn uav(&self, id: UavId) -> Option<&Uav> {
        self.fleet.get(id)
    }

    /// Look up a task.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Last recorded phase of a UAV.
    pub fn phase(&self, id: UavId) -> Option<UavPhase> {
        self.phases.get(&id).copied()
    }

    /// Every event recorded so far, oldest first.
    pub fn events(&self) -> &[AllocationEvent] {
        &self.events
    }

    /// Events produced by one pass.
    pub fn events_for(&self, run_id: RunId) -> impl Iterator<Item = &AllocationEvent> {
        self.events.iter().filter(move |e| e.run_id == run_id)
    }

    /// Tasks assigned by the most recent allocation pass.
    pub const fn tasks_assigned(&self) -> u64 {
        self.tasks_assigned
    }

    /// Number of tasks not yet completed.
    pub fn open_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_completed()).count()
    }

    // -----------------------------------------------------------------------
    // Passes
    // -----------------------------------------------------------------------

    /// Run one allocation pass over the whole fleet.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::CorruptedState`] if a task turns out to
    /// be completed twice. Every other failure only ends the affected
    /// UAV's pass and is reported in its [`UavOutcome`].
    pub fn allocate(
        &mut self,
        observer: &mut dyn AllocationObserver,
    ) -> Result<AllocationSummary, AllocationError> {
        let run_id = RunId::new();
        self.tasks_assigned = 0;
        info!(
            %run_id,
            uavs = self.fleet.len(),
            open_tasks = self.open_tasks(),
            formula = ?self.config.priority_formula,
            policy = ?self.config.depletion_policy,
            "Allocation pass started"
        );

        let mut pass = Pass {
            run_id,
            config: &self.config,
            tasks: &mut self.tasks,
            phases: &mut self.phases,
            events: &mut self.events,
            observer,
            assigned: 0,
        };

        let mut outcomes = Vec::with_capacity(self.fleet.len());
        for uav in self.fleet.iter_mut() {
            outcomes.push(pass.run_uav(uav)?);
        }

        let tasks_assigned = pass.assigned;
        self.tasks_assigned = tasks_assigned;
        info!(%run_id, tasks_assigned, "Task allocation complete");

        Ok(AllocationSummary {
            run_id,
            tasks_assigned,
            outcomes,
        })
    }

    /// Refuel every UAV whose energy is below the threshold.
    ///
    /// A UAV away from the station flies back first; that leg is debited
    /// under the configured policy and may drain the UAV further. Under
    /// `Reject` a UAV that cannot make it back is reported as stranded and
    /// not refuelled.
    pub fn refuel_pass(&mut self, observer: &mut dyn AllocationObserver) -> RefuelSummary {
        let run_id = RunId::new();
        let threshold = self.config.refuel_threshold;
        let mut pass = Pass {
            run_id,
            config: &self.config,
            tasks: &mut self.tasks,
            phases: &mut self.phases,
            events: &mut self.events,
            observer,
            assigned: 0,
        };

        let mut refueled = Vec::new();
        let mut stranded = Vec::new();
        for uav in self.fleet.iter_mut() {
            if !uav.needs_refuel(threshold) {
                continue;
            }
            let uav_id = uav.id();
            info!(uav_id = %uav_id, energy = uav.energy(), threshold, "UAV needs refuel");

            if let Err(err) = pass.return_to_base(uav) {
                warn!(uav_id = %uav_id, %err, "UAV stranded away from the station");
                stranded.push((uav_id, err));
                continue;
            }

            let energy_before = uav.energy();
            let restored = uav.refuel();
            pass.record(EventKind::Refueled, uav_id, None, 0.0, energy_before, uav.energy());
            info!(uav_id = %uav_id, restored, capacity = uav.energy_capacity(), "UAV refueled");
            refueled.push(uav_id);
        }

        RefuelSummary {
            run_id,
            refueled,
            stranded,
        }
    }
}

/// Borrowed engine state for the duration of one pass.
///
/// Split from [`AllocationEngine`] so the fleet can be iterated mutably
/// while tasks and the log are mutated alongside it.
struct Pass<'a> {
    run_id: RunId,
    config: &'a SchedulerConfig,
    tasks: &'a mut TaskRegistry,
    phases: &'a mut BTreeMap<UavId, UavPhase>,
    events: &'a mut Vec<AllocationEvent>,
    observer: &'a mut dyn AllocationObserver,
    assigned: u64,
}

impl Pass<'_> {
    /// Drive one UAV from `Seeking` to `Docked`.
    fn run_uav(&mut self, uav: &mut Uav) -> Result<UavOutcome, AllocationError> {
        let uav_id = uav.id();
        let threshold = self.config.refuel_threshold;
        let mut assigned = Vec::new();
        let mut aborted = None;

        self.set_phase(uav_id, UavPhase::Seeking);
        while uav.energy() > threshold {
            match self.step(uav) {
                Ok(Some(task_id)) => assigned.push(task_id),
                Ok(None) => break,
                Err(err @ FleetError::TaskAlreadyCompleted(_)) => {
                    return Err(AllocationError::CorruptedState {
                        uav_id,
                        source: err,
                    });
                }
                Err(err) => {
                    warn!(uav_id = %uav_id, %err, kind = ?err.kind(), "Allocation step aborted");
                    aborted = Some(err);
                    break;
                }
            }
        }

        self.set_phase(uav_id, UavPhase::Returning);
        if let Err(err) = self.return_to_base(uav) {
            warn!(uav_id = %uav_id, %err, "Return to base aborted");
            if aborted.is_none() {
                aborted = Some(err);
            }
        }
        self.set_phase(uav_id, UavPhase::Docked);

        debug!(
            uav_id = %uav_id,
            tasks = assigned.len(),
            energy = uav.energy(),
            "UAV docked"
        );

        Ok(UavOutcome {
            uav_id,
            assigned,
            final_energy: uav.energy(),
            final_position: uav.position(),
            aborted,
        })
    }

    /// One seek/assign round. `Ok(None)` means the UAV should stop seeking.
    fn step(&mut self, uav: &mut Uav) -> Result<Option<TaskId>, FleetError> {
        let config = self.config;
        let Some(candidate) = priority::select_best(
            uav,
            self.tasks.as_slice(),
            config.current_time,
            config.priority_formula,
        )?
        else {
            debug!(uav_id = %uav.id(), "No open task left for UAV");
            return Ok(None);
        };

        let Some(task) = self.tasks.get(candidate.task_id) else {
            return Ok(None);
        };

        let reach =
            match feasibility::evaluate(uav, task, &config.station, config.safety_margin_pct)? {
                FeasibilityResult::Feasible(reach) => reach,
                FeasibilityResult::Infeasible(reason) => {
                    debug!(
                        uav_id = %uav.id(),
                        task_id = %candidate.task_id,
                        ?reason,
                        "Best task infeasible"
                    );
                    return Ok(None);
                }
            };

        let target = task.position();
        uav.begin_carry(task)?;
        let debit = self.fly_task(uav, candidate.task_id, target, reach.outbound)?;
        self.set_phase(uav.id(), UavPhase::Assigned);
        self.assigned = self.assigned.saturating_add(1);
        info!(
            uav_id = %uav.id(),
            task_id = %candidate.task_id,
            score = candidate.score,
            cost = debit.cost,
            remaining_energy = debit.remaining,
            "Task assigned"
        );
        self.set_phase(uav.id(), UavPhase::Seeking);

        Ok(Some(candidate.task_id))
    }

    /// Fly a UAV that has picked up `task_id` to `target`, complete the
    /// task and drop it off.
    ///
    /// The leg is logged as soon as energy is debited, so a failure while
    /// landing still leaves a log that matches the UAV's energy. A refused
    /// debit leaves the UAV unchanged.
    fn fly_task(
        &mut self,
        uav: &mut Uav,
        task_id: TaskId,
        target: Position,
        cost: f64,
    ) -> Result<EnergyDebit, FleetError> {
        let debit = match uav.debit_energy(cost, self.config.depletion_policy) {
            Ok(debit) => debit,
            Err(err) => {
                uav.finish_carry();
                self.record_failed_debit(uav, Some(task_id), cost, &err);
                return Err(err);
            }
        };
        if debit.depleted {
            self.record_debit(EventKind::Depleted, uav.id(), Some(task_id), &debit);
        }
        self.record_debit(EventKind::Assigned, uav.id(), Some(task_id), &debit);

        let landed = uav
            .move_to(target)
            .and_then(|()| self.tasks.get_mut(task_id).map_or(Ok(()), Task::mark_completed));
        uav.finish_carry();
        landed.map(|()| debit)
    }

    /// Fly `uav` back to the station if it is elsewhere.
    fn return_to_base(&mut self, uav: &mut Uav) -> Result<Option<EnergyDebit>, FleetError> {
        let station = self.config.station;
        if uav.is_at(&station) {
            return Ok(None);
        }

        let uav_id = uav.id();
        let cost = checked_distance(&uav.position(), &station, "return to base")?;
        let debit = match uav.debit_energy(cost, self.config.depletion_policy) {
            Ok(debit) => debit,
            Err(err) => {
                self.record_failed_debit(uav, None, cost, &err);
                return Err(err);
            }
        };
        if debit.depleted {
            self.record_debit(EventKind::Depleted, uav_id, None, &debit);
        }
        self.record_debit(EventKind::Returned, uav_id, None, &debit);
        uav.move_to(station)?;
        info!(
            uav_id = %uav_id,
            cost = debit.cost,
            remaining_energy = debit.remaining,
            "UAV returned to base"
        );
        Ok(Some(debit))
    }

    fn set_phase(&mut self, uav_id: UavId, next: UavPhase) {
        let previous = self.phases.insert(uav_id, next);
        if let Some(previous) = previous
            && previous != next
            && !previous.can_transition_to(next)
        {
            warn!(uav_id = %uav_id, ?previous, ?next, "Unexpected phase transition");
        }
        debug!(uav_id = %uav_id, ?previous, ?next, "Phase transition");
    }

    /// Log a debit refused under `Reject`. Energy is unchanged.
    fn record_failed_debit(
        &mut self,
        uav: &Uav,
        task_id: Option<TaskId>,
        cost: f64,
        err: &FleetError,
    ) {
        if err.kind() == ErrorKind::Depletion {
            let energy = uav.energy();
            self.record(EventKind::Depleted, uav.id(), task_id, cost, energy, energy);
        }
    }

    fn record_debit(
        &mut self,
        kind: EventKind,
        uav_id: UavId,
        task_id: Option<TaskId>,
        debit: &EnergyDebit,
    ) {
        self.record(
            kind,
            uav_id,
            task_id,
            debit.cost,
            debit.energy_before,
            debit.remaining,
        );
    }

    fn record(
        &mut self,
        kind: EventKind,
        uav_id: UavId,
        task_id: Option<TaskId>,
        cost: f64,
        energy_before: f64,
        remaining_energy: f64,
    ) {
        let event = AllocationEvent {
            id: EventId::new(),
            run_id: self.run_id,
            sequence: u64::try_from(self.events.len()).unwrap_or(u64::MAX),
            kind,
            uav_id,
            task_id,
            cost,
            energy_before,
            remaining_energy,
            recorded_at: Utc::now(),
        };
        self.observer.on_event(&event);
        self.events.push(event);
    }
}
