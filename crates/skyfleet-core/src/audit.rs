//! Consistency audit of the allocation event log.
//!
//! Replays the log against the fleet and checks the accounting holds:
//!
//! - A task is assigned at most once over the whole log.
//! - Every flight leg debits exactly its cost, or clamps to zero when the
//!   cost exceeds what was left.
//! - Between refuels a UAV's energy never goes up, and each event starts
//!   from the energy the previous one left.
//! - A refuel fills the tank to capacity.
//! - A depletion event really did ask for more than was available.
//!
//! The engine maintains all of these by construction. The audit catches
//! log corruption and regressions.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use skyfleet_fleet::Fleet;
use skyfleet_types::{AllocationEvent, EventKind, TaskId, UavId};

/// Relative tolerance for energy comparisons.
pub const ENERGY_TOLERANCE: f64 = 1e-9;

/// A single broken accounting rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuditViolation {
    /// A task was assigned more than once.
    #[error("event {sequence}: task {task_id} assigned again (first at event {first})")]
    DuplicateAssignment {
        /// The offending event.
        sequence: u64,
        /// The task.
        task_id: TaskId,
        /// The event that first assigned it.
        first: u64,
    },

    /// An assignment event carries no task.
    #[error("event {sequence}: assignment without a task")]
    MissingTask {
        /// The offending event.
        sequence: u64,
    },

    /// A debit did not subtract exactly its cost.
    #[error(
        "event {sequence}: UAV {uav_id} expected {expected:.4} after debit, log says {actual:.4}"
    )]
    EnergyMismatch {
        /// The offending event.
        sequence: u64,
        /// The UAV.
        uav_id: UavId,
        /// Energy the debit should have left.
        expected: f64,
        /// Energy the event recorded.
        actual: f64,
    },

    /// Energy went up without a refuel.
    #[error("event {sequence}: UAV {uav_id} energy rose from {before:.4} to {after:.4}")]
    EnergyIncreased {
        /// The offending event.
        sequence: u64,
        /// The UAV.
        uav_id: UavId,
        /// Energy before.
        before: f64,
        /// Energy after.
        after: f64,
    },

    /// An event did not start from where the previous one left off.
    #[error(
        "event {sequence}: UAV {uav_id} starts at {energy_before:.4}, previous event left {previous:.4}"
    )]
    Discontinuity {
        /// The offending event.
        sequence: u64,
        /// The UAV.
        uav_id: UavId,
        /// Energy the previous event left.
        previous: f64,
        /// Energy this event started from.
        energy_before: f64,
    },

    /// A refuel did not reach capacity.
    #[error("event {sequence}: UAV {uav_id} refueled to {remaining:.4}, capacity {capacity:.4}")]
    IncompleteRefuel {
        /// The offending event.
        sequence: u64,
        /// The UAV.
        uav_id: UavId,
        /// Energy after the refuel.
        remaining: f64,
        /// The UAV's capacity.
        capacity: f64,
    },

    /// A depletion event whose cost was affordable.
    #[error("event {sequence}: UAV {uav_id} reported depleted paying {cost:.4} out of {available:.4}")]
    PhantomDepletion {
        /// The offending event.
        sequence: u64,
        /// The UAV.
        uav_id: UavId,
        /// Cost of the leg.
        cost: f64,
        /// Energy available.
        available: f64,
    },

    /// The event names a UAV that is not in the fleet.
    #[error("event {sequence}: unknown UAV {uav_id}")]
    UnknownUav {
        /// The offending event.
        sequence: u64,
        /// The UAV.
        uav_id: UavId,
    },
}

/// Outcome of an audit.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditResult {
    /// Every rule holds.
    Clean,
    /// At least one rule is broken, in log order.
    Violations(Vec<AuditViolation>),
}

impl AuditResult {
    /// Whether the log passed.
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// The violations found, empty when clean.
    pub fn violations(&self) -> &[AuditViolation] {
        match self {
            Self::Clean => &[],
            Self::Violations(v) => v,
        }
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= ENERGY_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Record the task of an assignment event, flagging repeats.
fn check_assignment(
    event: &AllocationEvent,
    assigned: &mut BTreeMap<TaskId, u64>,
) -> Option<AuditViolation> {
    let sequence = event.sequence;
    let Some(task_id) = event.task_id else {
        return Some(AuditViolation::MissingTask { sequence });
    };
    match assigned.entry(task_id) {
        Entry::Occupied(first) => Some(AuditViolation::DuplicateAssignment {
            sequence,
            task_id,
            first: *first.get(),
        }),
        Entry::Vacant(slot) => {
            slot.insert(sequence);
            None
        }
    }
}

/// Audit `events` against the UAVs in `fleet`.
pub fn verify_events(events: &[AllocationEvent], fleet: &Fleet) -> AuditResult {
    let mut violations = Vec::new();
    let mut assigned: BTreeMap<TaskId, u64> = BTreeMap::new();
    let mut last_energy: BTreeMap<UavId, f64> = BTreeMap::new();
    let mut unknown: BTreeSet<UavId> = BTreeSet::new();

    for event in events {
        let sequence = event.sequence;
        let uav_id = event.uav_id;
        let Some(uav) = fleet.get(uav_id) else {
            // Report each missing UAV once.
            if unknown.insert(uav_id) {
                violations.push(AuditViolation::UnknownUav { sequence, uav_id });
            }
            continue;
        };

        if let Some(&previous) = last_energy.get(&uav_id)
            && !approx_eq(previous, event.energy_before)
        {
            violations.push(AuditViolation::Discontinuity {
                sequence,
                uav_id,
                previous,
                energy_before: event.energy_before,
            });
        }

        match event.kind {
            EventKind::Assigned | EventKind::Returned => {
                if event.kind == EventKind::Assigned {
                    violations.extend(check_assignment(event, &mut assigned));
                }

                let expected = (event.energy_before - event.cost).max(0.0);
                if !approx_eq(expected, event.remaining_energy) {
                    violations.push(AuditViolation::EnergyMismatch {
                        sequence,
                        uav_id,
                        expected,
                        actual: event.remaining_energy,
                    });
                }
                if event.remaining_energy > event.energy_before {
                    violations.push(AuditViolation::EnergyIncreased {
                        sequence,
                        uav_id,
                        before: event.energy_before,
                        after: event.remaining_energy,
                    });
                }
                last_energy.insert(uav_id, event.remaining_energy);
            }
            EventKind::Refueled => {
                if !approx_eq(event.remaining_energy, uav.energy_capacity()) {
                    violations.push(AuditViolation::IncompleteRefuel {
                        sequence,
                        uav_id,
                        remaining: event.remaining_energy,
                        capacity: uav.energy_capacity(),
                    });
                }
                last_energy.insert(uav_id, event.remaining_energy);
            }
            EventKind::Depleted => {
                // Announces the debit that follows; does not move energy itself.
                if event.cost <= event.energy_before {
                    violations.push(AuditViolation::PhantomDepletion {
                        sequence,
                        uav_id,
                        cost: event.cost,
                        available: event.energy_before,
                    });
                }
            }
        }
    }

    if violations.is_empty() {
        AuditResult::Clean
    } else {
        AuditResult::Violations(violations)
    }
}
