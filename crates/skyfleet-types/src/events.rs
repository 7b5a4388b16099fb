//! Allocation event records.
//!
//! The engine appends one [`AllocationEvent`] per observable transition
//! (assignment, return leg, refuel, depletion). The log is the engine's
//! reporting surface: display, persistence and auditing all consume it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EventKind;
use crate::ids::{EventId, RunId, TaskId, UavId};

/// A single entry in the allocation event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AllocationEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// The pass that produced this event.
    pub run_id: RunId,
    /// Position of the event within the engine's log, starting at 0.
    pub sequence: u64,
    /// What happened.
    pub kind: EventKind,
    /// The UAV involved.
    pub uav_id: UavId,
    /// The task involved, for assignments and depletion during a task leg.
    pub task_id: Option<TaskId>,
    /// Energy requested by the transition (zero for refuels).
    pub cost: f64,
    /// Energy before the transition.
    pub energy_before: f64,
    /// Energy after the transition.
    pub remaining_energy: f64,
    /// Wall-clock time the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl core::fmt::Display for AllocationEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.task_id {
            Some(task_id) => write!(
                f,
                "{}: UAV {} -> Task {} (cost: {:.2}, remaining energy: {:.2})",
                self.kind, self.uav_id, task_id, self.cost, self.remaining_energy
            ),
            None => write!(
                f,
                "{}: UAV {} (cost: {:.2}, remaining energy: {:.2})",
                self.kind, self.uav_id, self.cost, self.remaining_energy
            ),
        }
    }
}
