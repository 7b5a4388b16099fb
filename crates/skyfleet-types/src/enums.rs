//! Enumeration types for the Skyfleet allocator.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// UAV lifecycle
// ---------------------------------------------------------------------------

/// Where a UAV is in its per-pass allocation cycle.
///
/// A UAV starts each pass `Seeking`, alternates between `Assigned` and
/// `Seeking` while it has energy and feasible work, then goes `Returning`
/// and finally `Docked`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum UavPhase {
    /// Looking for the next task.
    #[default]
    Seeking,
    /// Flying to and completing a task.
    Assigned,
    /// Flying back to the refuel station.
    Returning,
    /// Done for this pass.
    Docked,
}

impl UavPhase {
    /// Whether `next` is a legal successor of `self`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Seeking, Self::Assigned | Self::Returning)
                | (Self::Assigned, Self::Seeking)
                | (Self::Returning, Self::Docked)
                | (Self::Docked, Self::Seeking)
        )
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Which priority formula ranks tasks during a pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum PriorityFormula {
    /// `value * 1/(deadline + 1) / (distance + 1)`.
    #[default]
    ValueUrgencyDistance,
    /// `value / (distance + 1)`, without the deadline urgency factor.
    ValueDistance,
}

// ---------------------------------------------------------------------------
// Energy accounting
// ---------------------------------------------------------------------------

/// What happens when an energy debit exceeds the UAV's remaining energy.
///
/// One policy applies to every debit of an engine: task legs, return legs
/// and the refuel pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DepletionPolicy {
    /// Set energy to zero, log a warning and carry on.
    #[default]
    Clamp,
    /// Fail the debit and leave the UAV untouched.
    Reject,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Kind of entry in the allocation event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A UAV flew to a task and completed it.
    Assigned,
    /// A UAV flew back to the refuel station.
    Returned,
    /// A UAV was refuelled to capacity.
    Refueled,
    /// A debit exceeded the UAV's remaining energy.
    Depleted,
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Assigned => "ASSIGN",
            Self::Returned => "RETURN",
            Self::Refueled => "REFUEL",
            Self::Depleted => "DEPLETED",
        };
        f.write_str(label)
    }
}
