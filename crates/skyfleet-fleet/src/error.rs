//! Error types for the skyfleet-fleet crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! Every variant belongs to one [`ErrorKind`] so that callers can decide
//! whether to skip a step, abort a UAV or abort the whole pass.

use skyfleet_types::{TaskId, UavId};

/// Coarse classification of a [`FleetError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad entity parameters, rejected before anything enters the engine.
    Configuration,
    /// Bad arguments to a single call. Nothing was mutated.
    InvalidInput,
    /// A debit asked for more energy than the UAV has left.
    Depletion,
    /// An operation would break an entity invariant. Indicates a bug.
    InvariantViolation,
}

/// Errors that can occur during task and UAV state operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FleetError {
    /// An entity ID was zero.
    #[error("{entity} ID must be positive, got {id}")]
    InvalidId {
        /// Entity type (`task` or `uav`).
        entity: &'static str,
        /// The rejected raw ID.
        id: u64,
    },

    /// A numeric construction parameter was out of range.
    #[error("invalid {field}: {value} ({reason})")]
    InvalidParameter {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
        /// The constraint that was violated.
        reason: &'static str,
    },

    /// A coordinate was NaN or infinite.
    #[error("non-finite position in {context}")]
    NonFinitePosition {
        /// What was being computed.
        context: String,
    },

    /// An energy cost was negative or not finite.
    #[error("energy cost must be a finite non-negative number, got {cost}")]
    InvalidEnergyCost {
        /// The rejected cost.
        cost: f64,
    },

    /// A payload weight was negative or not finite.
    #[error("weight must be a finite non-negative number, got {weight}")]
    InvalidWeight {
        /// The rejected weight.
        weight: f64,
    },

    /// A time argument was negative or not finite.
    #[error("time must be a finite non-negative number, got {time}")]
    InvalidTime {
        /// The rejected time.
        time: f64,
    },

    /// A debit exceeded the UAV's remaining energy under the reject policy.
    #[error("UAV {uav_id} energy depleted: needs {required}, has {available}")]
    EnergyDepleted {
        /// The UAV whose debit failed.
        uav_id: UavId,
        /// Energy the debit asked for.
        required: f64,
        /// Energy the UAV had.
        available: f64,
    },

    /// A UAV was asked to carry a second task.
    #[error("UAV {uav_id} already carries task {carried}")]
    AlreadyCarrying {
        /// The UAV.
        uav_id: UavId,
        /// The task it is already carrying.
        carried: TaskId,
    },

    /// A task was completed twice.
    #[error("task {0} is already completed")]
    TaskAlreadyCompleted(TaskId),

    /// A registry already holds an entity with this ID.
    #[error("duplicate {entity} ID: {id}")]
    DuplicateId {
        /// Entity type (`task` or `uav`).
        entity: &'static str,
        /// The duplicated ID.
        id: String,
    },
}

impl FleetError {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId { .. } | Self::InvalidParameter { .. } | Self::DuplicateId { .. } => {
                ErrorKind::Configuration
            }
            Self::NonFinitePosition { .. }
            | Self::InvalidEnergyCost { .. }
            | Self::InvalidWeight { .. }
            | Self::InvalidTime { .. } => ErrorKind::InvalidInput,
            Self::EnergyDepleted { .. } => ErrorKind::Depletion,
            Self::AlreadyCarrying { .. } | Self::TaskAlreadyCompleted(_) => {
                ErrorKind::InvariantViolation
            }
        }
    }
}
