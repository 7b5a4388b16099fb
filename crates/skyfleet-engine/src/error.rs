//! Error types for the Skyfleet driver binary.
//!
//! [`EngineError`] wraps every failure mode between startup and the final
//! report so that `main` can propagate with `?`.

/// Top-level error for the driver binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: skyfleet_core::ConfigError,
    },

    /// A scenario entry was rejected by the fleet or task registry.
    #[error("fleet error: {source}")]
    Fleet {
        /// The underlying fleet error.
        #[from]
        source: skyfleet_fleet::FleetError,
    },

    /// The allocation pass aborted.
    #[error("allocation error: {source}")]
    Allocation {
        /// The underlying allocation error.
        #[from]
        source: skyfleet_core::AllocationError,
    },

    /// The scenario file could not be read or parsed.
    #[error("scenario error: {message}")]
    Scenario {
        /// Description of the scenario failure.
        message: String,
    },

    /// The event log failed its consistency audit.
    #[error("event log audit found {violations} violation(s)")]
    Audit {
        /// Number of violations.
        violations: usize,
    },
}
