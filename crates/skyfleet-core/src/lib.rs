//! Priority model, feasibility checks and the allocation engine for the
//! Skyfleet UAV task allocator.
//!
//! This crate owns the greedy allocation pass that drives the fleet:
//! Seeking, Assigned, Returning and Docked per UAV, followed by a separate
//! refuel pass.
//!
//! # Modules
//!
//! - [`audit`] -- Consistency audit of the event log.
//! - [`config`] -- Configuration loading from `skyfleet-config.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- [`AllocationEngine`], the [`AllocationObserver`] trait
//!   and pass summaries.
//! - [`feasibility`] -- Payload and round-trip energy checks.
//! - [`priority`] -- Task scoring and best-task selection.
//!
//! [`AllocationEngine`]: engine::AllocationEngine
//! [`AllocationObserver`]: engine::AllocationObserver

pub mod audit;
pub mod config;
pub mod engine;
pub mod feasibility;
pub mod priority;

pub use audit::{AuditResult, AuditViolation, verify_events};
pub use config::{ConfigError, LogFormat, LoggingConfig, SchedulerConfig, SkyfleetConfig};
pub use engine::{
    AllocationEngine, AllocationError, AllocationObserver, AllocationSummary, NoOpObserver,
    RecordingObserver, RefuelSummary, UavOutcome,
};
pub use feasibility::{FeasibilityResult, Infeasibility, ReachAssessment};
pub use priority::{Candidate, Rank};
