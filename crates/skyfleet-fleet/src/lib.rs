//! Task and UAV state for the Skyfleet allocator.
//!
//! This crate contains the logic layer for the two leaf entities: every
//! state transition on a task or a UAV lives here, without any knowledge
//! of how tasks are ranked or scheduled. It sits between `skyfleet-types`
//! (identifiers and records) and `skyfleet-core` (the allocation engine).
//!
//! # Modules
//!
//! - [`error`] -- Error types for all entity operations ([`FleetError`])
//! - [`geometry`] -- Validated distance computation
//! - [`registry`] -- Ordered, ID-unique [`Registry`] for tasks and UAVs
//! - [`task`] -- [`Task`] value decay and completion
//! - [`uav`] -- [`Uav`] energy, refuel, movement and payload handling

pub mod error;
pub mod geometry;
pub mod registry;
pub mod task;
pub mod uav;

// Re-export primary types at crate root for convenience.
pub use error::{ErrorKind, FleetError};
pub use geometry::checked_distance;
pub use registry::{Fleet, Keyed, Registry, TaskRegistry};
pub use task::{Task, TaskSpec};
pub use uav::{EnergyDebit, Uav, UavSpec};
