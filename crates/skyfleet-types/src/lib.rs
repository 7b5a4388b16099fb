//! Shared type definitions for the Skyfleet UAV task allocator.
//!
//! This crate is the single source of truth for the identifiers, geometry,
//! configuration enums and event records used across the workspace. Event
//! types are exported to `TypeScript` via `ts-rs` for external reporting.
//!
//! # Modules
//!
//! - [`ids`] -- Numeric task/UAV IDs and UUID event/run IDs
//! - [`geometry`] -- [`Position`] and Euclidean distance
//! - [`enums`] -- UAV phase, priority formula, depletion policy, event kind
//! - [`events`] -- [`AllocationEvent`] log records

pub mod enums;
pub mod events;
pub mod geometry;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{DepletionPolicy, EventKind, PriorityFormula, UavPhase};
pub use events::AllocationEvent;
pub use geometry::Position;
pub use ids::{EventId, RunId, TaskId, UavId};
