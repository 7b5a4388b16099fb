//! Type-safe identifier wrappers.
//!
//! Tasks and UAVs carry caller-assigned positive integer IDs, unique within
//! one registry. Records produced by the engine itself (events, allocation
//! runs) use UUID v7 (time-ordered) so that logs from several runs can be
//! merged and sorted.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around a caller-assigned `u64`.
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the raw identifier.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Identifiers must be strictly positive.
            pub const fn is_valid(self) -> bool {
                self.0 > 0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_numeric_id! {
    /// Identifier of a task, unique within one task registry.
    TaskId
}

define_numeric_id! {
    /// Identifier of a UAV, unique within one fleet.
    UavId
}

define_uuid_id! {
    /// Unique identifier for an entry in the allocation event log.
    EventId
}

define_uuid_id! {
    /// Unique identifier for one allocation or refuel pass.
    RunId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_valid_numeric_id() {
        assert!(!TaskId::new(0).is_valid());
        assert!(UavId::new(7).is_valid());
    }

    #[test]
    fn numeric_ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&TaskId::new(12));
        assert_eq!(json.ok().as_deref(), Some("12"));
    }

    #[test]
    fn run_ids_are_unique() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn display_uses_raw_value() {
        assert_eq!(UavId::new(3).to_string(), "3");
    }
}
