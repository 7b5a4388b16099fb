//! Ordered, ID-unique collections of tasks and UAVs.
//!
//! Insertion order is preserved: it is the tie-break order the engine uses
//! when two tasks score the same, and the order in which UAVs are
//! processed.

use std::collections::BTreeSet;

use crate::error::FleetError;
use crate::task::Task;
use crate::uav::Uav;

/// An entity with a stable identifier.
pub trait Keyed {
    /// The identifier type.
    type Id: Copy + Ord + core::fmt::Debug + core::fmt::Display;

    /// Human-readable entity name used in errors.
    const ENTITY: &'static str;

    /// This entity's identifier.
    fn key(&self) -> Self::Id;
}

/// An insertion-ordered collection with unique keys.
#[derive(Debug, Clone)]
pub struct Registry<T: Keyed> {
    entries: Vec<T>,
    keys: BTreeSet<T::Id>,
}

/// The task registry.
pub type TaskRegistry = Registry<Task>;

/// The UAV fleet.
pub type Fleet = Registry<Uav>;

impl<T: Keyed> Registry<T> {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            keys: BTreeSet::new(),
        }
    }

    /// Append `item`.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::DuplicateId`] if the key is already present.
    pub fn insert(&mut self, item: T) -> Result<(), FleetError> {
        let key = item.key();
        if !self.keys.insert(key) {
            return Err(FleetError::DuplicateId {
                entity: T::ENTITY,
                id: key.to_string(),
            });
        }
        self.entries.push(item);
        Ok(())
    }

    /// Remove and return the entry with `key`, keeping the order of the rest.
    pub fn remove(&mut self, key: T::Id) -> Option<T> {
        let index = self.index_of(key)?;
        self.keys.remove(&key);
        Some(self.entries.remove(index))
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
    }

    /// Look up an entry by key.
    pub fn get(&self, key: T::Id) -> Option<&T> {
        self.entries.iter().find(|e| e.key() == key)
    }

    /// Look up an entry by key for mutation.
    pub fn get_mut(&mut self, key: T::Id) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| e.key() == key)
    }

    /// Position of `key` in insertion order.
    pub fn index_of(&self, key: T::Id) -> Option<usize> {
        self.entries.iter().position(|e| e.key() == key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: T::Id) -> bool {
        self.keys.contains(&key)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Iterate mutably in insertion order.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.entries.iter_mut()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<T::Id> {
        self.entries.iter().map(Keyed::key).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as a slice, in insertion order.
    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }
}

impl<T: Keyed> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Keyed> IntoIterator for &'a Registry<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
