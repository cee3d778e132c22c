//! Atomically replaceable shared snapshot.
//!
//! Readers take a cheap [`Arc`] clone of the current value and work on it
//! without holding any lock; a refresh builds a complete new value and
//! swaps it in. Nothing is ever mutated in place.

use std::sync::{Arc, PoisonError, RwLock};

/// Holds the current version of an immutable, shared value.
#[derive(Debug, Default)]
pub struct Snapshot<T> {
    current: RwLock<Arc<T>>,
}

impl<T> Snapshot<T> {
    /// Creates a snapshot holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
        }
    }

    /// Returns the current version.
    ///
    /// The returned handle stays valid (and unchanged) even if the
    /// snapshot is replaced afterwards.
    #[must_use]
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the current version, returning the previous one.
    pub fn replace(&self, value: T) -> Arc<T> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(value))
    }
}
