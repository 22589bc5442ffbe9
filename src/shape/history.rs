//! Bounded snapshot stack backing single-step undo.

use std::collections::VecDeque;

/// Default number of snapshots kept per shape.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// A stack of prior states with a fixed capacity.
///
/// When full, pushing drops the oldest snapshot. A capacity of zero disables
/// history entirely.
#[derive(Clone, Debug)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    /// Creates an empty history holding at most `capacity` snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_DEPTH)),
            capacity,
        }
    }

    /// Pushes a snapshot, evicting the oldest one when at capacity.
    pub fn push(&mut self, snapshot: T) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Removes and returns the most recent snapshot.
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    /// Number of snapshots currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changes the capacity, dropping the oldest snapshots if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}
