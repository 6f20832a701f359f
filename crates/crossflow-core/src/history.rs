//! Bounded window of recent snapshots for display.
//!
//! Snapshots are kept in arrival order, which is also tick order. When the
//! window is full, appending evicts from the front.

use crossflow_types::Snapshot;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// FIFO window of the most recent snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    entries: Vec<Snapshot>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` snapshots.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Append a snapshot, evicting the oldest entries beyond capacity.
    pub fn append(&mut self, snapshot: Snapshot) {
        self.entries.push(snapshot);
        if self.entries.len() > self.capacity {
            let drain_count = self.entries.len().saturating_sub(self.capacity);
            self.entries.drain(..drain_count);
        }
    }

    /// Snapshots in chronological order, oldest first.
    pub fn as_slice(&self) -> &[Snapshot] {
        &self.entries
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    /// Copy of the window, for consumers that keep it across ticks.
    pub fn to_vec(&self) -> Vec<Snapshot> {
        self.entries.clone()
    }

    /// The most recent `limit` snapshots, still oldest first.
    pub fn recent(&self, limit: usize) -> &[Snapshot] {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.get(skip..).unwrap_or_default()
    }

    /// The newest snapshot, if any.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    /// Number of snapshots held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no snapshot has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of snapshots held.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every snapshot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
