//! Write history: completed writes waiting for their verification read.
//!
//! Entries land either in an offset-ordered map or in a plain FIFO. Random
//! I/O patterns use the ordered map so that verification reads sweep the
//! object in ascending offset order; sequential patterns are already ordered
//! and use the FIFO. [`WriteHistory::next`] drains the ordered map first.
//!
//! Every recorded entry is returned by exactly one call to `next`. Nothing is
//! shared between workers, so there is no locking here.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::HistoryEntry;

/// Which structure [`WriteHistory::record`] inserts into.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    /// Offset-ascending extraction.
    Ordered,
    /// Completion-order extraction.
    #[default]
    Sequential,
}

/// Per-worker tracker of pending writes.
#[derive(Debug, Clone, Default)]
pub struct WriteHistory {
    mode: HistoryMode,
    /// Keyed by (offset, insertion sequence) so overwrites of one offset are
    /// all kept.
    ordered: BTreeMap<(u64, u64), HistoryEntry>,
    sequential: VecDeque<HistoryEntry>,
    next_seq: u64,
}

impl WriteHistory {
    /// Create an empty history.
    pub fn new(mode: HistoryMode) -> Self {
        Self {
            mode,
            ordered: BTreeMap::new(),
            sequential: VecDeque::new(),
            next_seq: 0,
        }
    }

    /// The configured insertion mode.
    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    /// Record a completed write according to the configured mode.
    pub fn record(&mut self, entry: HistoryEntry) {
        match self.mode {
            HistoryMode::Ordered => self.record_ordered(entry),
            HistoryMode::Sequential => self.record_sequential(entry),
        }
    }

    /// Record into the offset-ordered map. O(log n).
    pub fn record_ordered(&mut self, entry: HistoryEntry) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ordered.insert((entry.offset, seq), entry);
    }

    /// Record into the FIFO. O(1) amortized.
    pub fn record_sequential(&mut self, entry: HistoryEntry) {
        self.sequential.push_back(entry);
    }

    /// Take the next entry to verify.
    ///
    /// Lowest offset from the ordered map if it is non-empty, else the oldest
    /// FIFO entry, else `None`. Calling on an empty history is not an error.
    pub fn next(&mut self) -> Option<HistoryEntry> {
        if let Some((_, entry)) = self.ordered.pop_first() {
            return Some(entry);
        }
        self.sequential.pop_front()
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.ordered.len() + self.sequential.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty() && self.sequential.is_empty()
    }

    /// Drop every pending entry, returning how many were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.len();
        self.ordered.clear();
        self.sequential.clear();
        dropped
    }
}
