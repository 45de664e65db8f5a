//! Counting of items dropped before they reached the backend.
//!
//! Counters accumulate per (category, reason) until the next client report
//! drains them. Draining removes counters one key at a time; an increment
//! racing with a drain either makes it into the drained snapshot or stays
//! behind for the next one, so nothing is counted twice or lost.

use crate::application::ports::Storage;
use crate::domain::{category::DataCategory, discard::DiscardReason};
use std::collections::HashMap;

/// Key of a discard counter.
pub type DiscardKey = (DataCategory, DiscardReason);

/// Aggregates discarded-item counts for client reports.
///
/// Generic over the storage implementation. In production, use
/// `Arc<ShardedStorage>`.
#[derive(Clone)]
pub struct DiscardTracker<S>
where
    S: Storage<DiscardKey, u64> + Clone,
{
    storage: S,
}

impl<S> DiscardTracker<S>
where
    S: Storage<DiscardKey, u64> + Clone,
{
    /// Create an empty tracker.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Add `count` drops for a (category, reason) pair.
    ///
    /// Saturates rather than overflowing. A zero count is ignored. Drops
    /// recorded under the wildcard category count as `default`.
    pub fn record_discarded(&self, category: DataCategory, reason: DiscardReason, count: u64) {
        if count == 0 {
            return;
        }

        self.storage.with_entry_mut(
            (reportable(category), reason),
            || 0,
            |total| *total = total.saturating_add(count),
        );
    }

    /// Current count for a pair without draining it.
    pub fn count(&self, category: DataCategory, reason: DiscardReason) -> u64 {
        self.storage
            .with_entry(&(reportable(category), reason), |total| *total)
            .unwrap_or(0)
    }

    /// Take every pending count, leaving the tracker empty.
    pub fn drain(&self) -> HashMap<DiscardKey, u64> {
        self.storage.drain().into_iter().collect()
    }

    /// Number of distinct (category, reason) pairs pending.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if no drops are pending.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

// The wildcard has no wire name in a client report.
fn reportable(category: DataCategory) -> DataCategory {
    if category.is_all() {
        DataCategory::Default
    } else {
        category
    }
}
