//! Observability metrics for the outbound gate.
//!
//! Counts what the gate let through, what it dropped and how many client
//! reports it produced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking gate statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Items passed through the gate
    items_sent: AtomicU64,
    /// Items dropped because of an active rate limit
    items_dropped: AtomicU64,
    /// Client reports produced
    reports_emitted: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                items_sent: AtomicU64::new(0),
                items_dropped: AtomicU64::new(0),
                reports_emitted: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_sent(&self) {
        self.inner.items_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.inner.items_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_report(&self) {
        self.inner.reports_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of items sent.
    pub fn items_sent(&self) -> u64 {
        self.inner.items_sent.load(Ordering::Relaxed)
    }

    /// Get the total number of items dropped by rate limits.
    pub fn items_dropped(&self) -> u64 {
        self.inner.items_dropped.load(Ordering::Relaxed)
    }

    /// Get the total number of client reports produced.
    pub fn reports_emitted(&self) -> u64 {
        self.inner.reports_emitted.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_sent: self.items_sent(),
            items_dropped: self.items_dropped(),
            reports_emitted: self.reports_emitted(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.items_sent.store(0, Ordering::Relaxed);
        self.inner.items_dropped.store(0, Ordering::Relaxed);
        self.inner.reports_emitted.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Items passed through the gate
    pub items_sent: u64,
    /// Items dropped because of an active rate limit
    pub items_dropped: u64,
    /// Client reports produced
    pub reports_emitted: u64,
}

impl MetricsSnapshot {
    /// Fraction of gated items that were dropped (0.0 to 1.0).
    ///
    /// Returns 0.0 if no items have been gated.
    pub fn drop_rate(&self) -> f64 {
        let total = self.total_items();
        if total == 0 {
            0.0
        } else {
            self.items_dropped as f64 / total as f64
        }
    }

    /// Get the total number of items gated (sent + dropped).
    pub fn total_items(&self) -> u64 {
        self.items_sent.saturating_add(self.items_dropped)
    }
}
