//! The outbound gate: the single checkpoint every telemetry item passes on
//! its way to the backend.
//!
//! The gate owns the rate limit store and the discard tracker. It consults
//! the store per item, records a `rate_limit_backoff` drop for every item it
//! holds back, and turns pending drop counts into a client report that rides
//! along with the next envelope.

use crate::application::{
    metrics::Metrics,
    ports::Clock,
    store::RateLimitStore,
    tracker::{DiscardKey, DiscardTracker},
};
use crate::domain::{
    category::DataCategory,
    client_report::ClientReport,
    discard::DiscardReason,
    envelope::{Envelope, EnvelopeItem},
    rate_limit::{deadline_after, parse_rate_limits, parse_retry_after, RateLimitEntry},
};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::storage::ShardedStorage;

use std::sync::Arc;
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "envelope_gate::gate";

/// HTTP status the backend answers with while a rate limit is active.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Retry-after applied to a 429 response that carries no usable header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Storage backing the production rate limit store.
pub type RateLimitStorage = Arc<ShardedStorage<DataCategory, Instant>>;

/// Storage backing the production discard tracker.
pub type DiscardStorage = Arc<ShardedStorage<DiscardKey, u64>>;

/// Outcome of passing an item through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The item may be sent; it is handed back unchanged.
    Sent(EnvelopeItem),
    /// The item's category is rate limited and the item was dropped.
    Dropped,
}

impl GateDecision {
    /// Returns `true` if the item may be sent.
    pub fn is_sent(&self) -> bool {
        matches!(self, GateDecision::Sent(_))
    }

    /// Returns `true` if the item was dropped.
    pub fn is_dropped(&self) -> bool {
        matches!(self, GateDecision::Dropped)
    }

    /// The item to send, if it passed.
    pub fn into_item(self) -> Option<EnvelopeItem> {
        match self {
            GateDecision::Sent(item) => Some(item),
            GateDecision::Dropped => None,
        }
    }
}

/// Error returned when building an `OutboundGate` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The fallback retry-after must be greater than zero
    ZeroDefaultRetryAfter,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::ZeroDefaultRetryAfter => {
                write!(f, "default retry-after must be greater than 0")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// Builder for constructing an `OutboundGate`.
pub struct OutboundGateBuilder {
    clock: Option<Arc<dyn Clock>>,
    client_reports: bool,
    default_retry_after: Duration,
}

impl OutboundGateBuilder {
    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enable or disable client reports.
    ///
    /// When disabled, drops are not counted and no report is ever produced.
    /// Rate limits still apply. Enabled by default.
    pub fn with_client_reports(mut self, enabled: bool) -> Self {
        self.client_reports = enabled;
        self
    }

    /// Set the suppression applied to a 429 response without a usable
    /// `Retry-After` header. Defaults to 60 seconds.
    ///
    /// The value will be validated when `build()` is called.
    pub fn with_default_retry_after(mut self, retry_after: Duration) -> Self {
        self.default_retry_after = retry_after;
        self
    }

    /// Build the gate.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid.
    pub fn build(self) -> Result<OutboundGate, BuildError> {
        if self.default_retry_after.is_zero() {
            return Err(BuildError::ZeroDefaultRetryAfter);
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));

        Ok(OutboundGate {
            store: RateLimitStore::new(Arc::new(ShardedStorage::new()), clock.clone()),
            tracker: DiscardTracker::new(Arc::new(ShardedStorage::new())),
            clock,
            metrics: Metrics::new(),
            client_reports: self.client_reports,
            default_retry_after: self.default_retry_after,
        })
    }
}

/// Decides per item whether it may be sent, and accounts for the ones that
/// may not.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct OutboundGate {
    store: RateLimitStore<RateLimitStorage>,
    tracker: DiscardTracker<DiscardStorage>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
    client_reports: bool,
    default_retry_after: Duration,
}

impl OutboundGate {
    /// Create a gate with the default configuration.
    pub fn new() -> Self {
        Self::builder()
            .build()
            .expect("default configuration is always valid")
    }

    /// Create a builder for configuring the gate.
    pub fn builder() -> OutboundGateBuilder {
        OutboundGateBuilder {
            clock: None,
            client_reports: true,
            default_retry_after: DEFAULT_RETRY_AFTER,
        }
    }

    /// Returns `false` while items of `category` are rate limited.
    pub fn should_send(&self, category: DataCategory) -> bool {
        !self.store.is_limited(category)
    }

    /// Pass one item through the gate.
    ///
    /// A dropped item counts once toward `(category, rate_limit_backoff)` in
    /// the next client report. Client report items are never held back.
    pub fn gate(&self, item: EnvelopeItem) -> GateDecision {
        let category = item.category();

        if item.is_client_report() || self.should_send(category) {
            self.metrics.record_sent();
            return GateDecision::Sent(item);
        }

        tracing::trace!(
            target: LOG_TARGET,
            category = %category,
            item_type = item.item_type(),
            "dropping rate limited item"
        );
        self.metrics.record_dropped();
        self.record_discarded(category, DiscardReason::RateLimitBackoff, 1);
        GateDecision::Dropped
    }

    /// Gate every item of an envelope.
    ///
    /// Returns the envelope with the dropped items removed, or `None` if no
    /// item survived.
    pub fn gate_envelope(&self, envelope: Envelope) -> Option<Envelope> {
        let items: Vec<EnvelopeItem> = envelope
            .into_items()
            .into_iter()
            .filter_map(|item| self.gate(item).into_item())
            .collect();

        if items.is_empty() {
            None
        } else {
            Some(Envelope::from_items(items))
        }
    }

    /// Count items dropped somewhere else in the pipeline.
    ///
    /// A no-op when client reports are disabled.
    pub fn record_discarded(&self, category: DataCategory, reason: DiscardReason, count: u64) {
        if self.client_reports {
            self.tracker.record_discarded(category, reason, count);
        }
    }

    /// Drain pending drop counts into a client report.
    ///
    /// Returns `None` when nothing was dropped since the last report, or when
    /// client reports are disabled.
    pub fn prepare_client_report(&self) -> Option<ClientReport> {
        if !self.client_reports {
            return None;
        }

        let report = ClientReport::from_counts(self.clock.system_time(), self.tracker.drain())?;

        tracing::debug!(
            target: LOG_TARGET,
            pairs = report.discarded_events.len(),
            total = report.total_quantity(),
            "client report prepared"
        );
        self.metrics.record_report();
        Some(report)
    }

    /// Append pending drop counts to an outgoing envelope.
    ///
    /// Returns `true` if a client report item was added. If the report cannot
    /// be serialized, its counts go back to the tracker for the next attempt.
    pub fn attach_client_report(&self, envelope: &mut Envelope) -> bool {
        let report = match self.prepare_client_report() {
            Some(report) => report,
            None => return false,
        };

        match EnvelopeItem::client_report(&report) {
            Ok(item) => {
                envelope.add_item(item);
                true
            }
            Err(error) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    error = %error,
                    "failed to serialize client report, keeping counts for the next envelope"
                );
                for event in &report.discarded_events {
                    self.tracker
                        .record_discarded(event.category, event.reason, event.quantity);
                }
                false
            }
        }
    }

    /// Apply a raw `X-Sentry-Rate-Limits` directive.
    pub fn update_rate_limits(&self, directive: &str) {
        self.store
            .update(parse_rate_limits(directive, self.clock.now()));
    }

    /// Update rate limits from a backend response.
    ///
    /// An `X-Sentry-Rate-Limits` header always wins. Without it, a 429
    /// response limits every category for the `Retry-After` seconds, or for
    /// the configured default when that header is missing or unreadable.
    /// Any other response leaves the limits unchanged.
    pub fn update_from_response(
        &self,
        status: u16,
        rate_limits: Option<&str>,
        retry_after: Option<&str>,
    ) {
        if let Some(directive) = rate_limits {
            self.update_rate_limits(directive);
            return;
        }

        if status != TOO_MANY_REQUESTS {
            return;
        }

        let retry_after = retry_after
            .and_then(parse_retry_after)
            .unwrap_or(self.default_retry_after);

        let valid_until = deadline_after(self.clock.now(), retry_after);
        self.store
            .update([RateLimitEntry::new(DataCategory::All, valid_until)]);
    }

    /// Time until items of `category` may be sent again.
    pub fn retry_after(&self, category: DataCategory) -> Option<Duration> {
        self.store.retry_after(category)
    }

    /// Get a reference to the rate limit store.
    pub fn store(&self) -> &RateLimitStore<RateLimitStorage> {
        &self.store
    }

    /// Get a reference to the discard tracker.
    pub fn tracker(&self) -> &DiscardTracker<DiscardStorage> {
        &self.tracker
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Whether client reports are enabled.
    pub fn client_reports_enabled(&self) -> bool {
        self.client_reports
    }
}

impl Default for OutboundGate {
    fn default() -> Self {
        Self::new()
    }
}
