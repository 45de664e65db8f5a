//! # envelope-gate
//!
//! Rate limit gating and client report accounting for crash and error
//! telemetry clients.
//!
//! Every item a telemetry client wants to send (an error, a session, a
//! transaction, an attachment, a user feedback report) passes through an
//! [`OutboundGate`]. The gate answers three questions:
//!
//! - May this item be sent now, or is its category rate limited by the backend?
//! - For how long must its category stay quiet?
//! - How many items were dropped locally, by category and reason, since the
//!   last report?
//!
//! ## Quick Start
//!
//! ```rust
//! use envelope_gate::{DataCategory, Envelope, EnvelopeItem, OutboundGate};
//!
//! let gate = OutboundGate::new();
//!
//! // The backend answered the previous request with a rate limit on errors.
//! gate.update_from_response(429, Some("60:error:organization"), None);
//!
//! let envelope = Envelope::from_items(vec![
//!     EnvelopeItem::new(DataCategory::Error, b"{}".to_vec()),
//!     EnvelopeItem::new(DataCategory::Session, b"{}".to_vec()),
//! ]);
//!
//! // The error is dropped and counted; the session goes through.
//! let mut envelope = gate.gate_envelope(envelope).expect("session survives");
//! assert_eq!(envelope.len(), 1);
//!
//! // The drop rides along with the next envelope as a client report.
//! assert!(gate.attach_client_report(&mut envelope));
//! assert_eq!(envelope.len(), 2);
//! ```
//!
//! ## Rate Limit Directives
//!
//! The backend sends rate limits in the `X-Sentry-Rate-Limits` header:
//!
//! ```text
//! <retry-after>:<categories>:<scope>[, ...]
//! ```
//!
//! `<categories>` is a `;`-separated list; leaving it empty limits every
//! category. Malformed groups are skipped, never fatal. A `429` response
//! without that header falls back to `Retry-After`, and then to a
//! configurable default (60 seconds).
//!
//! ## Client Reports
//!
//! Drops are counted per `(category, reason)`. Other parts of the pipeline
//! report their own drops through [`OutboundGate::record_discarded`]:
//!
//! ```rust
//! use envelope_gate::{DataCategory, DiscardReason, OutboundGate};
//!
//! let gate = OutboundGate::new();
//! gate.record_discarded(DataCategory::Transaction, DiscardReason::QueueOverflow, 3);
//!
//! let report = gate.prepare_client_report().expect("one pending drop");
//! assert_eq!(report.total_quantity(), 3);
//!
//! // Draining is exactly-once: nothing is left for the next report.
//! assert!(gate.prepare_client_report().is_none());
//! ```
//!
//! ## Testing
//!
//! Enable the `test-helpers` feature for `MockClock`, `MockCrashState` and
//! `MockCaptureLayer`:
//!
//! ```rust,ignore
//! use envelope_gate::infrastructure::mocks::MockClock;
//! use envelope_gate::{DataCategory, OutboundGate};
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! let clock = MockClock::new(Instant::now());
//! let gate = OutboundGate::builder()
//!     .with_clock(Arc::new(clock.clone()))
//!     .build()
//!     .unwrap();
//!
//! gate.update_rate_limits("30::organization");
//! assert!(!gate.should_send(DataCategory::Error));
//!
//! clock.advance(Duration::from_secs(31));
//! assert!(gate.should_send(DataCategory::Error));
//! ```

// Domain layer - pure types
pub mod domain;

// Application layer - gate state and decisions
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    category::DataCategory,
    client_report::{ClientReport, DiscardedEvent, CLIENT_REPORT_ITEM_TYPE},
    discard::{DiscardReason, ParseDiscardReasonError},
    envelope::{Envelope, EnvelopeItem},
    rate_limit::{
        deadline_after, parse_rate_limits, parse_retry_after, RateLimitEntry, MAX_RETRY_AFTER,
    },
};

pub use application::{
    gate::{
        BuildError, DiscardStorage, GateDecision, OutboundGate, OutboundGateBuilder,
        RateLimitStorage, DEFAULT_RETRY_AFTER, TOO_MANY_REQUESTS,
    },
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, CrashState, Storage},
    store::RateLimitStore,
    tracker::{DiscardKey, DiscardTracker},
};

pub use infrastructure::{
    clock::SystemClock, crash_state::ProcessCrashState, storage::ShardedStorage,
};
