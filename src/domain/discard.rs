//! Reasons an item can be dropped before it reaches the backend.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Why a telemetry item was discarded locally.
///
/// Only used as an aggregation key; the gate attaches no meaning to a reason
/// beyond its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiscardReason {
    /// A backend rate limit was active for the item's category.
    RateLimitBackoff,
    /// The in-memory send queue was full.
    QueueOverflow,
    /// The on-disk envelope cache was full.
    CacheOverflow,
    /// Sending failed and the item was not retried.
    NetworkError,
    /// A `before_send` callback returned nothing.
    BeforeSend,
    /// An event processor dropped the item.
    EventProcessor,
    /// Not enough data to build a valid item.
    InsufficientData,
    /// The item failed validation.
    InvalidEvent,
}

impl DiscardReason {
    /// Every discard reason.
    pub const ALL: [DiscardReason; 8] = [
        DiscardReason::RateLimitBackoff,
        DiscardReason::QueueOverflow,
        DiscardReason::CacheOverflow,
        DiscardReason::NetworkError,
        DiscardReason::BeforeSend,
        DiscardReason::EventProcessor,
        DiscardReason::InsufficientData,
        DiscardReason::InvalidEvent,
    ];

    /// Wire name used in client reports.
    pub fn name(self) -> &'static str {
        match self {
            DiscardReason::RateLimitBackoff => "rate_limit_backoff",
            DiscardReason::QueueOverflow => "queue_overflow",
            DiscardReason::CacheOverflow => "cache_overflow",
            DiscardReason::NetworkError => "network_error",
            DiscardReason::BeforeSend => "before_send",
            DiscardReason::EventProcessor => "event_processor",
            DiscardReason::InsufficientData => "insufficient_data",
            DiscardReason::InvalidEvent => "invalid_event",
        }
    }
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unrecognized discard reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiscardReasonError {
    name: String,
}

impl fmt::Display for ParseDiscardReasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown discard reason: {:?}", self.name)
    }
}

impl std::error::Error for ParseDiscardReasonError {}

impl FromStr for DiscardReason {
    type Err = ParseDiscardReasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscardReason::ALL
            .into_iter()
            .find(|reason| reason.name() == s)
            // Relay's spelling.
            .or_else(|| (s == "ratelimit_backoff").then_some(DiscardReason::RateLimitBackoff))
            .ok_or_else(|| ParseDiscardReasonError { name: s.to_owned() })
    }
}

impl Serialize for DiscardReason {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}
