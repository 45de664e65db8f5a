//! Client reports: aggregated counts of items dropped on the client.
//!
//! A client report is never sent on its own schedule. It rides along with the
//! next envelope that goes out, as an item of type `client_report`.

use crate::domain::{category::DataCategory, discard::DiscardReason};
use serde::{Serialize, Serializer};
use std::time::{SystemTime, UNIX_EPOCH};

/// Envelope item type of a client report.
pub const CLIENT_REPORT_ITEM_TYPE: &str = "client_report";

/// Drop count for one (category, reason) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscardedEvent {
    /// Why the items were dropped
    pub reason: DiscardReason,
    /// Category of the dropped items
    pub category: DataCategory,
    /// How many items were dropped
    pub quantity: u64,
}

/// Payload of a `client_report` envelope item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientReport {
    /// When the report was assembled, as fractional Unix seconds on the wire
    #[serde(serialize_with = "serialize_unix_seconds")]
    pub timestamp: SystemTime,
    /// Drop counts, ordered by category then reason
    pub discarded_events: Vec<DiscardedEvent>,
}

impl ClientReport {
    /// Build a report from drained discard counts.
    ///
    /// Zero counts are left out. Returns `None` when nothing remains, so an
    /// empty report is never produced.
    pub fn from_counts<I>(timestamp: SystemTime, counts: I) -> Option<Self>
    where
        I: IntoIterator<Item = ((DataCategory, DiscardReason), u64)>,
    {
        let mut discarded_events: Vec<DiscardedEvent> = counts
            .into_iter()
            .filter(|(_, quantity)| *quantity > 0)
            .map(|((category, reason), quantity)| DiscardedEvent {
                reason,
                category,
                quantity,
            })
            .collect();

        if discarded_events.is_empty() {
            return None;
        }

        discarded_events.sort_by_key(|event| (event.category, event.reason));

        Some(Self {
            timestamp,
            discarded_events,
        })
    }

    /// Total number of dropped items in this report.
    pub fn total_quantity(&self) -> u64 {
        self.discarded_events
            .iter()
            .fold(0u64, |total, event| total.saturating_add(event.quantity))
    }

    /// Drop count recorded for a (category, reason) pair, zero if absent.
    pub fn quantity(&self, category: DataCategory, reason: DiscardReason) -> u64 {
        self.discarded_events
            .iter()
            .find(|event| event.category == category && event.reason == reason)
            .map_or(0, |event| event.quantity)
    }

    /// Serialize the report as an envelope item payload.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Format the report as a one-line human-readable message.
    pub fn format_message(&self) -> String {
        format!(
            "{} items discarded across {} category/reason pairs",
            self.total_quantity(),
            self.discarded_events.len()
        )
    }
}

fn serialize_unix_seconds<S>(timestamp: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let secs = timestamp
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0);
    serializer.serialize_f64(secs)
}
