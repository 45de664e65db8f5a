//! Outgoing envelopes and the items they carry.
//!
//! Only the parts the gate needs are modelled here: an item's type, its data
//! category and its opaque payload bytes.

use crate::domain::category::DataCategory;
use crate::domain::client_report::{ClientReport, CLIENT_REPORT_ITEM_TYPE};

/// A single telemetry item queued for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeItem {
    item_type: String,
    category: DataCategory,
    payload: Vec<u8>,
}

impl EnvelopeItem {
    /// Create an item for a category, using that category's item type.
    pub fn new(category: DataCategory, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            item_type: category.item_type().to_owned(),
            category,
            payload: payload.into(),
        }
    }

    /// Create an item from its envelope item type header.
    pub fn with_type(item_type: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        let item_type = item_type.into();
        Self {
            category: DataCategory::from_item_type(&item_type),
            item_type,
            payload: payload.into(),
        }
    }

    /// Serialize a client report into an item.
    pub fn client_report(report: &ClientReport) -> Result<Self, serde_json::Error> {
        Ok(Self {
            item_type: CLIENT_REPORT_ITEM_TYPE.to_owned(),
            category: DataCategory::Default,
            payload: report.to_json()?,
        })
    }

    /// Envelope item type header.
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Data category used for rate limiting and drop accounting.
    pub fn category(&self) -> DataCategory {
        self.category
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Client reports are bookkeeping and are never rate limited.
    pub fn is_client_report(&self) -> bool {
        self.item_type == CLIENT_REPORT_ITEM_TYPE
    }
}

/// A batch of items sent to the backend in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    items: Vec<EnvelopeItem>,
}

impl Envelope {
    /// Create an empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an envelope from items.
    pub fn from_items(items: Vec<EnvelopeItem>) -> Self {
        Self { items }
    }

    /// Append an item.
    pub fn add_item(&mut self, item: EnvelopeItem) {
        self.items.push(item);
    }

    /// Items in send order.
    pub fn items(&self) -> &[EnvelopeItem] {
        &self.items
    }

    /// Take the items out of the envelope.
    pub fn into_items(self) -> Vec<EnvelopeItem> {
        self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the envelope has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
