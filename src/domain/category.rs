//! Data categories for envelopes, rate limits and client reports.
//!
//! Every telemetry item belongs to exactly one category. The category decides
//! which rate limits apply to the item and under which key its drops are
//! counted in client reports.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Classification of a telemetry item.
///
/// `All` is a wildcard used only by rate limits; `Unknown` is what any
/// unrecognized wire name parses to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataCategory {
    /// Wildcard matching every category.
    All,
    /// Items without a more specific category.
    Default,
    /// Error events.
    Error,
    /// Release health sessions.
    Session,
    /// Performance transactions.
    Transaction,
    /// File attachments.
    Attachment,
    /// User feedback reports.
    UserFeedback,
    /// Fallback for names this client does not know.
    Unknown,
}

impl DataCategory {
    /// Every category, wildcard and fallback included.
    pub const ALL: [DataCategory; 8] = [
        DataCategory::All,
        DataCategory::Default,
        DataCategory::Error,
        DataCategory::Session,
        DataCategory::Transaction,
        DataCategory::Attachment,
        DataCategory::UserFeedback,
        DataCategory::Unknown,
    ];

    /// Canonical wire name of this category.
    ///
    /// The wildcard serializes to an empty string, which is how rate limit
    /// directives express "every category".
    pub fn name(self) -> &'static str {
        match self {
            DataCategory::All => "",
            DataCategory::Default => "default",
            DataCategory::Error => "error",
            DataCategory::Session => "session",
            DataCategory::Transaction => "transaction",
            DataCategory::Attachment => "attachment",
            DataCategory::UserFeedback => "user_report",
            DataCategory::Unknown => "unknown",
        }
    }

    /// Look up a category by its wire name.
    ///
    /// Never fails: names this client does not recognize map to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "" => DataCategory::All,
            "default" => DataCategory::Default,
            "error" => DataCategory::Error,
            "session" => DataCategory::Session,
            "transaction" => DataCategory::Transaction,
            "attachment" => DataCategory::Attachment,
            "user_report" => DataCategory::UserFeedback,
            _ => DataCategory::Unknown,
        }
    }

    /// Category of an envelope item, keyed by the item's `type` header.
    pub fn from_item_type(item_type: &str) -> Self {
        match item_type {
            "event" => DataCategory::Error,
            "session" => DataCategory::Session,
            "transaction" => DataCategory::Transaction,
            "attachment" => DataCategory::Attachment,
            "user_report" => DataCategory::UserFeedback,
            _ => DataCategory::Default,
        }
    }

    /// Envelope item type that carries items of this category.
    pub fn item_type(self) -> &'static str {
        match self {
            DataCategory::Error => "event",
            DataCategory::Session => "session",
            DataCategory::Transaction => "transaction",
            DataCategory::Attachment => "attachment",
            DataCategory::UserFeedback => "user_report",
            DataCategory::All | DataCategory::Default | DataCategory::Unknown => "event",
        }
    }

    /// Returns `true` for the wildcard category.
    pub fn is_all(self) -> bool {
        self == DataCategory::All
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DataCategory::from_name(s))
    }
}

impl Serialize for DataCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trips_for_every_category() {
        for category in DataCategory::ALL {
            assert_eq!(DataCategory::from_name(category.name()), category);
        }
    }

    #[test]
    fn test_wire_names_are_distinct() {
        let mut names: Vec<_> = DataCategory::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DataCategory::ALL.len());
    }

    #[test]
    fn test_unrecognized_names_fall_back_to_unknown() {
        assert_eq!(DataCategory::from_name("profile"), DataCategory::Unknown);
        assert_eq!(DataCategory::from_name("ERROR"), DataCategory::Unknown);
        assert_eq!(DataCategory::from_name(" error"), DataCategory::Unknown);
    }

    #[test]
    fn test_wildcard_is_empty_name() {
        assert_eq!(DataCategory::All.name(), "");
        assert!(DataCategory::from_name("").is_all());
        assert!(!DataCategory::Error.is_all());
    }

    #[test]
    fn test_user_feedback_uses_user_report_wire_name() {
        assert_eq!(DataCategory::UserFeedback.name(), "user_report");
        assert_eq!(
            DataCategory::from_name("user_report"),
            DataCategory::UserFeedback
        );
    }

    #[test]
    fn test_from_item_type() {
        assert_eq!(DataCategory::from_item_type("event"), DataCategory::Error);
        assert_eq!(
            DataCategory::from_item_type("transaction"),
            DataCategory::Transaction
        );
        assert_eq!(
            DataCategory::from_item_type("user_report"),
            DataCategory::UserFeedback
        );
        assert_eq!(
            DataCategory::from_item_type("client_report"),
            DataCategory::Default
        );
    }

    #[test]
    fn test_item_type_maps_back_to_category() {
        for category in [
            DataCategory::Error,
            DataCategory::Session,
            DataCategory::Transaction,
            DataCategory::Attachment,
            DataCategory::UserFeedback,
        ] {
            assert_eq!(DataCategory::from_item_type(category.item_type()), category);
        }
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(DataCategory::Session.to_string(), "session");
        assert_eq!("attachment".parse(), Ok(DataCategory::Attachment));
    }

    #[test]
    fn test_serializes_as_wire_name() {
        let json = serde_json::to_string(&DataCategory::UserFeedback).unwrap();
        assert_eq!(json, "\"user_report\"");
    }
}
