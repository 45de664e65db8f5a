//! Rate limit directives sent back by the collection backend.
//!
//! The backend answers every envelope with an optional `X-Sentry-Rate-Limits`
//! header of the form:
//!
//! ```text
//! <retry-after>:<categories>:<scope>[:<reason>][, ...]
//! ```
//!
//! `<categories>` is a `;`-separated list of category names, empty meaning
//! "every category". Each comma-separated group is parsed on its own; a bad
//! group is skipped and never spoils the rest of the directive.

use crate::domain::category::DataCategory;
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "envelope_gate::rate_limit";

/// Longest suppression a single directive can impose.
///
/// Larger retry-after values are clamped to this rather than dropped.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Suppression window for a single category.
///
/// An entry for [`DataCategory::All`] suppresses every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Category this entry suppresses
    pub category: DataCategory,
    /// Instant at which the suppression ends
    pub valid_until: Instant,
}

impl RateLimitEntry {
    /// Create an entry that ends at `valid_until`.
    pub fn new(category: DataCategory, valid_until: Instant) -> Self {
        Self {
            category,
            valid_until,
        }
    }

    /// Returns `true` once `now` has passed the end of the window.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.valid_until
    }

    /// Time left in the window, or `None` if it has ended.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.is_expired(now) {
            None
        } else {
            Some(self.valid_until - now)
        }
    }
}

/// Parse a retry-after value in seconds.
///
/// Accepts integers and decimals; decimals round up to the next whole second.
/// Negative values clamp to zero. Returns `None` for anything non-numeric.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();

    if let Ok(secs) = value.parse::<i64>() {
        return Some(Duration::from_secs(secs.max(0) as u64));
    }

    match value.parse::<f64>() {
        Ok(secs) if secs.is_finite() => Some(Duration::from_secs(secs.max(0.0).ceil() as u64)),
        _ => None,
    }
}

/// Deadline for a suppression of `retry_after` starting at `now`.
///
/// `retry_after` is clamped to [`MAX_RETRY_AFTER`].
pub fn deadline_after(now: Instant, retry_after: Duration) -> Instant {
    now + retry_after.min(MAX_RETRY_AFTER)
}

/// Parse a full rate limit directive into suppression entries.
///
/// Every entry's window starts at `now`. Groups with a missing or non-numeric
/// retry-after are skipped, as are groups whose retry-after is zero: they
/// would expire immediately. A category named twice in one group yields a
/// single entry.
pub fn parse_rate_limits(directive: &str, now: Instant) -> Vec<RateLimitEntry> {
    let mut entries = Vec::new();

    for group in directive.split(',') {
        let group = group.trim();
        if group.is_empty() {
            continue;
        }

        let mut fields = group.split(':');
        let retry_after = match fields.next().and_then(parse_retry_after) {
            Some(retry_after) => retry_after,
            None => {
                tracing::debug!(target: LOG_TARGET, group, "skipping rate limit group without a valid retry-after");
                continue;
            }
        };

        if retry_after.is_zero() {
            continue;
        }

        if retry_after > MAX_RETRY_AFTER {
            tracing::debug!(target: LOG_TARGET, group, "clamping oversized retry-after");
        }
        let valid_until = deadline_after(now, retry_after);

        let first = entries.len();
        for category in parse_categories(fields.next().unwrap_or("")) {
            if !entries[first..]
                .iter()
                .any(|entry: &RateLimitEntry| entry.category == category)
            {
                entries.push(RateLimitEntry::new(category, valid_until));
            }
        }
    }

    entries
}

fn parse_categories(field: &str) -> Vec<DataCategory> {
    let field = field.trim();
    if field.is_empty() {
        return vec![DataCategory::All];
    }

    field
        .split(';')
        .map(|name| DataCategory::from_name(name.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(entries: &[RateLimitEntry]) -> Vec<DataCategory> {
        entries.iter().map(|entry| entry.category).collect()
    }

    #[test]
    fn test_parse_two_categories() {
        let now = Instant::now();
        let entries = parse_rate_limits("60:error;session:", now);

        assert_eq!(
            categories(&entries),
            vec![DataCategory::Error, DataCategory::Session]
        );
        for entry in &entries {
            assert_eq!(entry.valid_until, now + Duration::from_secs(60));
        }
    }

    #[test]
    fn test_parse_empty_categories_is_global() {
        let now = Instant::now();
        let entries = parse_rate_limits("2700:::org_id", now);

        assert_eq!(
            entries,
            vec![RateLimitEntry::new(
                DataCategory::All,
                now + Duration::from_secs(2700)
            )]
        );
    }

    #[test]
    fn test_parse_multiple_groups() {
        let now = Instant::now();
        let entries = parse_rate_limits("50:transaction:key, 2700:default;error:organization", now);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].category, DataCategory::Transaction);
        assert_eq!(entries[0].valid_until, now + Duration::from_secs(50));
        assert_eq!(entries[1].category, DataCategory::Default);
        assert_eq!(entries[2].category, DataCategory::Error);
        assert_eq!(entries[2].valid_until, now + Duration::from_secs(2700));
    }

    #[test]
    fn test_malformed_groups_are_skipped() {
        let now = Instant::now();
        let entries = parse_rate_limits("abc:error:key, :session:key,10:attachment:key", now);

        assert_eq!(categories(&entries), vec![DataCategory::Attachment]);
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let now = Instant::now();
        assert!(parse_rate_limits("", now).is_empty());
        assert!(parse_rate_limits(",,,", now).is_empty());
        assert!(parse_rate_limits("not a directive", now).is_empty());
    }

    #[test]
    fn test_unknown_category_name() {
        let now = Instant::now();
        let entries = parse_rate_limits("60:profile;error:key", now);

        assert_eq!(
            categories(&entries),
            vec![DataCategory::Unknown, DataCategory::Error]
        );
    }

    #[test]
    fn test_duplicate_categories_collapse() {
        let now = Instant::now();
        let entries = parse_rate_limits("60:error;error;error:key", now);

        assert_eq!(categories(&entries), vec![DataCategory::Error]);
    }

    #[test]
    fn test_same_category_in_separate_groups_is_kept() {
        let now = Instant::now();
        let entries = parse_rate_limits("60:error:key,120:error:org", now);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].valid_until, now + Duration::from_secs(120));
    }

    #[test]
    fn test_zero_and_negative_retry_after_store_nothing() {
        let now = Instant::now();
        assert!(parse_rate_limits("0:error:key", now).is_empty());
        assert!(parse_rate_limits("-30:error:key", now).is_empty());
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let now = Instant::now();
        let entries = parse_rate_limits("  60 : error ; session :key ", now);

        assert_eq!(
            categories(&entries),
            vec![DataCategory::Error, DataCategory::Session]
        );
    }

    #[test]
    fn test_group_without_categories_field() {
        let now = Instant::now();
        let entries = parse_rate_limits("30", now);

        assert_eq!(categories(&entries), vec![DataCategory::All]);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("17"), Some(Duration::from_secs(17)));
        assert_eq!(parse_retry_after("17.2"), Some(Duration::from_secs(18)));
        assert_eq!(parse_retry_after("-2"), Some(Duration::ZERO));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after("nope"), None);
        assert_eq!(parse_retry_after("NaN"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn test_entry_expiry() {
        let now = Instant::now();
        let entry = RateLimitEntry::new(DataCategory::Error, now + Duration::from_secs(10));

        assert!(!entry.is_expired(now));
        assert_eq!(entry.remaining(now), Some(Duration::from_secs(10)));
        assert!(!entry.is_expired(now + Duration::from_secs(10)));
        assert_eq!(
            entry.remaining(now + Duration::from_secs(10)),
            Some(Duration::ZERO)
        );
        assert!(entry.is_expired(now + Duration::from_millis(10_001)));
        assert_eq!(entry.remaining(now + Duration::from_secs(11)), None);
    }

    #[test]
    fn test_oversized_retry_after_is_clamped() {
        let now = Instant::now();
        let entries = parse_rate_limits("10000000000000000000:session:key", now);

        assert_eq!(
            entries,
            vec![RateLimitEntry::new(
                DataCategory::Session,
                now + MAX_RETRY_AFTER
            )]
        );
    }

    #[test]
    fn test_deadline_after() {
        let now = Instant::now();
        assert_eq!(
            deadline_after(now, Duration::from_secs(30)),
            now + Duration::from_secs(30)
        );
        assert_eq!(deadline_after(now, Duration::MAX), now + MAX_RETRY_AFTER);
    }
}
