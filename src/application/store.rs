//! Rate limit deadlines per data category.
//!
//! The store holds at most one deadline per category, plus one for the
//! [`DataCategory::All`] wildcard. A category is limited while either its own
//! deadline or the wildcard deadline lies in the future. Expired deadlines
//! read as absent and are purged on the next update.

use crate::application::ports::{Clock, Storage};
use crate::domain::{category::DataCategory, rate_limit::RateLimitEntry};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const LOG_TARGET: &str = "envelope_gate::store";

/// Registry of active rate limits.
///
/// Generic over the storage implementation. In production, use
/// `Arc<ShardedStorage>`.
#[derive(Clone)]
pub struct RateLimitStore<S>
where
    S: Storage<DataCategory, Instant> + Clone,
{
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S> RateLimitStore<S>
where
    S: Storage<DataCategory, Instant> + Clone,
{
    /// Create an empty store.
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Apply the entries of one backend directive.
    ///
    /// A directive is the backend's latest word: its deadline replaces the
    /// stored one for each category it names, even when it is shorter. If the
    /// directive names a category more than once, the latest deadline wins.
    pub fn update<I>(&self, entries: I)
    where
        I: IntoIterator<Item = RateLimitEntry>,
    {
        let mut latest: BTreeMap<DataCategory, Instant> = BTreeMap::new();
        for entry in entries {
            latest
                .entry(entry.category)
                .and_modify(|until| *until = (*until).max(entry.valid_until))
                .or_insert(entry.valid_until);
        }

        let now = self.clock.now();
        self.purge_expired(now);

        for (category, valid_until) in latest {
            if valid_until <= now {
                // Already expired; storing it would change nothing.
                continue;
            }
            tracing::debug!(
                target: LOG_TARGET,
                category = %category,
                retry_after_secs = (valid_until - now).as_secs(),
                "rate limit updated"
            );
            self.storage.insert(category, valid_until);
        }
    }

    /// Returns `true` if items of this category must not be sent now.
    pub fn is_limited(&self, category: DataCategory) -> bool {
        self.retry_after(category).is_some()
    }

    /// Time until items of this category may be sent again.
    ///
    /// Takes the later of the category's own deadline and the wildcard
    /// deadline. `None` when the category is not limited.
    pub fn retry_after(&self, category: DataCategory) -> Option<Duration> {
        let now = self.clock.now();
        let specific = self.remaining(category, now);
        let global = if category.is_all() {
            None
        } else {
            self.remaining(DataCategory::All, now)
        };

        specific.max(global)
    }

    /// Deadline stored for a category, if still active.
    pub fn valid_until(&self, category: DataCategory) -> Option<Instant> {
        let now = self.clock.now();
        self.storage
            .with_entry(&category, |until| *until)
            .filter(|until| *until >= now)
    }

    /// Drop deadlines that have passed.
    pub fn purge_expired(&self, now: Instant) {
        self.storage.retain(|_, until| *until >= now);
    }

    /// Number of stored deadlines, expired ones included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the store holds no deadlines.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Forget every rate limit.
    pub fn clear(&self) {
        self.storage.clear();
    }

    fn remaining(&self, category: DataCategory, now: Instant) -> Option<Duration> {
        self.storage
            .with_entry(&category, |until| {
                RateLimitEntry::new(category, *until).remaining(now)
            })
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use crate::infrastructure::storage::ShardedStorage;

    fn store_with_clock() -> (
        RateLimitStore<Arc<ShardedStorage<DataCategory, Instant>>>,
        MockClock,
    ) {
        let clock = MockClock::new(Instant::now());
        let store = RateLimitStore::new(Arc::new(ShardedStorage::new()), Arc::new(clock.clone()));
        (store, clock)
    }

    fn entry(category: DataCategory, clock: &MockClock, secs: u64) -> RateLimitEntry {
        RateLimitEntry::new(category, clock.now() + Duration::from_secs(secs))
    }

    #[test]
    fn test_nothing_limited_initially() {
        let (store, _clock) = store_with_clock();

        for category in DataCategory::ALL {
            assert!(!store.is_limited(category));
            assert_eq!(store.retry_after(category), None);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_category_isolation() {
        let (store, clock) = store_with_clock();
        store.update([entry(DataCategory::Error, &clock, 60)]);

        assert!(store.is_limited(DataCategory::Error));
        assert!(!store.is_limited(DataCategory::Session));
        assert_eq!(
            store.retry_after(DataCategory::Error),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_wildcard_limits_everything() {
        let (store, clock) = store_with_clock();
        store.update([entry(DataCategory::All, &clock, 30)]);

        for category in DataCategory::ALL {
            assert!(store.is_limited(category), "{:?} should be limited", category);
        }
    }

    #[test]
    fn test_expiry() {
        let (store, clock) = store_with_clock();
        store.update([entry(DataCategory::Transaction, &clock, 10)]);

        clock.advance(Duration::from_secs(9));
        assert!(store.is_limited(DataCategory::Transaction));
        assert_eq!(
            store.retry_after(DataCategory::Transaction),
            Some(Duration::from_secs(1))
        );

        clock.advance(Duration::from_secs(2));
        assert!(!store.is_limited(DataCategory::Transaction));
        assert_eq!(store.valid_until(DataCategory::Transaction), None);
    }

    #[test]
    fn test_limited_at_exact_deadline() {
        let (store, clock) = store_with_clock();
        store.update([entry(DataCategory::Error, &clock, 10)]);

        clock.advance(Duration::from_secs(10));
        assert!(store.is_limited(DataCategory::Error));
        assert_eq!(store.retry_after(DataCategory::Error), Some(Duration::ZERO));
        assert!(store.valid_until(DataCategory::Error).is_some());

        clock.advance(Duration::from_millis(1));
        assert!(!store.is_limited(DataCategory::Error));
    }

    #[test]
    fn test_retry_after_takes_later_deadline() {
        let (store, clock) = store_with_clock();
        store.update([
            entry(DataCategory::Error, &clock, 20),
            entry(DataCategory::All, &clock, 50),
        ]);

        assert_eq!(
            store.retry_after(DataCategory::Error),
            Some(Duration::from_secs(50))
        );

        clock.advance(Duration::from_secs(30));
        assert_eq!(
            store.retry_after(DataCategory::Error),
            Some(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_wildcard_expiry_keeps_specific_limit() {
        let (store, clock) = store_with_clock();
        store.update([
            entry(DataCategory::All, &clock, 5),
            entry(DataCategory::Attachment, &clock, 100),
        ]);

        clock.advance(Duration::from_secs(6));
        assert!(!store.is_limited(DataCategory::Error));
        assert!(store.is_limited(DataCategory::Attachment));
    }

    #[test]
    fn test_newer_directive_wins_even_if_shorter() {
        let (store, clock) = store_with_clock();
        store.update([entry(DataCategory::Error, &clock, 3600)]);
        store.update([entry(DataCategory::Error, &clock, 10)]);

        assert_eq!(
            store.retry_after(DataCategory::Error),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_latest_deadline_within_one_directive() {
        let (store, clock) = store_with_clock();
        store.update([
            entry(DataCategory::Session, &clock, 120),
            entry(DataCategory::Session, &clock, 60),
        ]);

        assert_eq!(
            store.retry_after(DataCategory::Session),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn test_update_purges_expired_entries() {
        let (store, clock) = store_with_clock();
        store.update([entry(DataCategory::Error, &clock, 1)]);
        assert_eq!(store.len(), 1);

        clock.advance(Duration::from_secs(5));
        store.update([entry(DataCategory::Session, &clock, 1)]);

        assert_eq!(store.len(), 1);
        assert!(store.valid_until(DataCategory::Session).is_some());
    }

    #[test]
    fn test_expired_entries_are_not_stored() {
        let (store, clock) = store_with_clock();
        store.update([RateLimitEntry::new(DataCategory::Error, clock.now())]);

        assert!(store.is_empty());
        assert!(!store.is_limited(DataCategory::Error));
    }

    #[test]
    fn test_clear() {
        let (store, clock) = store_with_clock();
        store.update([entry(DataCategory::All, &clock, 60)]);

        store.clear();
        assert!(!store.is_limited(DataCategory::Error));
    }
}
