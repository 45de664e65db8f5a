//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant, SystemTime};

/// Port for obtaining current time.
///
/// Rate limit deadlines are measured on the monotonic clock; client report
/// timestamps use wall-clock time. Infrastructure provides concrete
/// implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;

    /// Get the current wall-clock time.
    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Port for concurrent key-value storage.
///
/// This abstraction allows the application layer to store and retrieve values
/// without depending on specific concurrent data structure implementations.
/// Infrastructure provides concrete implementations (ShardedStorage).
///
/// Every single-key operation is atomic with respect to every other operation
/// on the same key.
pub trait Storage<K, V>: Send + Sync + Debug
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// # Arguments
    /// * `key` - The key to look up
    /// * `factory` - Function to create a new value if the key doesn't exist
    /// * `accessor` - Function that gets mutable access to the value
    ///
    /// # Returns
    /// The result from the accessor function
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R;

    /// Read an entry without creating it.
    fn with_entry<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&V) -> R;

    /// Insert a value, returning the one it replaced.
    fn insert(&self, key: K, value: V) -> Option<V>;

    /// Get the number of entries in the storage.
    fn len(&self) -> usize;

    /// Check if the storage is empty.
    fn is_empty(&self) -> bool;

    /// Clear all entries from the storage.
    fn clear(&self);

    /// Iterate over all entries, providing access to both key and value.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);

    /// Remove entries for which the predicate returns false.
    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool;

    /// Remove and return every entry.
    ///
    /// Each entry is removed atomically. A concurrent `with_entry_mut` on a
    /// drained key either lands before the removal, and its effect is part
    /// of the returned value, or after it, and re-creates the entry.
    fn drain(&self) -> Vec<(K, V)>;
}

/// Port for querying crash and process state.
///
/// Production code uses `ProcessCrashState`; tests swap in `MockCrashState`.
pub trait CrashState: Send + Sync + Debug {
    /// Whether the previous run of the process ended in a crash.
    fn crashed_last_launch(&self) -> bool;

    /// How long the process was active before the last crash.
    fn active_duration_since_last_crash(&self) -> Duration;

    /// Whether a debugger is attached to the process.
    fn is_being_traced(&self) -> bool;

    /// Whether the binary was built for a simulator.
    fn is_simulator_build(&self) -> bool;

    /// Whether the application is in the foreground.
    fn is_application_in_foreground(&self) -> bool;

    /// Free system memory in bytes, zero if unknown.
    fn free_memory_bytes(&self) -> u64;

    /// Install hooks that tag asynchronous work with its call site.
    fn install_async_hooks(&self);

    /// Release any resources held for crash detection.
    fn close(&self);
}
