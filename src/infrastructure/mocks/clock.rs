//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// Mock clock for testing.
///
/// Allows tests to control time progression explicitly, so rate limit
/// expiry can be checked without sleeping.
///
/// # Examples
///
/// ```
/// use envelope_gate::infrastructure::mocks::MockClock;
/// use envelope_gate::application::ports::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
///
/// assert_eq!(clock.now(), start);
///
/// clock.advance(Duration::from_secs(60));
/// assert_eq!(clock.now(), start + Duration::from_secs(60));
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying time, so advancing one clone
/// advances them all.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<MockTime>>,
}

#[derive(Debug, Clone, Copy)]
struct MockTime {
    instant: Instant,
    system_time: SystemTime,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    ///
    /// Wall-clock time starts at the real current time.
    pub fn new(start: Instant) -> Self {
        Self::with_system_time(start, SystemTime::now())
    }

    /// Create a mock clock with both monotonic and wall-clock starting points.
    pub fn with_system_time(start: Instant, system_time: SystemTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(MockTime {
                instant: start,
                system_time,
            })),
        }
    }

    /// Advance both clocks by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        time.instant += duration;
        time.system_time += duration;
    }

    /// Set the monotonic clock to a specific instant.
    pub fn set(&self, instant: Instant) {
        let mut time = self
            .current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        time.instant = instant;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
            .instant
    }

    fn system_time(&self) -> SystemTime {
        self.current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
            .system_time
    }
}
