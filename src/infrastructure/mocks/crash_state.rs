//! Mock crash state for testing.

use crate::application::ports::CrashState;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Controllable `CrashState` that records the calls made to it.
///
/// Clones share state, so a test can keep one handle and pass another to the
/// code under test.
///
/// # Examples
///
/// ```
/// use envelope_gate::infrastructure::mocks::MockCrashState;
/// use envelope_gate::application::ports::CrashState;
///
/// let state = MockCrashState::new();
/// state.set_application_in_foreground(false);
/// assert!(!state.is_application_in_foreground());
///
/// state.install_async_hooks();
/// assert!(state.install_async_hooks_called());
/// ```
#[derive(Debug, Clone)]
pub struct MockCrashState {
    inner: Arc<Mutex<MockCrashStateInner>>,
}

#[derive(Debug, Clone)]
struct MockCrashStateInner {
    crashed_last_launch: bool,
    active_duration_since_last_crash: Duration,
    is_being_traced: bool,
    is_simulator_build: bool,
    is_application_in_foreground: bool,
    free_memory_bytes: u64,
    install_async_hooks_called: bool,
    close_called: bool,
}

impl MockCrashState {
    /// Create a mock for a healthy foreground process.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockCrashStateInner {
                crashed_last_launch: false,
                active_duration_since_last_crash: Duration::ZERO,
                is_being_traced: false,
                is_simulator_build: false,
                is_application_in_foreground: true,
                free_memory_bytes: 0,
                install_async_hooks_called: false,
                close_called: false,
            })),
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut MockCrashStateInner) -> R) -> R {
        let mut inner = self
            .inner
            .lock()
            .expect("MockCrashState mutex poisoned - a test thread panicked while holding the lock");
        f(&mut inner)
    }

    /// Set whether the previous launch crashed.
    pub fn set_crashed_last_launch(&self, crashed: bool) {
        self.with_inner(|inner| inner.crashed_last_launch = crashed);
    }

    /// Set the active duration before the last crash.
    pub fn set_active_duration_since_last_crash(&self, duration: Duration) {
        self.with_inner(|inner| inner.active_duration_since_last_crash = duration);
    }

    /// Set whether a debugger is attached.
    pub fn set_being_traced(&self, traced: bool) {
        self.with_inner(|inner| inner.is_being_traced = traced);
    }

    /// Set whether this is a simulator build.
    pub fn set_simulator_build(&self, simulator: bool) {
        self.with_inner(|inner| inner.is_simulator_build = simulator);
    }

    /// Set whether the application is in the foreground.
    pub fn set_application_in_foreground(&self, foreground: bool) {
        self.with_inner(|inner| inner.is_application_in_foreground = foreground);
    }

    /// Set the reported free memory.
    pub fn set_free_memory_bytes(&self, bytes: u64) {
        self.with_inner(|inner| inner.free_memory_bytes = bytes);
    }

    /// Whether `install_async_hooks` was called.
    pub fn install_async_hooks_called(&self) -> bool {
        self.with_inner(|inner| inner.install_async_hooks_called)
    }

    /// Whether `close` was called.
    pub fn close_called(&self) -> bool {
        self.with_inner(|inner| inner.close_called)
    }
}

impl Default for MockCrashState {
    fn default() -> Self {
        Self::new()
    }
}

impl CrashState for MockCrashState {
    fn crashed_last_launch(&self) -> bool {
        self.with_inner(|inner| inner.crashed_last_launch)
    }

    fn active_duration_since_last_crash(&self) -> Duration {
        self.with_inner(|inner| inner.active_duration_since_last_crash)
    }

    fn is_being_traced(&self) -> bool {
        self.with_inner(|inner| inner.is_being_traced)
    }

    fn is_simulator_build(&self) -> bool {
        self.with_inner(|inner| inner.is_simulator_build)
    }

    fn is_application_in_foreground(&self) -> bool {
        self.with_inner(|inner| inner.is_application_in_foreground)
    }

    fn free_memory_bytes(&self) -> u64 {
        self.with_inner(|inner| inner.free_memory_bytes)
    }

    fn install_async_hooks(&self) {
        self.with_inner(|inner| inner.install_async_hooks_called = true);
    }

    fn close(&self) {
        self.with_inner(|inner| inner.close_called = true);
    }
}
