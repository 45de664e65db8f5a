//! Process-backed crash state.
//!
//! Crash detection itself happens elsewhere; this adapter is handed the
//! outcome of the previous launch and answers the remaining questions from
//! the operating system where it can.

use crate::application::ports::CrashState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const LOG_TARGET: &str = "envelope_gate::crash_state";

/// `CrashState` for the running process.
#[derive(Debug, Default)]
pub struct ProcessCrashState {
    crashed_last_launch: bool,
    active_duration_since_last_crash: Duration,
    async_hooks_installed: AtomicBool,
    closed: AtomicBool,
}

impl ProcessCrashState {
    /// Create crash state for a process that did not crash last launch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the previous launch crashed after running for `active_duration`.
    pub fn with_last_crash(mut self, active_duration: Duration) -> Self {
        self.crashed_last_launch = true;
        self.active_duration_since_last_crash = active_duration;
        self
    }

    /// Whether `install_async_hooks` has run.
    pub fn async_hooks_installed(&self) -> bool {
        self.async_hooks_installed.load(Ordering::Acquire)
    }

    /// Whether `close` has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl CrashState for ProcessCrashState {
    fn crashed_last_launch(&self) -> bool {
        self.crashed_last_launch
    }

    fn active_duration_since_last_crash(&self) -> Duration {
        self.active_duration_since_last_crash
    }

    fn is_being_traced(&self) -> bool {
        tracer_pid().is_some_and(|pid| pid != 0)
    }

    fn is_simulator_build(&self) -> bool {
        cfg!(all(target_os = "ios", target_arch = "x86_64"))
    }

    fn is_application_in_foreground(&self) -> bool {
        // Headless processes have no background state.
        true
    }

    fn free_memory_bytes(&self) -> u64 {
        available_memory_bytes().unwrap_or(0)
    }

    fn install_async_hooks(&self) {
        if !self.async_hooks_installed.swap(true, Ordering::AcqRel) {
            tracing::debug!(target: LOG_TARGET, "async hooks installed");
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.async_hooks_installed.store(false, Ordering::Release);
    }
}

#[cfg(target_os = "linux")]
fn tracer_pid() -> Option<u32> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_status_field(&status, "TracerPid:")
}

#[cfg(not(target_os = "linux"))]
fn tracer_pid() -> Option<u32> {
    None
}

#[cfg(target_os = "linux")]
fn available_memory_bytes() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let kib: u64 = parse_status_field(&meminfo, "MemAvailable:")?;
    Some(kib.saturating_mul(1024))
}

#[cfg(not(target_os = "linux"))]
fn available_memory_bytes() -> Option<u64> {
    None
}

/// Read the first number following `key` in a `/proc` style key-value listing.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_status_field<T: std::str::FromStr>(contents: &str, key: &str) -> Option<T> {
    contents
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}
