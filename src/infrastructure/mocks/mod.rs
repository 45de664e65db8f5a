//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling controlled testing of gate behavior.

pub mod clock;
pub mod crash_state;
pub mod layer;

pub use clock::MockClock;
pub use crash_state::MockCrashState;
pub use layer::{CapturedEvent, MockCaptureLayer};
