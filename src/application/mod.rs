//! Application layer - orchestration of domain logic.
//!
//! This layer owns the runtime state of the gate:
//! - Rate limit store (active deadlines per category)
//! - Discard tracker (pending drop counts)
//! - Outbound gate (per-item decisions and client reports)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod gate;
pub mod metrics;
pub mod ports;
pub mod store;
pub mod tracker;
