//! Domain layer - pure types with no runtime state.
//!
//! This layer contains the vocabulary of the gate:
//! - Data categories and their wire names
//! - Discard reasons
//! - Rate limit directive parsing
//! - Client report payloads
//! - Envelopes and envelope items
//!
//! All types in this layer are pure and easily testable.

pub mod category;
pub mod client_report;
pub mod discard;
pub mod envelope;
pub mod rate_limit;
