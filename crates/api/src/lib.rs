//! # Meterwire
//!
//! Application layer: wires buffer, series builders, HTTP client, push
//! engine and health server together and owns their lifecycle.
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Producers add readings through [`AppContext::buffer`]

pub mod context;
pub mod telemetry;

// Re-export for convenience
pub use context::*;
