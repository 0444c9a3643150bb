//! Metrics collection modules
//!
//! Thread-safe metrics for the push engine.

pub mod push;

// Re-export metric types for convenience
pub use push::{PushMetrics, PushMetricsSnapshot};
