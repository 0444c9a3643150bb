//! In-process observability for the push engine
//!
//! Counters are plain atomics read by the health endpoint and by logs; no
//! exporter is attached.
//!
//! ## Design Principles
//!
//! 1. **Future-Proof Returns**: All record methods return `MetricsResult<()>`
//!    so limits or validation can be added without API breakage. They
//!    currently always succeed.
//!
//! 2. **Memory Ordering**: SeqCst for values combined into derived metrics
//!    (averages), Relaxed for independent counters
//!
//! ## Error Handling
//!
//! ```rust
//! use meterwire_infra::observability::metrics::PushMetrics;
//!
//! let metrics = PushMetrics::new();
//!
//! if let Err(e) = metrics.record_cycle() {
//!     tracing::warn!("Failed to record metric: {}", e);
//! }
//! ```

pub mod metrics;

/// Metrics error type
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "average push time")
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
