//! Time utilities
//!
//! - **[`quantize`]**: Deterministic timestamp quantization (truncate / round
//!   to a fixed granularity)
//!
//! ## Usage
//!
//! ```rust
//! use meterwire_common::time::TimestampQuantization;
//!
//! let q = TimestampQuantization::ROUND_SECOND;
//! assert_eq!(q.apply_millis(1_700), 2_000);
//! ```

pub mod quantize;

// Re-export commonly used items
pub use quantize::TimestampQuantization;
