//! Modular common utilities shared across meterwire crates.
//!
//! Everything here is free of domain knowledge: the ring buffer is generic
//! over its element type and the time helpers operate on plain timestamps.
//!
//! - [`collections`]: bounded, thread-safe [`RingBuffer`]
//! - [`time`]: [`TimestampQuantization`]

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod collections;
pub mod time;

// Re-export commonly used types
pub use collections::{BufferEntry, CapacityError, RingBuffer};
pub use time::TimestampQuantization;
