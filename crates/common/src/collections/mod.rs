//! Specialized data structures
//!
//! - **[`ring_buffer`]**: Bounded, thread-safe ring buffer that overwrites its
//!   oldest entry when full
//!
//! ## Usage
//!
//! ```rust
//! use meterwire_common::collections::RingBuffer;
//!
//! let buffer = RingBuffer::new(10).unwrap();
//! buffer.add(1_u32);
//! assert_eq!(buffer.size(), 1);
//! ```

pub mod ring_buffer;

// Re-export commonly used types
pub use ring_buffer::{BufferEntry, CapacityError, RingBuffer};
