#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

//! A thread-safe, fixed-capacity circular buffer with overwrite-on-full
//! semantics.
//!
//! A [`RingBuffer`] absorbs bursts from any number of producers without ever
//! blocking them on I/O. Items are stored in insertion order; when
//! [`add`](RingBuffer::add) receives a value while the buffer is full, the
//! oldest element is evicted and a warning naming it (via
//! [`BufferEntry::entry_id`]) is logged, once per eviction.
//!
//! # Complexity
//! - `add`, `size`, `capacity`, `is_empty`, and `clear` are **O(1)**.
//! - `get_all` and `get_all_and_clear` are **O(n)** in the live entry count.
//!
//! # Locking
//! - All state lives behind one `parking_lot::RwLock`. Mutations take the
//!   write lock; `size`, `is_empty`, and `get_all` take the read lock.
//! - [`get_all_and_clear`](RingBuffer::get_all_and_clear) snapshots and empties
//!   the buffer under a single write-lock acquisition. Every `add` that
//!   completed before the call is in the snapshot; every `add` that starts
//!   after lands in the buffer.
//! - Eviction warnings are emitted after the lock is released.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::warn;

/// Human-identifiable token for an item held in a [`RingBuffer`].
///
/// Used only for diagnostics when an item is evicted.
pub trait BufferEntry {
    /// Returns a short identifier for the entry (for example a sensor id).
    fn entry_id(&self) -> String;
}

macro_rules! impl_buffer_entry_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BufferEntry for $ty {
                fn entry_id(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_buffer_entry_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, String, char);

impl BufferEntry for &str {
    fn entry_id(&self) -> String {
        (*self).to_string()
    }
}

/// Error returned when a buffer is created with an unusable capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ring buffer capacity must be greater than zero (got {0})")]
pub struct CapacityError(pub usize);

/// A bounded, thread-safe FIFO that overwrites its oldest entry when full.
///
/// # Examples
///
/// ```rust
/// use meterwire_common::collections::RingBuffer;
///
/// let buffer = RingBuffer::new(3).unwrap();
/// for value in 1..=5_u32 {
///     buffer.add(value);
/// }
///
/// assert_eq!(buffer.get_all(), vec![3, 4, 5]);
/// assert_eq!(buffer.get_all_and_clear(), vec![3, 4, 5]);
/// assert_eq!(buffer.size(), 0);
/// ```
#[derive(Debug)]
pub struct RingBuffer<T> {
    entries: RwLock<VecDeque<T>>,
    capacity: usize,
    evicted: AtomicU64,
}

impl<T> RingBuffer<T>
where
    T: BufferEntry,
{
    /// Creates an empty buffer able to hold `capacity` entries.
    ///
    /// # Errors
    /// Returns [`CapacityError`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError(capacity));
        }

        Ok(Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            evicted: AtomicU64::new(0),
        })
    }

    /// Appends an item, evicting the oldest entry when the buffer is full.
    pub fn add(&self, item: T) {
        let evicted = {
            let mut entries = self.entries.write();
            let evicted =
                if entries.len() >= self.capacity { entries.pop_front() } else { None };
            entries.push_back(item);
            evicted
        };

        if let Some(old) = evicted {
            self.report_eviction(&old);
        }
    }

    /// Appends every item under a single lock acquisition.
    ///
    /// Eviction semantics match [`add`](Self::add): one warning per evicted
    /// entry, oldest first.
    pub fn add_all<I>(&self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        let evicted: Vec<T> = {
            let mut entries = self.entries.write();
            let mut evicted = Vec::new();
            for item in items {
                if entries.len() >= self.capacity {
                    if let Some(old) = entries.pop_front() {
                        evicted.push(old);
                    }
                }
                entries.push_back(item);
            }
            evicted
        };

        for old in &evicted {
            self.report_eviction(old);
        }
    }

    fn report_eviction(&self, old: &T) {
        let total = self.evicted.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        warn!(
            evicted = %old.entry_id(),
            capacity = self.capacity,
            evicted_total = total,
            "Ring buffer full; oldest entry overwritten (data lost)"
        );
    }
}

impl<T> RingBuffer<T> {
    /// Returns the number of live entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` when no entries are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the maximum number of entries the buffer can hold.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many entries have been overwritten since creation.
    #[must_use]
    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Removes and returns every entry, oldest first, in one atomic step.
    #[must_use]
    pub fn get_all_and_clear(&self) -> Vec<T> {
        let drained = std::mem::take(&mut *self.entries.write());
        Vec::from(drained)
    }

    /// Drops all entries without returning them.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Returns a copy of all live entries, oldest first.
    ///
    /// An empty buffer yields an empty `Vec` without allocating.
    #[must_use]
    pub fn get_all(&self) -> Vec<T> {
        let entries = self.entries.read();
        if entries.is_empty() {
            return Vec::new();
        }
        entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for collections::ring_buffer.
    use super::*;

    /// Validates `RingBuffer::add` behavior for the overwrite ordering
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `buffer.get_all()` equals `vec![3, 4, 5]`.
    /// - Confirms `buffer.evicted_count()` equals `2`.
    #[test]
    fn overwrite_keeps_newest_in_order() {
        let buffer = RingBuffer::new(3).unwrap();
        for value in 1..=5_u32 {
            buffer.add(value);
        }

        assert_eq!(buffer.get_all(), vec![3, 4, 5]);
        assert_eq!(buffer.evicted_count(), 2);
    }

    /// Validates `RingBuffer::new` behavior for the zero capacity scenario.
    ///
    /// Assertions:
    /// - Confirms `RingBuffer::<u32>::new(0)` equals `Err(CapacityError(0))`.
    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(RingBuffer::<u32>::new(0).unwrap_err(), CapacityError(0));
    }

    /// Validates `RingBuffer::add` behavior for the capacity one edge case
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `buffer.size()` equals `1`.
    /// - Confirms `buffer.get_all()` equals `vec!['c']`.
    #[test]
    fn capacity_one_keeps_latest() {
        let buffer = RingBuffer::new(1).unwrap();
        buffer.add('a');
        buffer.add('b');
        buffer.add('c');

        assert_eq!(buffer.size(), 1);
        assert_eq!(buffer.get_all(), vec!['c']);
    }

    /// Validates `RingBuffer::get_all` behavior for the empty buffer
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures `all.is_empty()` evaluates to true.
    /// - Confirms `all.capacity()` equals `0` (no allocation).
    #[test]
    fn get_all_on_empty_does_not_allocate() {
        let buffer = RingBuffer::<u64>::new(8).unwrap();
        let all = buffer.get_all();

        assert!(all.is_empty());
        assert_eq!(all.capacity(), 0);
    }

    /// Validates `RingBuffer::get_all` behavior for the non-mutating read
    /// scenario.
    #[test]
    fn get_all_does_not_mutate() {
        let buffer = RingBuffer::new(4).unwrap();
        buffer.add(String::from("alpha"));
        buffer.add(String::from("beta"));

        let first = buffer.get_all();
        let second = buffer.get_all();

        assert_eq!(first, second);
        assert_eq!(buffer.size(), 2);
    }

    /// Validates `RingBuffer::get_all_and_clear` behavior for the drain
    /// scenarios.
    ///
    /// Assertions:
    /// - Confirms the drained vector equals `vec![10, 20]`.
    /// - Confirms `buffer.size()` equals `0` afterwards.
    /// - Ensures a second drain on the empty buffer returns an empty vector.
    #[test]
    fn get_all_and_clear_drains_then_is_idempotent() {
        let buffer = RingBuffer::new(2).unwrap();
        buffer.add(10_i32);
        buffer.add(20_i32);

        assert_eq!(buffer.get_all_and_clear(), vec![10, 20]);
        assert_eq!(buffer.size(), 0);
        assert!(buffer.get_all_and_clear().is_empty());
        assert_eq!(buffer.size(), 0);
    }

    #[test]
    fn add_all_appends_to_tail_and_evicts_oldest() {
        let buffer = RingBuffer::new(4).unwrap();
        buffer.add(1_u8);
        buffer.add(2_u8);
        buffer.add(3_u8);

        buffer.add_all(vec![4, 5, 6]);

        assert_eq!(buffer.get_all(), vec![3, 4, 5, 6]);
        assert_eq!(buffer.evicted_count(), 2);
    }

    #[test]
    fn clear_retains_capacity() {
        let buffer = RingBuffer::new(2).unwrap();
        buffer.add(1_u16);
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 2);

        buffer.add(30);
        assert_eq!(buffer.get_all(), vec![30]);
    }

    #[test]
    fn entry_id_for_primitives_and_strings() {
        assert_eq!(42_u32.entry_id(), "42");
        assert_eq!(String::from("AA:BB").entry_id(), "AA:BB");
        assert_eq!("room-1".entry_id(), "room-1");
    }
}
