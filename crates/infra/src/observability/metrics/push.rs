//! Push-cycle metrics
//!
//! Tracks how many cycles ran, what happened to each batch, and how long
//! delivery took.
//!
//! ## Design
//! - **SeqCst ordering** for the pair used by `avg_push_time_ms`
//! - **No locking needed** - simple atomic counters
//! - **Microsecond storage** - reporting helpers convert to ms

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::observability::{MetricsError, MetricsResult};

/// Counters for the push engine
#[derive(Debug, Default)]
pub struct PushMetrics {
    /// Push cycles started (timer ticks, `push_now` and the shutdown flush)
    pub cycles: AtomicU64,
    /// Send attempts, including retries
    pub attempts: AtomicU64,
    /// Attempts that followed a failure
    pub retries: AtomicU64,
    /// Batches acknowledged with a 2xx
    pub batches_delivered: AtomicU64,
    /// Batches that exhausted their attempts
    pub batches_failed: AtomicU64,
    /// Batches dropped on build or encode errors
    pub batches_dropped: AtomicU64,
    /// Readings contained in delivered batches
    pub readings_delivered: AtomicU64,
    /// Readings put back into the buffer
    pub readings_requeued: AtomicU64,
    /// Time spent in successful sends, microseconds
    pub total_push_time_micros: AtomicU64,
}

/// Point-in-time copy of [`PushMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMetricsSnapshot {
    pub cycles: u64,
    pub attempts: u64,
    pub retries: u64,
    pub batches_delivered: u64,
    pub batches_failed: u64,
    pub batches_dropped: u64,
    pub readings_delivered: u64,
    pub readings_requeued: u64,
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl PushMetrics {
    /// Create new PushMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) -> MetricsResult<()> {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Record one send attempt; `attempt` is 1-based.
    pub fn record_attempt(&self, attempt: u32) -> MetricsResult<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if attempt > 1 {
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Record a delivered batch and how long the successful send took.
    pub fn record_delivered(&self, readings: usize, elapsed: Duration) -> MetricsResult<()> {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        // SeqCst for consistency with avg_push_time_ms
        self.total_push_time_micros.fetch_add(micros, Ordering::SeqCst);
        self.batches_delivered.fetch_add(1, Ordering::SeqCst);

        self.readings_delivered.fetch_add(count(readings), Ordering::Relaxed);
        Ok(())
    }

    /// Record a batch whose readings went back into the buffer.
    pub fn record_requeued(&self, readings: usize) -> MetricsResult<()> {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.readings_requeued.fetch_add(count(readings), Ordering::Relaxed);
        Ok(())
    }

    pub fn record_dropped(&self) -> MetricsResult<()> {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Average duration of a successful send in milliseconds
    ///
    /// # Errors
    /// Returns [`MetricsError::EmptyData`] before the first delivery.
    pub fn avg_push_time_ms(&self) -> MetricsResult<f64> {
        let total = self.total_push_time_micros.load(Ordering::SeqCst);
        let delivered = self.batches_delivered.load(Ordering::SeqCst);

        if delivered == 0 {
            return Err(MetricsError::EmptyData { metric: "average push time" });
        }

        #[allow(clippy::cast_precision_loss)]
        Ok((total as f64 / delivered as f64) / 1_000.0)
    }

    pub fn snapshot(&self) -> PushMetricsSnapshot {
        PushMetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::SeqCst),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            readings_delivered: self.readings_delivered.load(Ordering::Relaxed),
            readings_requeued: self.readings_requeued.load(Ordering::Relaxed),
        }
    }
}
