//! Periodic push engine.
//!
//! Drains the reading buffer on a fixed interval, turns each batch into
//! remote-write series, and delivers it with exponential backoff. Batches
//! that exhaust their attempts go back into the buffer for the next cycle;
//! batches that cannot be built or encoded are dropped.
//!
//! Lifecycle mirrors the other background workers: the join handle is
//! tracked, cancellation is explicit, and `stop` is bounded by timeouts.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use meterwire_common::collections::RingBuffer;
//! use meterwire_core::series::BleSeriesBuilder;
//! use meterwire_infra::http::RemoteWriteClient;
//! use meterwire_infra::observability::metrics::PushMetrics;
//! use meterwire_infra::push::{Pusher, PusherConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let buffer = Arc::new(RingBuffer::new(10_000)?);
//! let client = RemoteWriteClient::builder("http://localhost:8428/api/v1/write").build()?;
//! let mut pusher = Pusher::new(
//!     buffer,
//!     Arc::new(BleSeriesBuilder::new()),
//!     Arc::new(client),
//!     PusherConfig::default(),
//!     Arc::new(PushMetrics::new()),
//! );
//!
//! pusher.start().await?;
//! // ... producers add readings ...
//! pusher.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meterwire_common::collections::RingBuffer;
use meterwire_core::series::SeriesBuilder;
use meterwire_domain::constants::{
    DEFAULT_BASE_BACKOFF_MS, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ATTEMPTS, DEFAULT_PUSH_INTERVAL_SECS,
    DEFAULT_SHUTDOWN_FLUSH_TIMEOUT_SECS, MAX_ERROR_BODY_LOG_LEN,
};
use meterwire_domain::{PushConfig, Reading};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::http::RemoteWriteClient;
use crate::observability::metrics::PushMetrics;
use crate::observability::MetricsResult;
use crate::push::errors::PushError;
use crate::push::state::PushState;
use crate::remote_write::encode_write_request;

/// Configuration for the push engine.
#[derive(Debug, Clone)]
pub struct PusherConfig {
    /// Interval between push cycles
    pub interval: Duration,
    /// Maximum readings per remote-write request
    pub batch_size: usize,
    /// Send attempts per batch before it is re-queued
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    pub base_backoff: Duration,
    /// Bound on the final flush performed by `stop`
    pub shutdown_flush_timeout: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for PusherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_PUSH_INTERVAL_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
            shutdown_flush_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_FLUSH_TIMEOUT_SECS),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&PushConfig> for PusherConfig {
    fn from(config: &PushConfig) -> Self {
        Self {
            interval: config.interval(),
            batch_size: config.batch_size,
            max_attempts: config.max_attempts,
            base_backoff: config.base_backoff(),
            shutdown_flush_timeout: config.shutdown_flush_timeout(),
            ..Self::default()
        }
    }
}

/// Interface for delivering one encoded `WriteRequest` body.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait RemoteWriteForwarder: Send + Sync {
    async fn forward(&self, body: &[u8]) -> Result<(), PushError>;
}

#[async_trait]
impl RemoteWriteForwarder for RemoteWriteClient {
    async fn forward(&self, body: &[u8]) -> Result<(), PushError> {
        self.send(body).await
    }
}

/// What a completed cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Readings taken out of the buffer
    pub drained: usize,
    pub batches_delivered: usize,
    /// Batches discarded because they could not be built or encoded
    pub batches_dropped: usize,
}

/// Exponential backoff before retry number `attempt` (1-based failures).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    base.saturating_mul(1_u32 << exponent)
}

/// Everything one push cycle needs; cloned into the background task.
#[derive(Clone)]
struct PushCycle {
    buffer: Arc<RingBuffer<Reading>>,
    builder: Arc<dyn SeriesBuilder>,
    forwarder: Arc<dyn RemoteWriteForwarder>,
    state: Arc<PushState>,
    metrics: Arc<PushMetrics>,
    batch_size: usize,
    base_backoff: Duration,
}

impl PushCycle {
    /// Drain the buffer and deliver it batch by batch.
    ///
    /// On cancellation the interrupted batch and every unsent batch are put
    /// back into the buffer before returning [`PushError::Cancelled`].
    async fn run(
        &self,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<CycleSummary, PushError> {
        log_metric(self.metrics.record_cycle(), "pusher.cycle");

        let readings = self.buffer.get_all_and_clear();
        if readings.is_empty() {
            debug!("No buffered readings to push");
            return Ok(CycleSummary::default());
        }

        let mut summary = CycleSummary { drained: readings.len(), ..CycleSummary::default() };
        let mut batches = split_batches(readings, self.batch_size).into_iter();
        let batch_count = batches.len();
        info!(readings = summary.drained, batches = batch_count, "Pushing buffered readings");

        let mut failed_batches = 0_usize;
        let mut last_error: Option<String> = None;

        while let Some(batch) = batches.next() {
            if cancel.is_cancelled() {
                self.requeue_interrupted(batch, batches);
                return Err(PushError::Cancelled);
            }

            let body = match self.encode(&batch) {
                Ok(body) => body,
                Err(err) => {
                    error!(batch_size = batch.len(), error = %err, "Dropping batch that cannot be encoded");
                    log_metric(self.metrics.record_dropped(), "pusher.batch.dropped");
                    summary.batches_dropped += 1;
                    continue;
                }
            };

            match self.send_with_retry(&body, batch.len(), max_attempts, cancel).await {
                Ok(()) => {
                    self.state.mark_success();
                    summary.batches_delivered += 1;
                    debug!(batch_size = batch.len(), "Batch delivered");
                }
                Err(PushError::Cancelled) => {
                    self.requeue_interrupted(batch, batches);
                    return Err(PushError::Cancelled);
                }
                Err(err) => {
                    let message = truncate_for_log(&err.to_string());
                    error!(
                        attempts = max_attempts,
                        batch_size = batch.len(),
                        last_error = %message,
                        "Remote write failed; re-queueing batch"
                    );
                    log_metric(self.metrics.record_requeued(batch.len()), "pusher.batch.requeued");
                    self.buffer.add_all(batch);
                    failed_batches += 1;
                    last_error = Some(message);
                }
            }
        }

        match last_error {
            Some(last_error) => Err(PushError::RetriesExhausted {
                attempts: max_attempts,
                batches: failed_batches,
                last_error,
            }),
            None => Ok(summary),
        }
    }

    fn encode(&self, batch: &[Reading]) -> Result<Vec<u8>, PushError> {
        let series = self.builder.build(batch)?;
        Ok(encode_write_request(&series)?)
    }

    /// Send one body, retrying with exponential backoff.
    ///
    /// Both the request and the backoff wait abort on cancellation.
    async fn send_with_retry(
        &self,
        body: &[u8],
        readings: usize,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<(), PushError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1_u32;

        loop {
            log_metric(self.metrics.record_attempt(attempt), "pusher.attempt");
            let started = Instant::now();

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PushError::Cancelled),
                result = self.forwarder.forward(body) => result,
            };

            let err = match result {
                Ok(()) => {
                    log_metric(
                        self.metrics.record_delivered(readings, started.elapsed()),
                        "pusher.batch.delivered",
                    );
                    return Ok(());
                }
                Err(err) if attempt >= max_attempts => return Err(err),
                Err(err) => err,
            };

            let delay = backoff_delay(self.base_backoff, attempt);
            warn!(
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                transient = err.is_transient(),
                error = %truncate_for_log(&err.to_string()),
                "Remote write attempt failed; backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PushError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    fn requeue_interrupted(&self, batch: Vec<Reading>, rest: impl Iterator<Item = Vec<Reading>>) {
        let readings: Vec<Reading> = std::iter::once(batch).chain(rest).flatten().collect();
        if readings.is_empty() {
            return;
        }

        warn!(readings = readings.len(), "Push cancelled; re-queueing unsent readings");
        log_metric(self.metrics.record_requeued(readings.len()), "pusher.batch.requeued");
        self.buffer.add_all(readings);
    }
}

/// Push engine with explicit lifecycle management.
pub struct Pusher {
    cycle: PushCycle,
    config: PusherConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl Pusher {
    /// Create a new pusher; nothing runs until [`start`](Self::start).
    pub fn new(
        buffer: Arc<RingBuffer<Reading>>,
        builder: Arc<dyn SeriesBuilder>,
        forwarder: Arc<dyn RemoteWriteForwarder>,
        config: PusherConfig,
        metrics: Arc<PushMetrics>,
    ) -> Self {
        let cycle = PushCycle {
            buffer,
            builder,
            forwarder,
            state: Arc::new(PushState::new()),
            metrics,
            batch_size: config.batch_size.max(1),
            base_backoff: config.base_backoff,
        };

        Self { cycle, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Start the background push loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), PushError> {
        if self.is_running() {
            return Err(PushError::AlreadyRunning);
        }

        info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.cycle.batch_size,
            max_attempts = self.config.max_attempts,
            "Starting pusher"
        );

        // Create fresh cancellation token
        self.cancellation = CancellationToken::new();

        let cycle = self.cycle.clone();
        let interval = self.config.interval;
        let max_attempts = self.config.max_attempts;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(cycle, interval, max_attempts, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("Pusher started");

        Ok(())
    }

    /// Stop the loop, wait for it, then flush whatever is still buffered once.
    ///
    /// The flush makes a single attempt per batch and is bounded by
    /// `shutdown_flush_timeout`; anything it cannot deliver stays buffered.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), PushError> {
        if !self.is_running() {
            return Err(PushError::NotRunning);
        }

        info!("Stopping pusher");

        // Cancel background task
        self.cancellation.cancel();

        // Await join handle with timeout
        let mut join_error = None;
        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Pusher task panicked: {}", e);
                    join_error = Some(PushError::Shutdown("push task panicked".to_string()));
                }
                Err(_) => {
                    warn!("Pusher task did not complete within timeout");
                    join_error = Some(PushError::Shutdown("push task join timed out".to_string()));
                }
            }
        }

        // Flush even when the loop did not exit cleanly
        self.cancellation = CancellationToken::new();
        self.final_flush().await;

        match join_error {
            Some(err) => Err(err),
            None => {
                info!("Pusher stopped");
                Ok(())
            }
        }
    }

    /// Returns true when the background loop is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Run one full push cycle now, independent of the timer.
    #[instrument(skip(self))]
    pub async fn push_now(&self) -> Result<CycleSummary, PushError> {
        self.cycle.run(self.config.max_attempts, &self.cancellation).await
    }

    pub fn last_push_time(&self) -> DateTime<Utc> {
        self.cycle.state.last_push_time()
    }

    /// Shared handle to the last-push state, for health reporting.
    pub fn state(&self) -> Arc<PushState> {
        Arc::clone(&self.cycle.state)
    }

    pub fn metrics(&self) -> Arc<PushMetrics> {
        Arc::clone(&self.cycle.metrics)
    }

    pub fn config(&self) -> &PusherConfig {
        &self.config
    }

    async fn final_flush(&self) {
        let flush_cancel = CancellationToken::new();
        let flush = self.cycle.run(1, &flush_cancel);
        tokio::pin!(flush);

        let result = tokio::select! {
            result = &mut flush => result,
            _ = tokio::time::sleep(self.config.shutdown_flush_timeout) => {
                warn!(
                    timeout_secs = self.config.shutdown_flush_timeout.as_secs(),
                    "Final flush timed out"
                );
                flush_cancel.cancel();
                flush.await
            }
        };

        match result {
            Ok(summary) if summary.drained > 0 => {
                info!(
                    readings = summary.drained,
                    batches = summary.batches_delivered,
                    "Final flush delivered buffered readings"
                );
            }
            Ok(_) => debug!("Nothing to flush on shutdown"),
            Err(err) => warn!(error = %err, "Final flush failed; readings remain buffered"),
        }
    }

    /// Background push loop.
    async fn process_loop(
        cycle: PushCycle,
        interval: Duration,
        max_attempts: u32,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Pusher process loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    match cycle.run(max_attempts, &cancel).await {
                        Ok(summary) => {
                            if summary.drained > 0 {
                                info!(
                                    readings = summary.drained,
                                    delivered = summary.batches_delivered,
                                    dropped = summary.batches_dropped,
                                    avg_push_time_ms = cycle.metrics.avg_push_time_ms().ok(),
                                    "Push cycle completed"
                                );
                            }
                        }
                        Err(PushError::Cancelled) => {
                            debug!("Push cycle interrupted by shutdown");
                        }
                        Err(e) => {
                            error!(error = %e, "Push cycle failed");
                        }
                    }
                }
            }
        }
    }
}

fn split_batches(readings: Vec<Reading>, batch_size: usize) -> Vec<Vec<Reading>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(readings.len().div_ceil(batch_size));
    let mut readings = readings.into_iter().peekable();
    while readings.peek().is_some() {
        batches.push(readings.by_ref().take(batch_size).collect());
    }
    batches
}

fn truncate_for_log(message: &str) -> String {
    if message.len() <= MAX_ERROR_BODY_LOG_LEN {
        return message.to_string();
    }

    let mut truncated =
        message.chars().take(MAX_ERROR_BODY_LOG_LEN.saturating_sub(3)).collect::<String>();
    truncated.push_str("...");
    truncated
}

fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        warn!(metric = metric, error = ?err, "Failed to record pusher metric");
    }
}

impl Drop for Pusher {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("Pusher dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
