//! Health reporting for the push engine.
//!
//! [`HealthMonitor`] combines the last-push timestamp with buffer occupancy;
//! [`server`] exposes it as `GET /health`.

pub mod server;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use meterwire_common::collections::RingBuffer;
use meterwire_core::health::{HealthStatus, StalenessPolicy};
use meterwire_domain::Reading;
use serde::Serialize;

use crate::push::PushState;

pub use server::{health_router, HealthError, HealthServer};

/// Snapshot rendered by the health endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub last_push_time: DateTime<Utc>,
    pub seconds_since_last_push: i64,
    pub buffered_samples: usize,
    pub evicted_total: u64,
}

/// Reads push state and buffer occupancy without touching the network.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    buffer: Arc<RingBuffer<Reading>>,
    state: Arc<PushState>,
    policy: StalenessPolicy,
}

impl HealthMonitor {
    pub fn new(
        buffer: Arc<RingBuffer<Reading>>,
        state: Arc<PushState>,
        policy: StalenessPolicy,
    ) -> Self {
        Self { buffer, state, policy }
    }

    pub fn policy(&self) -> &StalenessPolicy {
        &self.policy
    }

    pub fn report(&self) -> HealthReport {
        self.report_at(Utc::now())
    }

    pub fn report_at(&self, now: DateTime<Utc>) -> HealthReport {
        let last_push_time = self.state.last_push_time();

        HealthReport {
            status: self.policy.evaluate(last_push_time, now),
            last_push_time,
            seconds_since_last_push: (now - last_push_time).num_seconds().max(0),
            buffered_samples: self.buffer.size(),
            evicted_total: self.buffer.evicted_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use meterwire_domain::MetricReading;

    use super::*;

    fn monitor(capacity: usize) -> (HealthMonitor, Arc<RingBuffer<Reading>>, DateTime<Utc>) {
        let started = Utc.with_ymd_and_hms(2025, 10, 26, 17, 0, 0).unwrap();
        let buffer = Arc::new(RingBuffer::new(capacity).unwrap());
        let state = Arc::new(PushState::starting_at(started));
        let policy = StalenessPolicy::new(Duration::from_secs(60), 3.0);
        (HealthMonitor::new(Arc::clone(&buffer), state, policy), buffer, started)
    }

    #[test]
    fn healthy_until_three_intervals_pass() {
        let (monitor, _, started) = monitor(10);

        let report = monitor.report_at(started + chrono::Duration::seconds(180));
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.seconds_since_last_push, 180);

        let report = monitor.report_at(started + chrono::Duration::seconds(181));
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn reports_buffer_occupancy_and_evictions() {
        let (monitor, buffer, started) = monitor(2);
        for i in 0..3 {
            buffer.add(MetricReading::new("m", f64::from(i), started).into());
        }

        let report = monitor.report_at(started);
        assert_eq!(report.buffered_samples, 2);
        assert_eq!(report.evicted_total, 1);
    }

    #[test]
    fn serializes_camel_case() {
        let (monitor, _, started) = monitor(10);
        let json = serde_json::to_value(monitor.report_at(started)).unwrap();

        assert_eq!(json["status"], "healthy");
        assert_eq!(json["lastPushTime"], "2025-10-26T17:00:00Z");
        assert_eq!(json["bufferedSamples"], 0);
        assert!(json.get("evictedTotal").is_some());
    }
}
