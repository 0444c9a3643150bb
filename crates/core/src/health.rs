//! Staleness-based health evaluation.
//!
//! The push engine is considered healthy while its last successful push is
//! recent relative to the push interval. Everything here is pure so the
//! HTTP layer only has to collect inputs and render the result.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Unhealthy iff `now - last_push > staleness_factor * expected_interval`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StalenessPolicy {
    expected_interval: Duration,
    staleness_factor: f64,
}

impl StalenessPolicy {
    pub fn new(expected_interval: Duration, staleness_factor: f64) -> Self {
        Self { expected_interval, staleness_factor }
    }

    /// Largest tolerated age of the last push.
    pub fn threshold(&self) -> Duration {
        let secs = self.expected_interval.as_secs_f64() * self.staleness_factor.max(0.0);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Evaluates health at `now`. A last push in the future counts as fresh.
    pub fn evaluate(&self, last_push: DateTime<Utc>, now: DateTime<Utc>) -> HealthStatus {
        let Ok(elapsed) = (now - last_push).to_std() else {
            return HealthStatus::Healthy;
        };

        if elapsed > self.threshold() {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn policy() -> StalenessPolicy {
        StalenessPolicy::new(Duration::from_secs(60), 3.0)
    }

    #[test]
    fn healthy_within_threshold() {
        let last = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(policy().threshold(), Duration::from_secs(180));
        assert_eq!(policy().evaluate(last, last + chrono::Duration::seconds(180)), HealthStatus::Healthy);
    }

    #[test]
    fn unhealthy_past_threshold() {
        let last = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let status = policy().evaluate(last, last + chrono::Duration::seconds(181));
        assert_eq!(status, HealthStatus::Unhealthy);
        assert!(!status.is_healthy());
    }

    #[test]
    fn future_last_push_is_healthy() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(policy().evaluate(now + chrono::Duration::seconds(5), now), HealthStatus::Healthy);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&HealthStatus::Unhealthy).unwrap(), "\"unhealthy\"");
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
    }
}
