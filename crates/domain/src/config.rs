//! Configuration structures
//!
//! Plain settings objects handed to components at construction. Parsing
//! from the environment or from files lives in `meterwire-infra::config`;
//! this module only defines the shape, the defaults, and [`Config::validate`].

use std::collections::BTreeMap;
use std::time::Duration;

use meterwire_common::time::TimestampQuantization;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_BASE_BACKOFF_MS, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_CAPACITY,
    DEFAULT_HEALTH_BIND_ADDRESS, DEFAULT_MAX_ATTEMPTS, DEFAULT_PUSH_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_FLUSH_TIMEOUT_SECS, DEFAULT_STALENESS_FACTOR,
    METRIC_NAME_LABEL,
};
use crate::{MeterwireError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote_write: RemoteWriteConfig,
    pub push: PushConfig,
    pub buffer: BufferConfig,
    pub health: HealthConfig,
    pub series: SeriesConfig,
}

/// Remote-write endpoint and credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteWriteConfig {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteWriteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl RemoteWriteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Push cycle timing and retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    pub interval_secs: u64,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub shutdown_flush_timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_PUSH_INTERVAL_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            shutdown_flush_timeout_secs: DEFAULT_SHUTDOWN_FLUSH_TIMEOUT_SECS,
        }
    }
}

impl PushConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn shutdown_flush_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_flush_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_BUFFER_CAPACITY }
    }
}

/// Health endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub bind_address: String,
    /// Unhealthy once the last push is older than this many push intervals.
    pub staleness_factor: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: DEFAULT_HEALTH_BIND_ADDRESS.to_string(),
            staleness_factor: DEFAULT_STALENESS_FACTOR,
        }
    }
}

/// Per-builder timestamp quantization and labels added to every series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    pub ble_quantization: TimestampQuantization,
    pub thermostat_quantization: TimestampQuantization,
    pub metric_quantization: TimestampQuantization,
    pub external_labels: BTreeMap<String, String>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            ble_quantization: TimestampQuantization::Exact,
            thermostat_quantization: TimestampQuantization::ROUND_TEN_SECONDS,
            metric_quantization: TimestampQuantization::ROUND_SECOND,
            external_labels: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Checks the settings for values that would make startup meaningless.
    ///
    /// # Errors
    /// Returns `MeterwireError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.remote_write.validate()?;

        if self.push.interval_secs == 0 {
            return Err(config_err("push.interval_secs must be greater than zero"));
        }
        if self.push.batch_size == 0 {
            return Err(config_err("push.batch_size must be greater than zero"));
        }
        if self.push.max_attempts == 0 {
            return Err(config_err("push.max_attempts must be greater than zero"));
        }
        if self.buffer.capacity == 0 {
            return Err(config_err("buffer.capacity must be greater than zero"));
        }
        if !self.health.staleness_factor.is_finite() || self.health.staleness_factor < 1.0 {
            return Err(config_err("health.staleness_factor must be at least 1.0"));
        }
        if self.health.enabled && self.health.bind_address.parse::<std::net::SocketAddr>().is_err()
        {
            return Err(MeterwireError::Config(format!(
                "health.bind_address is not a socket address: {}",
                self.health.bind_address
            )));
        }
        for name in self.series.external_labels.keys() {
            if name.is_empty() || name == METRIC_NAME_LABEL {
                return Err(MeterwireError::Config(format!(
                    "series.external_labels contains a reserved or empty name: {name:?}"
                )));
            }
        }

        Ok(())
    }
}

impl RemoteWriteConfig {
    fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(config_err("remote_write.endpoint is required"));
        }

        let url = Url::parse(&self.endpoint).map_err(|e| {
            MeterwireError::Config(format!("remote_write.endpoint is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MeterwireError::Config(format!(
                "remote_write.endpoint must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(config_err("remote_write.password requires remote_write.username"));
        }
        if self.timeout_secs == 0 {
            return Err(config_err("remote_write.timeout_secs must be greater than zero"));
        }

        Ok(())
    }
}

fn config_err(msg: &str) -> MeterwireError {
    MeterwireError::Config(msg.to_string())
}
