//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `METERWIRE_REMOTE_WRITE_URL` is not set, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. The result is validated before it is returned
//!
//! ## Environment Variables
//! - `METERWIRE_REMOTE_WRITE_URL`: Remote-write endpoint (required)
//! - `METERWIRE_REMOTE_WRITE_USERNAME` / `METERWIRE_REMOTE_WRITE_PASSWORD`:
//!   Basic auth credentials
//! - `METERWIRE_REMOTE_WRITE_TIMEOUT_SECS`: Request timeout
//! - `METERWIRE_PUSH_INTERVAL_SECS`: Push cycle interval
//! - `METERWIRE_PUSH_BATCH_SIZE`: Maximum readings per request
//! - `METERWIRE_PUSH_MAX_ATTEMPTS`: Attempts per batch before re-queue
//! - `METERWIRE_PUSH_BASE_BACKOFF_MS`: First retry delay
//! - `METERWIRE_SHUTDOWN_FLUSH_TIMEOUT_SECS`: Bound on the final flush
//! - `METERWIRE_BUFFER_CAPACITY`: Ring buffer capacity
//! - `METERWIRE_HEALTH_ENABLED`: Whether to serve `/health` (true/false)
//! - `METERWIRE_HEALTH_BIND_ADDRESS`: Health server socket address
//! - `METERWIRE_HEALTH_STALENESS_FACTOR`: Push intervals before unhealthy
//! - `METERWIRE_EXTERNAL_LABELS`: `name=value` pairs separated by commas
//!
//! Timestamp quantization is only configurable from a file.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./meterwire.json` or `./meterwire.toml` (current working directory)
//! 3. `/etc/meterwire/config.toml`
//! 4. Relative to executable location

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use meterwire_domain::{
    BufferConfig, Config, HealthConfig, MeterwireError, PushConfig, RemoteWriteConfig, Result,
    SeriesConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the endpoint
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `MeterwireError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `METERWIRE_REMOTE_WRITE_URL` is required; every other setting falls
/// back to its default.
///
/// # Errors
/// Returns `MeterwireError::Config` if the endpoint is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let remote_write = RemoteWriteConfig {
        endpoint: env_var("METERWIRE_REMOTE_WRITE_URL")?,
        username: env_opt("METERWIRE_REMOTE_WRITE_USERNAME"),
        password: env_opt("METERWIRE_REMOTE_WRITE_PASSWORD"),
        timeout_secs: env_parse(
            "METERWIRE_REMOTE_WRITE_TIMEOUT_SECS",
            defaults.remote_write.timeout_secs,
        )?,
    };

    let push = PushConfig {
        interval_secs: env_parse("METERWIRE_PUSH_INTERVAL_SECS", defaults.push.interval_secs)?,
        batch_size: env_parse("METERWIRE_PUSH_BATCH_SIZE", defaults.push.batch_size)?,
        max_attempts: env_parse("METERWIRE_PUSH_MAX_ATTEMPTS", defaults.push.max_attempts)?,
        base_backoff_ms: env_parse(
            "METERWIRE_PUSH_BASE_BACKOFF_MS",
            defaults.push.base_backoff_ms,
        )?,
        shutdown_flush_timeout_secs: env_parse(
            "METERWIRE_SHUTDOWN_FLUSH_TIMEOUT_SECS",
            defaults.push.shutdown_flush_timeout_secs,
        )?,
    };

    let buffer = BufferConfig {
        capacity: env_parse("METERWIRE_BUFFER_CAPACITY", defaults.buffer.capacity)?,
    };

    let health = HealthConfig {
        enabled: env_bool("METERWIRE_HEALTH_ENABLED", defaults.health.enabled),
        bind_address: env_opt("METERWIRE_HEALTH_BIND_ADDRESS")
            .unwrap_or(defaults.health.bind_address),
        staleness_factor: env_parse(
            "METERWIRE_HEALTH_STALENESS_FACTOR",
            defaults.health.staleness_factor,
        )?,
    };

    let series = SeriesConfig {
        external_labels: match env_opt("METERWIRE_EXTERNAL_LABELS") {
            Some(raw) => parse_label_pairs(&raw)?,
            None => BTreeMap::new(),
        },
        ..defaults.series
    };

    Ok(Config { remote_write, push, buffer, health, series })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MeterwireError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MeterwireError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MeterwireError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MeterwireError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MeterwireError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MeterwireError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MeterwireError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("meterwire.json"),
            cwd.join("meterwire.toml"),
        ]);
    }

    candidates.push(PathBuf::from("/etc/meterwire/config.toml"));

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("meterwire.json"),
                exe_dir.join("meterwire.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Parse `name=value,name=value` into a label map.
fn parse_label_pairs(raw: &str) -> Result<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                MeterwireError::Config(format!("Invalid external label (expected name=value): {pair}"))
            })?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| MeterwireError::Config(format!("Missing required environment variable: {key}")))
}

/// Get optional, non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional environment variable, falling back to `default`
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| MeterwireError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
