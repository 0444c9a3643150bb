//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Remote-write protocol
pub const METRIC_NAME_LABEL: &str = "__name__";
pub const RESERVED_LABEL_PREFIX: &str = "__";
pub const REMOTE_WRITE_VERSION: &str = "0.1.0";
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
pub const SNAPPY_CONTENT_ENCODING: &str = "snappy";

// Push engine defaults
pub const DEFAULT_PUSH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SHUTDOWN_FLUSH_TIMEOUT_SECS: u64 = 5;

// Buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

// Health
pub const DEFAULT_HEALTH_BIND_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_STALENESS_FACTOR: f64 = 3.0;

// Error bodies longer than this are cut in log output
pub const MAX_ERROR_BODY_LOG_LEN: usize = 512;
