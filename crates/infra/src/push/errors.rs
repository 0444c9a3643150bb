//! Push-specific error types
//!
//! Provides error classification for remote-write delivery.

use std::time::Duration;

use meterwire_core::BuildError;
use meterwire_domain::MeterwireError;
use thiserror::Error;

use crate::remote_write::EncodeError;

/// Categories of push errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushErrorCategory {
    /// Connection failures and timeouts - retryable
    Network,
    /// 5xx and 429 responses - retryable
    Server,
    /// Other non-2xx responses - the endpoint refused the payload
    Client,
    /// Build or encode failures - the batch is dropped
    Payload,
    /// Start/stop misuse, cancellation
    Lifecycle,
    /// Invalid settings - fatal at startup
    Config,
}

/// Push operation errors
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote write rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to build series: {0}")]
    Build(#[from] BuildError),

    #[error("Failed to encode write request: {0}")]
    Encode(#[from] EncodeError),

    #[error("Push failed after {attempts} attempts for {batches} batch(es): {last_error}")]
    RetriesExhausted { attempts: u32, batches: usize, last_error: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Pusher already running")]
    AlreadyRunning,

    #[error("Pusher not running")]
    NotRunning,

    #[error("Push task failed to stop: {0}")]
    Shutdown(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PushError {
    /// Get the error category for this error
    pub fn category(&self) -> PushErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => PushErrorCategory::Network,
            Self::Rejected { status, .. } if *status >= 500 || *status == 429 || *status == 408 => {
                PushErrorCategory::Server
            }
            Self::Rejected { .. } => PushErrorCategory::Client,
            Self::Build(_) | Self::Encode(_) => PushErrorCategory::Payload,
            Self::RetriesExhausted { .. } => PushErrorCategory::Network,
            Self::Cancelled | Self::AlreadyRunning | Self::NotRunning | Self::Shutdown(_) => {
                PushErrorCategory::Lifecycle
            }
            Self::Config(_) => PushErrorCategory::Config,
        }
    }

    /// Whether the same request may succeed if sent again later
    pub fn is_transient(&self) -> bool {
        matches!(self.category(), PushErrorCategory::Network | PushErrorCategory::Server)
    }
}

impl From<PushError> for MeterwireError {
    fn from(err: PushError) -> Self {
        match err.category() {
            PushErrorCategory::Network | PushErrorCategory::Server | PushErrorCategory::Client => {
                Self::Network(err.to_string())
            }
            PushErrorCategory::Payload => Self::Encode(err.to_string()),
            PushErrorCategory::Lifecycle => Self::Internal(err.to_string()),
            PushErrorCategory::Config => Self::Config(err.to_string()),
        }
    }
}
