//! Deterministic timestamp quantization.
//!
//! Readings arrive with native, sub-second timestamps. Before they become
//! remote-write samples they are mapped to integer milliseconds and, for
//! low-frequency polled sources, snapped to a coarser grid so that samples
//! from different sensors line up.
//!
//! Rounding is half-up: a timestamp exactly between two grid points moves to
//! the later one. Both modes use euclidean division so pre-epoch timestamps
//! are handled consistently.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a reading timestamp is mapped onto a sample timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimestampQuantization {
    /// Keep millisecond precision.
    #[default]
    Exact,
    /// Round down to a multiple of `granularity_ms`.
    Truncate {
        /// Grid size in milliseconds.
        granularity_ms: u32,
    },
    /// Round to the nearest multiple of `granularity_ms` (ties move up).
    Round {
        /// Grid size in milliseconds.
        granularity_ms: u32,
    },
}

impl TimestampQuantization {
    /// Truncate to the whole second.
    pub const TRUNCATE_SECOND: Self = Self::Truncate { granularity_ms: 1_000 };
    /// Round to the nearest second.
    pub const ROUND_SECOND: Self = Self::Round { granularity_ms: 1_000 };
    /// Round to the nearest ten seconds.
    pub const ROUND_TEN_SECONDS: Self = Self::Round { granularity_ms: 10_000 };

    /// Truncation to an arbitrary granularity (clamped to `u32::MAX` ms).
    #[must_use]
    pub fn truncate_to(granularity: Duration) -> Self {
        Self::Truncate { granularity_ms: clamp_millis(granularity) }
    }

    /// Half-up rounding to an arbitrary granularity (clamped to `u32::MAX` ms).
    #[must_use]
    pub fn round_to(granularity: Duration) -> Self {
        Self::Round { granularity_ms: clamp_millis(granularity) }
    }

    /// Applies the quantization to a millisecond epoch timestamp.
    ///
    /// A granularity of zero or one millisecond is a no-op.
    #[must_use]
    pub fn apply_millis(self, timestamp_ms: i64) -> i64 {
        match self {
            Self::Exact => timestamp_ms,
            Self::Truncate { granularity_ms } if granularity_ms > 1 => {
                let step = i64::from(granularity_ms);
                timestamp_ms.div_euclid(step).saturating_mul(step)
            }
            Self::Round { granularity_ms } if granularity_ms > 1 => {
                let step = i64::from(granularity_ms);
                timestamp_ms.saturating_add(step / 2).div_euclid(step).saturating_mul(step)
            }
            Self::Truncate { .. } | Self::Round { .. } => timestamp_ms,
        }
    }

    /// Converts a reading timestamp into a quantized millisecond timestamp.
    #[must_use]
    pub fn apply(self, timestamp: &DateTime<Utc>) -> i64 {
        self.apply_millis(timestamp.timestamp_millis())
    }
}

fn clamp_millis(granularity: Duration) -> u32 {
    u32::try_from(granularity.as_millis()).unwrap_or(u32::MAX)
}
