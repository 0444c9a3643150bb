use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Time of the last successful remote write, shared with the health monitor.
///
/// Starts at construction time so a freshly started process is reported
/// healthy until the first staleness window elapses.
#[derive(Debug)]
pub struct PushState {
    last_push_ms: AtomicI64,
}

impl Default for PushState {
    fn default() -> Self {
        Self::new()
    }
}

impl PushState {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self { last_push_ms: AtomicI64::new(at.timestamp_millis()) }
    }

    pub fn last_push_time(&self) -> DateTime<Utc> {
        let millis = self.last_push_ms.load(Ordering::Acquire);
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Record a delivered batch.
    pub fn mark_success(&self) {
        self.mark_success_at(Utc::now());
    }

    pub fn mark_success_at(&self, at: DateTime<Utc>) {
        self.last_push_ms.fetch_max(at.timestamp_millis(), Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn starts_at_construction_time() {
        let before = Utc::now();
        let state = PushState::new();
        let after = Utc::now();

        let last = state.last_push_time();
        assert!(last >= before - chrono::Duration::milliseconds(1));
        assert!(last <= after);
    }

    #[test]
    fn success_never_moves_backwards() {
        let t0 = Utc.with_ymd_and_hms(2025, 10, 26, 17, 30, 0).unwrap();
        let state = PushState::starting_at(t0);

        state.mark_success_at(t0 + chrono::Duration::seconds(60));
        state.mark_success_at(t0 + chrono::Duration::seconds(30));

        assert_eq!(state.last_push_time(), t0 + chrono::Duration::seconds(60));
    }
}
