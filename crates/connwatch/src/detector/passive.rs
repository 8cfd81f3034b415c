use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Detector, DownError, LivenessState, SignalStore};

/// Heartbeat-driven detector: the verdict is a pure threshold comparison on
/// the time since the last ping.
///
/// Each Down verdict still counts towards the debounce threshold so the
/// dispatcher only escalates after several consecutive silent ticks.
#[derive(Debug)]
pub struct PassiveDetector {
    store: SignalStore,
    expect_interval: Duration,
    grace_period: Duration,
}

impl PassiveDetector {
    pub fn new(
        initial_signal_at: DateTime<Utc>,
        expect_interval: Duration,
        grace_period: Duration,
        threshold: u32,
    ) -> Self {
        Self { store: SignalStore::new(initial_signal_at, threshold), expect_interval, grace_period }
    }

    /// Longest silence still considered up
    pub fn allowed_silence(&self) -> Duration {
        self.expect_interval.saturating_add(self.grace_period)
    }
}

#[async_trait]
impl Detector for PassiveDetector {
    fn record_signal(&self, at: DateTime<Utc>) {
        self.store.record_signal(at);
    }

    async fn evaluate(&self, now: DateTime<Utc>) -> Result<(), DownError> {
        let allowed = self.allowed_silence();

        self.store.with_state(|state, threshold| {
            // a signal stamped after `now` counts as zero silence
            let elapsed = (now - state.last_signal_at).to_std().unwrap_or_default();
            if elapsed <= allowed {
                return Ok(());
            }

            state.observe_failure(now, threshold);
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                failures = state.consecutive_failures,
                "no signal within allowed silence"
            );
            Err(DownError::Silent {
                last_signal_at: state.last_signal_at,
                elapsed,
                allowed,
                consecutive_failures: state.consecutive_failures,
                down_since: state.down_since,
            })
        })
    }

    fn snapshot(&self) -> LivenessState {
        self.store.snapshot()
    }

    fn kind(&self) -> &'static str {
        "passive"
    }
}
