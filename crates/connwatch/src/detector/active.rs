use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{Detector, DownError, LivenessState, Probe, SignalStore};

/// Dial-out detector with debounce.
///
/// Slow to declare down (`threshold` consecutive failed probes), fast to
/// declare up (the first successful probe).
pub struct ActiveDetector {
    store: SignalStore,
    probe: Box<dyn Probe>,
}

impl ActiveDetector {
    pub fn new(initial_signal_at: DateTime<Utc>, probe: Box<dyn Probe>, threshold: u32) -> Self {
        Self { store: SignalStore::new(initial_signal_at, threshold), probe }
    }
}

#[async_trait]
impl Detector for ActiveDetector {
    fn record_signal(&self, at: DateTime<Utc>) {
        self.store.record_signal(at);
    }

    async fn evaluate(&self, now: DateTime<Utc>) -> Result<(), DownError> {
        // the probe runs outside the lock so a concurrent ping never waits on it
        match self.probe.probe().await {
            Ok(latency) => {
                debug!(peer = self.probe.target(), latency_ms = latency.as_millis() as u64, "probe ok");
                self.store.record_signal(now);
                Ok(())
            }
            Err(e) => {
                let state = self.store.record_failure(now);
                match state.down_since {
                    Some(down_since) => Err(DownError::Unreachable {
                        target: self.probe.target().to_string(),
                        reason: e.to_string(),
                        consecutive_failures: state.consecutive_failures,
                        down_since,
                    }),
                    None => {
                        warn!(
                            peer = self.probe.target(),
                            failures = state.consecutive_failures,
                            threshold = self.store.threshold(),
                            error = %e,
                            "probe failed, below debounce threshold"
                        );
                        Ok(())
                    }
                }
            }
        }
    }

    fn snapshot(&self) -> LivenessState {
        self.store.snapshot()
    }

    fn kind(&self) -> &'static str {
        "active"
    }
}
