//! Debounced liveness detection.
//!
//! # Data Flow
//! ```text
//! /ping handler ──record_signal──┐
//!                                ▼
//!                          SignalStore (mutex)
//!                                ▲
//! evaluation tick ──evaluate─────┘──► Ok(()) | Err(DownError)
//! ```
//!
//! Two policies share one [`Detector`] trait:
//! - [`PassiveDetector`]: the peer heartbeats us; silence beyond
//!   `interval + grace` is a Down verdict.
//! - [`ActiveDetector`]: we dial the peer; Down only after `threshold`
//!   consecutive probe failures, Up again on the first success.

mod active;
mod passive;
mod probe;
mod state;

pub use active::ActiveDetector;
pub use passive::PassiveDetector;
pub use probe::{PROBE_TIMEOUT, Probe, ProbeError, TcpProbe};
pub use state::{LivenessState, SignalStore};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{DetectorMode, ServerConfig};

/// Why the link is considered down
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownError {
    #[error("no ping received during the expected interval (silent for {elapsed:?}, allowed {allowed:?})")]
    Silent {
        last_signal_at: DateTime<Utc>,
        elapsed: Duration,
        allowed: Duration,
        consecutive_failures: u32,
        down_since: Option<DateTime<Utc>>,
    },

    #[error("probe to {target} failed {consecutive_failures} times in a row: {reason}")]
    Unreachable {
        target: String,
        reason: String,
        consecutive_failures: u32,
        down_since: DateTime<Utc>,
    },
}

impl DownError {
    /// Start of the down episode, present only once the debounce threshold
    /// has been crossed
    pub fn down_since(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Silent { down_since, .. } => *down_since,
            Self::Unreachable { down_since, .. } => Some(*down_since),
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        match self {
            Self::Silent { consecutive_failures, .. }
            | Self::Unreachable { consecutive_failures, .. } => *consecutive_failures,
        }
    }

    pub fn is_debounced(&self) -> bool {
        self.down_since().is_some()
    }
}

/// Liveness detector capability
#[async_trait]
pub trait Detector: Send + Sync {
    /// Record a liveness signal observed at `at`. Never fails.
    fn record_signal(&self, at: DateTime<Utc>);

    /// Decide whether the link is up at `now`
    async fn evaluate(&self, now: DateTime<Utc>) -> Result<(), DownError>;

    /// Copy of the current state, for diagnostics
    fn snapshot(&self) -> LivenessState;

    /// Short policy name for logs
    fn kind(&self) -> &'static str;
}

/// Build the detector selected by the configuration.
///
/// The initial signal is back-dated by one interval so a freshly started
/// server gives the peer a full grace period before declaring it down.
pub fn from_config(config: &ServerConfig, started_at: DateTime<Utc>) -> Arc<dyn Detector> {
    let initial = started_at
        - chrono::TimeDelta::from_std(config.heartbeat_interval).unwrap_or(chrono::TimeDelta::zero());

    match &config.detector {
        DetectorMode::Passive => Arc::new(PassiveDetector::new(
            initial,
            config.heartbeat_interval,
            config.grace_period,
            config.debounce_threshold,
        )),
        DetectorMode::Active { probe_addr } => Arc::new(ActiveDetector::new(
            initial,
            Box::new(TcpProbe::new(probe_addr.clone(), PROBE_TIMEOUT)),
            config.debounce_threshold,
        )),
    }
}
