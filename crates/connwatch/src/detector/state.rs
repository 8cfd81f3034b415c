//! Liveness state and the signal store that guards it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Memory-resident liveness state of the watched link.
///
/// `down_since` is set exactly when `consecutive_failures` has reached the
/// debounce threshold. Restarting the process resets everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivenessState {
    pub last_signal_at: DateTime<Utc>,
    pub consecutive_failures: u32,
    pub down_since: Option<DateTime<Utc>>,
}

impl LivenessState {
    pub fn new(last_signal_at: DateTime<Utc>) -> Self {
        Self { last_signal_at, consecutive_failures: 0, down_since: None }
    }

    /// A fresh signal: last write wins, even if `at` is older than the
    /// previously stored timestamp.
    pub fn observe_signal(&mut self, at: DateTime<Utc>) {
        self.last_signal_at = at;
        self.consecutive_failures = 0;
        self.down_since = None;
    }

    /// One more failed evaluation. Returns `true` once debounced.
    pub fn observe_failure(&mut self, at: DateTime<Utc>, threshold: u32) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= effective_threshold(threshold) && self.down_since.is_none() {
            self.down_since = Some(at);
        }
        self.is_down()
    }

    pub fn is_down(&self) -> bool {
        self.down_since.is_some()
    }
}

/// A threshold of zero would never trip; treat it as "down after first miss".
pub(crate) fn effective_threshold(threshold: u32) -> u32 {
    threshold.max(1)
}

/// Mutex-guarded [`LivenessState`] shared by signal ingestion and evaluation.
#[derive(Debug)]
pub struct SignalStore {
    state: Mutex<LivenessState>,
    threshold: u32,
}

impl SignalStore {
    pub fn new(initial_signal_at: DateTime<Utc>, threshold: u32) -> Self {
        Self { state: Mutex::new(LivenessState::new(initial_signal_at)), threshold }
    }

    pub fn threshold(&self) -> u32 {
        effective_threshold(self.threshold)
    }

    pub fn record_signal(&self, at: DateTime<Utc>) {
        self.lock().observe_signal(at);
    }

    /// Count a failure and return the state as it stands afterwards
    pub fn record_failure(&self, at: DateTime<Utc>) -> LivenessState {
        let mut state = self.lock();
        state.observe_failure(at, self.threshold);
        state.clone()
    }

    pub fn snapshot(&self) -> LivenessState {
        self.lock().clone()
    }

    /// Run `f` with exclusive access, for read-then-update evaluations.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut LivenessState, u32) -> R) -> R {
        let mut state = self.lock();
        f(&mut state, self.threshold)
    }

    // The state is plain data, a panic mid-update cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, LivenessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
