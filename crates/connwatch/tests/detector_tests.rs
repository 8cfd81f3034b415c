//! Tests for the passive and active detectors

mod common;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::at;
use connwatch::detector::{ActiveDetector, PassiveDetector, Probe, ProbeError};
use connwatch::{Detector, DownError};

fn passive(interval_ms: u64, grace_ms: u64, threshold: u32) -> PassiveDetector {
    PassiveDetector::new(
        at(0.0),
        Duration::from_millis(interval_ms),
        Duration::from_millis(grace_ms),
        threshold,
    )
}

#[tokio::test]
async fn test_passive_up_iff_within_interval_plus_grace() {
    let detector = passive(1000, 500, 3);

    for signal in [0.0, 1.0, 2.0, 7.25, 30.0] {
        detector.record_signal(at(signal));

        for offset in [0.0, 0.5, 1.0, 1.499, 1.5] {
            assert!(detector.evaluate(at(signal + offset)).await.is_ok(), "offset {offset} should be up");
        }
        for offset in [1.501, 2.0, 10.0] {
            assert!(detector.evaluate(at(signal + offset)).await.is_err(), "offset {offset} should be down");
        }
    }
}

#[tokio::test]
async fn test_passive_silence_then_recovery_scenario() {
    let detector = passive(1000, 500, 3);
    for t in [0.0, 1.0, 2.0] {
        detector.record_signal(at(t));
    }

    // exactly interval + grace after the last ping is still up
    assert!(detector.evaluate(at(3.5)).await.is_ok());
    let verdict = detector.evaluate(at(3.6)).await.unwrap_err();
    assert!(matches!(verdict, DownError::Silent { .. }));

    detector.record_signal(at(4.0));
    assert!(detector.evaluate(at(4.2)).await.is_ok());
    assert_eq!(detector.snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn test_passive_down_verdicts_debounce_for_dispatch() {
    let detector = passive(1000, 0, 3);
    detector.record_signal(at(0.0));

    let first = detector.evaluate(at(2.0)).await.unwrap_err();
    let second = detector.evaluate(at(3.0)).await.unwrap_err();
    let third = detector.evaluate(at(4.0)).await.unwrap_err();
    let fourth = detector.evaluate(at(5.0)).await.unwrap_err();

    assert!(!first.is_debounced());
    assert!(!second.is_debounced());
    assert_eq!(third.down_since(), Some(at(4.0)));
    assert_eq!(fourth.down_since(), Some(at(4.0)));
    assert_eq!(fourth.consecutive_failures(), 4);

    let state = detector.snapshot();
    assert_eq!(state.down_since, Some(at(4.0)));

    detector.record_signal(at(5.5));
    let state = detector.snapshot();
    assert_eq!(state.consecutive_failures, 0);
    assert_eq!(state.down_since, None);
}

#[tokio::test]
async fn test_passive_concurrent_signals_are_not_lost() {
    let detector = Arc::new(passive(1000, 500, 3));
    detector.record_signal(at(0.0));

    let mut tasks = Vec::new();
    for i in 1..=50 {
        let detector = detector.clone();
        tasks.push(tokio::spawn(async move {
            detector.record_signal(at(100.0));
            let _ = detector.evaluate(at(i as f64 * 0.01)).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // whatever the interleaving, the newest signal survives and resets the count
    detector.record_signal(at(100.0));
    assert!(detector.evaluate(at(100.1)).await.is_ok());
    assert_eq!(detector.snapshot().consecutive_failures, 0);
}

/// Probe replaying a fixed script of outcomes
struct ScriptedProbe {
    outcomes: Mutex<VecDeque<bool>>,
}

impl ScriptedProbe {
    fn new(outcomes: &[bool]) -> Box<Self> {
        Box::new(Self { outcomes: Mutex::new(outcomes.iter().copied().collect()) })
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self) -> Result<Duration, ProbeError> {
        let ok = self.outcomes.lock().unwrap().pop_front().expect("probe script exhausted");
        if ok {
            Ok(Duration::from_millis(3))
        } else {
            Err(ProbeError::Timeout(Duration::from_secs(2)))
        }
    }

    fn target(&self) -> &str {
        "peer.example:443"
    }
}

#[tokio::test]
async fn test_active_needs_threshold_consecutive_failures() {
    let detector =
        ActiveDetector::new(at(0.0), ScriptedProbe::new(&[false, false, false, false]), 3);

    assert!(detector.evaluate(at(1.0)).await.is_ok());
    assert!(detector.evaluate(at(2.0)).await.is_ok());
    assert_eq!(detector.snapshot().consecutive_failures, 2);

    match detector.evaluate(at(3.0)).await {
        Err(DownError::Unreachable { consecutive_failures, down_since, target, .. }) => {
            assert_eq!(consecutive_failures, 3);
            assert_eq!(down_since, at(3.0));
            assert_eq!(target, "peer.example:443");
        }
        other => panic!("expected unreachable, got {other:?}"),
    }
    assert!(detector.evaluate(at(4.0)).await.is_err());
}

#[tokio::test]
async fn test_active_single_success_resets() {
    let detector = ActiveDetector::new(
        at(0.0),
        ScriptedProbe::new(&[false, false, true, false, false, false, true]),
        3,
    );

    assert!(detector.evaluate(at(1.0)).await.is_ok());
    assert!(detector.evaluate(at(2.0)).await.is_ok());
    assert!(detector.evaluate(at(3.0)).await.is_ok());
    assert_eq!(detector.snapshot().consecutive_failures, 0);
    assert_eq!(detector.snapshot().last_signal_at, at(3.0));

    assert!(detector.evaluate(at(4.0)).await.is_ok());
    assert!(detector.evaluate(at(5.0)).await.is_ok());
    assert!(detector.evaluate(at(6.0)).await.is_err());
    // up again on the very next success
    assert!(detector.evaluate(at(7.0)).await.is_ok());
    assert_eq!(detector.snapshot().down_since, None);
}

#[tokio::test]
async fn test_active_zero_threshold_is_down_after_first_miss() {
    let detector = ActiveDetector::new(at(0.0), ScriptedProbe::new(&[false]), 0);
    let verdict = detector.evaluate(at(1.0)).await.unwrap_err();
    assert_eq!(verdict.down_since(), Some(at(1.0)));
}
