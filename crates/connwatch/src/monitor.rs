//! Periodic evaluation loop.
//!
//! # Responsibilities
//! - Tick at the heartbeat interval
//! - Ask the detector for a verdict
//! - Feed the verdict to the dispatcher; deliveries run in the background

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::detector::Detector;
use crate::notify::{AlertState, Dispatch, Dispatcher};

pub struct Monitor {
    detector: Arc<dyn Detector>,
    dispatcher: Dispatcher,
    interval: Duration,
}

impl Monitor {
    pub fn new(detector: Arc<dyn Detector>, dispatcher: Dispatcher, interval: Duration) -> Self {
        Self { detector, dispatcher, interval }
    }

    pub fn alert_state(&self) -> AlertState {
        self.dispatcher.state()
    }

    /// One evaluation. Returns the fan-out started by a transition, if any.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Option<Dispatch> {
        tracing::debug!(detector = self.detector.kind(), "checking status");
        match self.detector.evaluate(now).await {
            Ok(()) => {
                tracing::debug!("connection up");
                self.dispatcher.up(now)
            }
            Err(verdict) => {
                tracing::warn!(error = %verdict, failures = verdict.consecutive_failures(), "connection down");
                self.dispatcher.down(&verdict)
            }
        }
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            detector = self.detector.kind(),
            interval_ms = self.interval.as_millis() as u64,
            "Evaluation loop starting"
        );

        let mut ticker = time::interval(self.interval);
        // an active probe may take longer than a short interval
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // fan-out is detached; a slow provider never delays the next tick
                    let _ = self.tick(Utc::now()).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Evaluation loop received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
