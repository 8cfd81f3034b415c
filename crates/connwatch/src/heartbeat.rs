//! Sender mode: announce ourselves to the monitoring server.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SenderConfig;

/// Idle keep-alive connections kept towards the server
const MAX_IDLE_CONNECTIONS: usize = 20;

#[derive(Debug, Error)]
pub enum HeartbeatError {
    #[error("failed to build http client: {0}")]
    Setup(#[source] reqwest::Error),

    #[error("failed to send ping: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code while sending ping: {0}")]
    UnexpectedStatus(u16),
}

/// Periodically sends `GET /ping` to the monitoring server
pub struct Heartbeat {
    client: reqwest::Client,
    ping_url: Url,
    interval: Duration,
}

impl Heartbeat {
    pub fn new(config: &SenderConfig) -> Result<Self, HeartbeatError> {
        // a ping slower than one interval is as good as a missing one
        let client = reqwest::Client::builder()
            .timeout(config.heartbeat_interval)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .build()
            .map_err(HeartbeatError::Setup)?;

        Ok(Self { client, ping_url: config.ping_url(), interval: config.heartbeat_interval })
    }

    pub fn ping_url(&self) -> &Url {
        &self.ping_url
    }

    /// Send a single ping
    pub async fn beat(&self) -> Result<(), HeartbeatError> {
        let response = self.client.get(self.ping_url.clone()).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(HeartbeatError::UnexpectedStatus(status.as_u16()));
        }
        Ok(())
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(target_url = %self.ping_url, interval_ms = self.interval.as_millis() as u64, "Heartbeat starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!(target_url = %self.ping_url, "sending ping");
                    match self.beat().await {
                        Ok(()) => debug!("ping sent"),
                        Err(e) => warn!(error = %e, "ping failed"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Heartbeat received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
