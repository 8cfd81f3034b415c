use std::io;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::ProbeAddr;

/// Fixed bound on a single connectivity probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(#[from] io::Error),
}

/// A connectivity check against the watched peer
#[async_trait]
pub trait Probe: Send + Sync {
    /// Perform the check and return how long it took
    async fn probe(&self) -> Result<Duration, ProbeError>;

    /// What is being probed, for logs and messages
    fn target(&self) -> &str;
}

/// Opens and immediately closes a TCP connection
pub struct TcpProbe {
    addr: ProbeAddr,
    timeout_duration: Duration,
}

impl TcpProbe {
    pub fn new(addr: ProbeAddr, timeout_duration: Duration) -> Self {
        Self { addr, timeout_duration }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self) -> Result<Duration, ProbeError> {
        let start = Instant::now();

        let connect = tokio::net::TcpStream::connect(self.addr.as_str());
        let stream = timeout(self.timeout_duration, connect)
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout_duration))??;
        drop(stream);

        Ok(start.elapsed())
    }

    fn target(&self) -> &str {
        self.addr.as_str()
    }
}
