use async_trait::async_trait;
use thiserror::Error;

/// Provider-assigned identifier of a delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} rejected the message (status {status}): {detail}")]
    Rejected { provider: &'static str, status: u16, detail: String },

    #[error("{provider} returned an unreadable response: {detail}")]
    UnexpectedResponse { provider: &'static str, detail: String },

    #[error("failed to build {provider} client: {source}")]
    Setup {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// An outbound message channel.
///
/// One call is one attempt; implementations never retry.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<MessageId, DeliveryError>;
}

/// Build a `reqwest::Client` with the bounded per-call timeout every
/// provider shares.
pub(crate) fn http_client(
    provider: &'static str,
    timeout: std::time::Duration,
) -> Result<reqwest::Client, DeliveryError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| DeliveryError::Setup { provider, source })
}
