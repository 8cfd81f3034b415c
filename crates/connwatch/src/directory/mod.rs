//! Subscriber directory backed by a durable store.
//!
//! Subscriptions are keyed by (channel, endpoint), upserted on subscribe and
//! flipped to inactive on unsubscribe so history is kept. The directory also
//! holds the down-record audit trail. Endpoint syntax is checked by the HTTP
//! boundary, never here.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod repository;

pub use models::{Channel, DownRecord, Subscription, SubscriptionStatus};
pub use pool::{LibsqlManager, LibsqlPool};
pub use repository::LibsqlDirectory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("storage error: {0}")]
    Storage(#[from] libsql::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Durable subscriber list and audit trail
#[async_trait]
pub trait Directory: Send + Sync {
    /// Create or reactivate a subscription. Idempotent.
    async fn subscribe(&self, channel: Channel, endpoint: &str) -> Result<(), DirectoryError>;

    /// Mark a subscription inactive. Unknown subscriptions are a no-op.
    async fn unsubscribe(&self, channel: Channel, endpoint: &str) -> Result<(), DirectoryError>;

    /// Active subscriptions of a channel in storage order. Malformed records
    /// are skipped rather than failing the whole listing.
    async fn list_active(&self, channel: Channel) -> Result<Vec<Subscription>, DirectoryError>;

    /// Open a down record for the episode starting at `at`
    async fn record_down(&self, at: DateTime<Utc>, reason: &str) -> Result<(), DirectoryError>;

    /// Close the down record that started at `down_at`
    async fn record_up(
        &self,
        down_at: DateTime<Utc>,
        up_at: DateTime<Utc>,
    ) -> Result<(), DirectoryError>;
}
