use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;
use tracing::{debug, warn};

use super::models::{from_micros, to_micros};
use super::pool::{LibsqlManager, LibsqlPool};
use super::{Channel, Directory, DirectoryError, DownRecord, Subscription, migrations};

const POOL_SIZE: usize = 8;

/// LibSQL directory implementation
pub struct LibsqlDirectory {
    pool: LibsqlPool,
}

impl LibsqlDirectory {
    /// Create a directory over an already initialised pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database file, build the pool and migrate.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let database = libsql::Builder::new_local(path).build().await?;
        let pool = LibsqlPool::builder(LibsqlManager::new(database))
            .max_size(POOL_SIZE)
            .build()
            .map_err(|e| DirectoryError::Pool(e.to_string()))?;

        let directory = Self::new_from_pool(pool);
        {
            let conn = directory.get_conn().await?;
            migrations::run_migrations(&conn).await?;
        }
        debug!(path = %path.display(), "directory opened");

        Ok(directory)
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>, DirectoryError> {
        self.pool.get().await.map_err(|e| DirectoryError::Pool(e.to_string()))
    }

    /// Most recent down records, newest first
    pub async fn recent_down_records(&self, limit: usize) -> Result<Vec<DownRecord>, DirectoryError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                "SELECT down_at, down_reason, up_at FROM down_records ORDER BY down_at DESC LIMIT ?",
                params![limit as i64],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(DownRecord {
                down_at: from_micros(row.get(0)?)?,
                reason: row.get(1)?,
                up_at: row.get::<Option<i64>>(2)?.map(from_micros).transpose()?,
            });
        }

        Ok(records)
    }
}

#[async_trait]
impl Directory for LibsqlDirectory {
    async fn subscribe(&self, channel: Channel, endpoint: &str) -> Result<(), DirectoryError> {
        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "INSERT INTO subscriptions (channel, endpoint, status, created_at, updated_at)
                 VALUES (?1, ?2, 'active', ?3, ?3)
                 ON CONFLICT (channel, endpoint)
                 DO UPDATE SET status = 'active', updated_at = excluded.updated_at",
                params![channel.as_str(), endpoint, to_micros(Utc::now())],
            )
            .await?;

        debug!(%channel, endpoint, changed, "subscription upserted");
        Ok(())
    }

    async fn unsubscribe(&self, channel: Channel, endpoint: &str) -> Result<(), DirectoryError> {
        let conn = self.get_conn().await?;
        let changed = conn
            .execute(
                "UPDATE subscriptions SET status = 'inactive', updated_at = ?3
                 WHERE channel = ?1 AND endpoint = ?2",
                params![channel.as_str(), endpoint, to_micros(Utc::now())],
            )
            .await?;

        if changed == 0 {
            debug!(%channel, endpoint, "unsubscribe for unknown endpoint ignored");
        }
        Ok(())
    }

    async fn list_active(&self, channel: Channel) -> Result<Vec<Subscription>, DirectoryError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(
                "SELECT channel, endpoint, status FROM subscriptions
                 WHERE channel = ?1 AND status = 'active' ORDER BY rowid",
                params![channel.as_str()],
            )
            .await?;

        let mut subscriptions = Vec::new();
        while let Some(row) = rows.next().await? {
            match Subscription::from_row(&row) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(e) => warn!(%channel, error = %e, "skipping malformed subscription"),
            }
        }

        Ok(subscriptions)
    }

    async fn record_down(&self, at: DateTime<Utc>, reason: &str) -> Result<(), DirectoryError> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO down_records (down_at, down_reason) VALUES (?1, ?2)
             ON CONFLICT (down_at) DO NOTHING",
            params![to_micros(at), reason],
        )
        .await?;
        Ok(())
    }

    async fn record_up(
        &self,
        down_at: DateTime<Utc>,
        up_at: DateTime<Utc>,
    ) -> Result<(), DirectoryError> {
        let conn = self.get_conn().await?;
        conn.execute(
            "UPDATE down_records SET up_at = ?2 WHERE down_at = ?1",
            params![to_micros(down_at), to_micros(up_at)],
        )
        .await?;
        Ok(())
    }
}
