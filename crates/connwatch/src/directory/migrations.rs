use chrono::Utc;
use libsql::Connection;

use super::DirectoryError;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 2;

/// Bring the schema up to [`SCHEMA_VERSION`]. Safe to run on every start.
pub async fn run_migrations(conn: &Connection) -> Result<(), DirectoryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    let current_version = get_current_version(conn).await?;

    if current_version >= SCHEMA_VERSION {
        tracing::debug!(version = current_version, "database schema is up to date");
        return Ok(());
    }

    tracing::info!(from = current_version, to = SCHEMA_VERSION, "running migrations");

    if current_version < 1 {
        run_migration_v1(conn).await?;
        record_migration(conn, 1, "Subscriptions").await?;
    }

    if current_version < 2 {
        run_migration_v2(conn).await?;
        record_migration(conn, 2, "Down record audit trail").await?;
    }

    Ok(())
}

async fn get_current_version(conn: &Connection) -> Result<i32, DirectoryError> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    match rows.next().await? {
        Some(row) => Ok(row.get::<Option<i32>>(0)?.unwrap_or(0)),
        None => Ok(0),
    }
}

async fn record_migration(
    conn: &Connection,
    version: i32,
    description: &str,
) -> Result<(), DirectoryError> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        libsql::params![version, Utc::now().timestamp(), description],
    )
    .await?;

    tracing::info!("Applied migration v{}: {}", version, description);
    Ok(())
}

/// Migration v1: subscriptions keyed by (channel, endpoint)
async fn run_migration_v1(conn: &Connection) -> Result<(), DirectoryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscriptions (
            channel TEXT NOT NULL,
            endpoint TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (channel, endpoint)
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_channel_status ON subscriptions(channel, status)",
        (),
    )
    .await?;

    Ok(())
}

/// Migration v2: one row per down episode, closed when the link recovers
async fn run_migration_v2(conn: &Connection) -> Result<(), DirectoryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS down_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            down_at INTEGER NOT NULL UNIQUE,
            down_reason TEXT NOT NULL,
            up_at INTEGER
        )",
        (),
    )
    .await?;

    Ok(())
}
