//! Tests for the libsql-backed subscriber directory

mod common;

use std::sync::Arc;

use common::{at, create_test_directory};
use connwatch::directory::SubscriptionStatus;
use connwatch::{Channel, Directory};

const PHONE: &str = "+15551234567";

fn endpoints(subs: &[connwatch::Subscription]) -> Vec<&str> {
    subs.iter().map(|s| s.endpoint.as_str()).collect()
}

#[tokio::test]
async fn test_subscribe_twice_lists_once() -> anyhow::Result<()> {
    let (directory, _dir, _) = create_test_directory().await?;

    directory.subscribe(Channel::Sms, PHONE).await?;
    directory.subscribe(Channel::Sms, PHONE).await?;

    let active = directory.list_active(Channel::Sms).await?;
    assert_eq!(endpoints(&active), vec![PHONE]);
    assert_eq!(active[0].status, SubscriptionStatus::Active);
    assert_eq!(active[0].channel, Channel::Sms);
    Ok(())
}

#[tokio::test]
async fn test_subscribe_then_unsubscribe_is_empty() -> anyhow::Result<()> {
    let (directory, _dir, _) = create_test_directory().await?;

    directory.subscribe(Channel::Sms, PHONE).await?;
    directory.unsubscribe(Channel::Sms, PHONE).await?;

    assert!(directory.list_active(Channel::Sms).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unsubscribe_unknown_is_noop() -> anyhow::Result<()> {
    let (directory, _dir, _) = create_test_directory().await?;
    directory.subscribe(Channel::Sms, "+4915112345678").await?;

    directory.unsubscribe(Channel::Sms, PHONE).await?;

    let active = directory.list_active(Channel::Sms).await?;
    assert_eq!(endpoints(&active), vec!["+4915112345678"]);
    Ok(())
}

#[tokio::test]
async fn test_resubscribe_reactivates_without_duplicate() -> anyhow::Result<()> {
    let (directory, _dir, db_path) = create_test_directory().await?;

    directory.subscribe(Channel::Sms, PHONE).await?;
    directory.unsubscribe(Channel::Sms, PHONE).await?;
    directory.subscribe(Channel::Sms, PHONE).await?;

    assert_eq!(endpoints(&directory.list_active(Channel::Sms).await?), vec![PHONE]);

    // history is kept as a single row, never physically deleted
    let conn = libsql::Builder::new_local(&db_path).build().await?.connect()?;
    let mut rows = conn.query("SELECT COUNT(*) FROM subscriptions", ()).await?;
    let count: i64 = rows.next().await?.expect("count row").get(0)?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn test_malformed_record_is_skipped() -> anyhow::Result<()> {
    let (directory, _dir, db_path) = create_test_directory().await?;
    directory.subscribe(Channel::Sms, "+1000").await?;

    let conn = libsql::Builder::new_local(&db_path).build().await?.connect()?;
    conn.execute(
        "INSERT INTO subscriptions (channel, endpoint, status, created_at, updated_at)
         VALUES ('sms', '   ', 'active', 0, 0)",
        (),
    )
    .await?;

    directory.subscribe(Channel::Sms, "+2000").await?;

    let active = directory.list_active(Channel::Sms).await?;
    assert_eq!(endpoints(&active), vec!["+1000", "+2000"]);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_subscribes_do_not_interfere() -> anyhow::Result<()> {
    let (directory, _dir, _) = create_test_directory().await?;
    let directory = Arc::new(directory);

    let mut tasks = Vec::new();
    for i in 0..10 {
        let directory = directory.clone();
        tasks.push(tokio::spawn(async move {
            let endpoint = format!("+1555000{i:04}");
            directory.subscribe(Channel::Sms, &endpoint).await?;
            directory.subscribe(Channel::Sms, &endpoint).await
        }));
    }
    for task in tasks {
        task.await??;
    }

    let mut listed: Vec<String> =
        directory.list_active(Channel::Sms).await?.into_iter().map(|s| s.endpoint).collect();
    listed.sort();
    let expected: Vec<String> = (0..10).map(|i| format!("+1555000{i:04}")).collect();
    assert_eq!(listed, expected);
    Ok(())
}

#[tokio::test]
async fn test_down_records_open_and_close() -> anyhow::Result<()> {
    let (directory, _dir, _) = create_test_directory().await?;

    directory.record_down(at(10.0), "no ping received").await?;
    directory.record_down(at(50.0), "probe refused").await?;
    directory.record_up(at(10.0), at(25.5)).await?;

    let records = directory.recent_down_records(10).await?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].down_at, at(50.0));
    assert_eq!(records[0].up_at, None);
    assert_eq!(records[1].down_at, at(10.0));
    assert_eq!(records[1].reason, "no ping received");
    assert_eq!(records[1].up_at, Some(at(25.5)));
    Ok(())
}

#[tokio::test]
async fn test_reopening_keeps_data() -> anyhow::Result<()> {
    let (directory, _dir, db_path) = create_test_directory().await?;
    directory.subscribe(Channel::Sms, PHONE).await?;
    drop(directory);

    let reopened = connwatch::LibsqlDirectory::open(&db_path).await?;
    assert_eq!(endpoints(&reopened.list_active(Channel::Sms).await?), vec![PHONE]);
    Ok(())
}
