//! Shared helpers for the connwatch integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use connwatch::LibsqlDirectory;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Fixed epoch so timestamps read as small offsets in assertions
pub fn at(secs: f64) -> DateTime<Utc> {
    let base = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    base + TimeDelta::milliseconds((secs * 1000.0).round() as i64)
}

/// Directory over a fresh database file. Keep the `TempDir` alive for the
/// duration of the test.
pub async fn create_test_directory() -> anyhow::Result<(LibsqlDirectory, TempDir, PathBuf)> {
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("connwatch.db");
    let directory = LibsqlDirectory::open(&db_path).await?;
    Ok((directory, temp_dir, db_path))
}

/// A one-shot HTTP server answering a single request with `status` and
/// `body`. The join handle yields the raw request (head and body).
pub async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        let response = format!(
            "HTTP/1.1 {status} Whatever\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (base, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}
