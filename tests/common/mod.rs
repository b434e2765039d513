// tests/common/mod.rs
//! Canned-response HTTP server for fetcher tests: accepts connections on an
//! ephemeral port, reads the request head, and answers with whatever the
//! responder closure produces. Connections are closed after each response so
//! every fetch attempt shows up as one accepted connection.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct MockFeedServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl MockFeedServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub async fn spawn_server<F>(respond: F) -> MockFeedServer
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let hit_counter = Arc::clone(&hits);
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            hit_counter.fetch_add(1, Ordering::SeqCst);
            let respond = Arc::clone(&respond);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let response = respond(&request);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockFeedServer {
        url: format!("http://{addr}/feed.xml"),
        hits,
    }
}

/// A bound-then-dropped listener's port: connecting is refused immediately.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/feed.xml")
}

pub fn http_ok(body: &str) -> String {
    http_ok_with_headers(body, &[])
}

pub fn http_ok_with_etag(body: &str, etag: &str) -> String {
    http_ok_with_headers(body, &[("ETag", etag)])
}

pub fn http_ok_with_headers(body: &str, extra: &[(&str, &str)]) -> String {
    let mut headers = String::new();
    for (name, value) in extra {
        headers.push_str(&format!("{name}: {value}\r\n"));
    }
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
        body.len(),
        headers,
        body
    )
}

pub fn http_not_modified() -> String {
    "HTTP/1.1 304 Not Modified\r\nConnection: close\r\n\r\n".to_string()
}

pub fn http_error(status: u16, reason: &str) -> String {
    format!("HTTP/1.1 {status} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
}

/// Build an RSS 2.0 body. `link` may be empty to produce a linkless item.
pub fn rss_feed(items: &[(&str, &str, DateTime<Utc>)]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>test feed</title>"#,
    );
    for (title, link, ts) in items {
        body.push_str("<item>");
        body.push_str(&format!("<title>{title}</title>"));
        if !link.is_empty() {
            body.push_str(&format!("<link>{link}</link>"));
        }
        body.push_str(&format!("<pubDate>{}</pubDate>", ts.to_rfc2822()));
        body.push_str("</item>");
    }
    body.push_str("</channel></rss>");
    body
}

pub fn recent(hours_ago: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::hours(hours_ago)
}
