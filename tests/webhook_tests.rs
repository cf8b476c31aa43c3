//! Webhook publisher tests against a local scripted HTTP stub.
//!
//! The stub is a plain TCP listener serving one canned response per
//! connection, so the retry loop's exact request count is observable.

use pressroom_core::models::{Article, FailureKind, Integration, IntegrationType};
use pressroom_core::publisher::{Publisher, WebhookPublisher};
use serde_json::json;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Scripted HTTP/1.1 stub. Serves the scripted responses in order, then
/// falls back to `200 {}`; records every raw request.
struct StubServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(Mutex::new(VecDeque::from(responses)));

        let hit_counter = Arc::clone(&hits);
        let request_log = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let raw = match read_request(&mut socket).await {
                    Some(raw) => raw,
                    None => continue,
                };
                hit_counter.fetch_add(1, Ordering::SeqCst);
                request_log.lock().unwrap().push(raw);

                let (status, body) = script
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or((200, "{}".to_string()));
                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    422 => "Unprocessable Entity",
                    500 => "Internal Server Error",
                    503 => "Service Unavailable",
                    _ => "Unknown",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            addr,
            hits,
            requests,
        }
    }

    fn url(&self) -> String {
        format!("http://{}/hooks/articles", self.addr)
    }

    fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn recorded_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read one full HTTP request (head plus Content-Length body) off the socket.
async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(head_end) = find_subsequence(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.trim()
                        .eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }
    if buf.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&buf).to_string())
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn webhook_integration(url: String) -> Integration {
    Integration::new(uuid::Uuid::new_v4(), IntegrationType::Webhook)
        .with_credentials("secret-token")
        .with_setting("webhook_url", json!(url))
        .with_setting("retry_delay", json!(10))
}

#[tokio::test]
async fn test_retries_server_errors_then_succeeds() {
    let server = StubServer::start(vec![
        (503, "{}".to_string()),
        (503, "{}".to_string()),
        (
            200,
            json!({ "id": "ext-42", "url": "https://example.com/posts/42" }).to_string(),
        ),
    ])
    .await;

    let publisher = WebhookPublisher::new();
    let integration = webhook_integration(server.url());
    let articles = [Article::new("launch post", "launch-post")];

    let result = publisher.publish(&articles, &integration).await;

    assert!(result.is_successful());
    assert_eq!(result.external_id.as_deref(), Some("ext-42"));
    assert_eq!(
        result.external_url.as_deref(),
        Some("https://example.com/posts/42")
    );
    assert_eq!(result.http_status, Some(200));
    // Two 503s consumed two retries; the third request landed.
    assert_eq!(server.hit_count(), 3);
}

#[tokio::test]
async fn test_client_error_fails_without_retry() {
    let server = StubServer::start(vec![(
        404,
        json!({ "message": "unknown endpoint" }).to_string(),
    )])
    .await;

    let publisher = WebhookPublisher::new();
    let integration = webhook_integration(server.url());
    let articles = [Article::new("launch post", "launch-post")];

    let result = publisher.publish(&articles, &integration).await;

    assert!(!result.is_successful());
    assert_eq!(result.http_status, Some(404));
    assert_eq!(result.error_message.as_deref(), Some("unknown endpoint"));
    assert_eq!(result.classify(), Some(FailureKind::Client));
    assert_eq!(server.hit_count(), 1);
}

#[tokio::test]
async fn test_publish_sends_envelope_and_bearer_auth() {
    let server = StubServer::start(vec![(200, "{}".to_string())]).await;

    let publisher = WebhookPublisher::new();
    let integration = webhook_integration(server.url())
        .with_setting("headers", json!({ "X-Project": "pressroom" }));
    let articles = [Article::new("launch post", "launch-post")];

    let result = publisher.publish(&articles, &integration).await;
    assert!(result.is_successful());

    let requests = server.recorded_requests();
    assert_eq!(requests.len(), 1);
    let raw = requests[0].to_lowercase();
    assert!(raw.contains("post /hooks/articles http/1.1"));
    assert!(raw.contains("authorization: bearer secret-token"));
    assert!(raw.contains("x-project: pressroom"));
    assert!(raw.contains("\"event_type\":\"publish_articles\""));
    assert!(raw.contains("\"launch-post\""));

    // The audit copy masks the token but keeps the scheme visible.
    assert_eq!(
        result.request_headers.get("Authorization").map(String::as_str),
        Some("Bearer ••••••••")
    );
}

#[tokio::test]
async fn test_connection_probe_uses_test_event() {
    let server = StubServer::start(vec![(200, "{}".to_string())]).await;

    let publisher = WebhookPublisher::new();
    let integration = webhook_integration(server.url());

    let result = publisher.test_connection(&integration).await;
    assert!(result.is_successful());

    let requests = server.recorded_requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains("\"event_type\":\"test\""));
}

#[tokio::test]
async fn test_connection_refused_is_a_connection_failure() {
    // Bind and immediately drop a listener to get a port nothing serves.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let publisher = WebhookPublisher::new();
    let integration = webhook_integration(format!("http://{addr}/hooks/articles"))
        .with_setting("retry_times", json!(2));
    let articles = [Article::new("launch post", "launch-post")];

    let result = publisher.publish(&articles, &integration).await;

    assert!(!result.is_successful());
    assert_eq!(result.classify(), Some(FailureKind::Connection));
    assert!(result
        .error_message
        .as_deref()
        .unwrap_or_default()
        .starts_with("Connection error"));
}
