//! # Webhook Publisher
//!
//! Concrete HTTP delivery strategy. Posts a JSON envelope to the endpoint
//! configured on the integration, retrying in-call on connection failures
//! and 5xx responses; 4xx is a client misconfiguration and terminal.
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "event_type": "publish_articles",
//!   "timestamp": "<ISO-8601>",
//!   "data": { "articles": [ ... ] }
//! }
//! ```

use super::Publisher;
use crate::constants::{
    DEFAULT_WEBHOOK_RETRY_DELAY_MS, DEFAULT_WEBHOOK_RETRY_TIMES, DEFAULT_WEBHOOK_TIMEOUT_SECS,
    MASKED_HEADER_VALUE, WEBHOOK_USER_AGENT,
};
use crate::models::{Article, FailureKind, Integration, IntegrationType, PublishResult};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Header names whose values are masked in audit output.
const SENSITIVE_HEADERS: [&str; 4] = ["authorization", "x-api-key", "api-key", "x-auth-token"];

/// Per-call delivery settings resolved from the integration.
#[derive(Debug, Clone)]
struct WebhookSettings {
    url: String,
    timeout: Duration,
    retry_times: u32,
    retry_delay: Duration,
    custom_headers: HashMap<String, String>,
}

impl WebhookSettings {
    fn from_integration(integration: &Integration) -> Option<Self> {
        let url = integration.setting_str("webhook_url")?.to_string();
        let timeout = Duration::from_secs(
            integration
                .setting_u64("timeout")
                .unwrap_or(DEFAULT_WEBHOOK_TIMEOUT_SECS),
        );
        let retry_times = integration
            .setting_u64("retry_times")
            .unwrap_or(u64::from(DEFAULT_WEBHOOK_RETRY_TIMES)) as u32;
        let retry_delay = Duration::from_millis(
            integration
                .setting_u64("retry_delay")
                .unwrap_or(DEFAULT_WEBHOOK_RETRY_DELAY_MS),
        );
        let custom_headers = integration
            .settings
            .get("headers")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            url,
            timeout,
            retry_times: retry_times.max(1),
            retry_delay,
            custom_headers,
        })
    }
}

/// HTTP delivery strategy for [`IntegrationType::Webhook`].
pub struct WebhookPublisher {
    client: reqwest::Client,
}

impl WebhookPublisher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn deliver(&self, payload: Value, integration: &Integration) -> PublishResult {
        let Some(settings) = WebhookSettings::from_integration(integration) else {
            return PublishResult::failure("Webhook URL is not configured")
                .with_kind(FailureKind::Validation);
        };

        let body = payload.to_string();
        let request_headers = self.request_headers(integration, &settings);

        let mut last_result = PublishResult::failure("Webhook delivery never attempted")
            .with_kind(FailureKind::Connection);

        for attempt in 1..=settings.retry_times {
            debug!(
                integration_id = %integration.id,
                url = %settings.url,
                attempt,
                "Sending webhook request"
            );

            let mut request = self
                .client
                .post(&settings.url)
                .timeout(settings.timeout)
                .body(body.clone());
            for (name, value) in &request_headers {
                request = request.header(name, value);
            }

            last_result = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let response_headers = headers_to_map(response.headers());
                    let response_body = response.text().await.unwrap_or_default();
                    let result = self.handle_response(
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown"),
                        &response_body,
                    );
                    result
                        .with_response_body(response_body)
                        .with_response_headers(sanitize_headers(&response_headers))
                }
                Err(error) => {
                    warn!(
                        integration_id = %integration.id,
                        attempt,
                        error = %error,
                        "Webhook connection failure"
                    );
                    PublishResult::failure(format!("Connection error: {error}"))
                        .with_kind(FailureKind::Connection)
                }
            };

            let retryable = last_result
                .classify()
                .is_some_and(|kind| kind.is_retryable());
            if last_result.is_successful() || !retryable {
                break;
            }
            if attempt < settings.retry_times {
                tokio::time::sleep(settings.retry_delay).await;
            }
        }

        last_result
            .with_payload(body)
            .with_request("POST", settings.url)
            .with_request_headers(sanitize_headers(&request_headers))
    }

    fn request_headers(
        &self,
        integration: &Integration,
        settings: &WebhookSettings,
    ) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", integration.credentials),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("User-Agent".to_string(), WEBHOOK_USER_AGENT.to_string());
        for (name, value) in &settings.custom_headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    fn handle_response(&self, status: u16, reason: &str, body: &str) -> PublishResult {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        if (200..300).contains(&status) {
            let (external_id, external_url) = extract_external_reference(parsed.as_ref());
            return PublishResult::success(external_id, external_url).with_http_status(status);
        }

        let message = extract_error_message(status, reason, parsed.as_ref());
        let kind = if (400..500).contains(&status) {
            FailureKind::Client
        } else {
            FailureKind::Server
        };
        PublishResult::failure(message)
            .with_http_status(status)
            .with_kind(kind)
    }
}

impl Default for WebhookPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    fn integration_type(&self) -> IntegrationType {
        IntegrationType::Webhook
    }

    fn validate_credentials(&self, integration: &Integration) -> Vec<String> {
        let mut errors = Vec::new();
        match integration.setting_str("webhook_url") {
            None => errors.push("webhook_url setting is required".to_string()),
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                errors.push(format!("webhook_url is not a valid HTTP URL: {url}"));
            }
            Some(_) => {}
        }
        if integration.credentials.trim().is_empty() {
            errors.push("bearer token is required".to_string());
        }
        errors
    }

    async fn publish(&self, articles: &[Article], integration: &Integration) -> PublishResult {
        let payload = json!({
            "event_type": "publish_articles",
            "timestamp": Utc::now().to_rfc3339(),
            "data": { "articles": articles },
        });
        self.deliver(payload, integration).await
    }

    async fn test_connection(&self, integration: &Integration) -> PublishResult {
        let payload = json!({
            "event_type": "test",
            "timestamp": Utc::now().to_rfc3339(),
            "data": { "articles": [Article::test_article()] },
        });
        self.deliver(payload, integration).await
    }
}

/// External id/url from a success body: top-level `id`/`url`, falling back
/// to nested `data.id`/`data.url`.
fn extract_external_reference(body: Option<&Value>) -> (Option<String>, Option<String>) {
    let Some(body) = body else {
        return (None, None);
    };
    let lookup = |field: &str| -> Option<String> {
        body.get(field)
            .or_else(|| body.get("data").and_then(|data| data.get(field)))
            .map(value_to_string)
    };
    (lookup("id"), lookup("url"))
}

/// Error message extraction precedence: `message`, then `error`, then
/// `errors` (joined), else a synthesized `HTTP {status}: {reason}`.
fn extract_error_message(status: u16, reason: &str, body: Option<&Value>) -> String {
    if let Some(body) = body {
        if let Some(message) = body.get("message") {
            return value_to_string(message);
        }
        if let Some(error) = body.get("error") {
            return value_to_string(error);
        }
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return errors
                    .iter()
                    .map(value_to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
            }
        }
    }
    format!("HTTP {status}: {reason}")
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn headers_to_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<non-ascii>").to_string(),
            )
        })
        .collect()
}

/// Mask sensitive header values for audit/debug display.
///
/// `Bearer <token>` keeps its scheme prefix so the auth style stays visible;
/// everything else sensitive is replaced wholesale.
pub fn sanitize_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked = if SENSITIVE_HEADERS.contains(&name.to_lowercase().as_str()) {
                if value.to_lowercase().starts_with("bearer ") {
                    format!("{} {MASKED_HEADER_VALUE}", &value[..6])
                } else {
                    MASKED_HEADER_VALUE.to_string()
                }
            } else {
                value.clone()
            };
            (name.clone(), masked)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_sanitize_masks_bearer_preserving_prefix() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc123".to_string());
        headers.insert("X-API-Key".to_string(), "xyz".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let sanitized = sanitize_headers(&headers);
        assert_eq!(
            sanitized.get("Authorization").unwrap(),
            &format!("Bearer {MASKED_HEADER_VALUE}")
        );
        assert_eq!(sanitized.get("X-API-Key").unwrap(), MASKED_HEADER_VALUE);
        assert_eq!(sanitized.get("Content-Type").unwrap(), "application/json");
    }

    #[test]
    fn test_sanitize_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("AUTHORIZATION".to_string(), "bearer tok".to_string());
        headers.insert("x-auth-token".to_string(), "tok".to_string());

        let sanitized = sanitize_headers(&headers);
        assert_eq!(
            sanitized.get("AUTHORIZATION").unwrap(),
            &format!("bearer {MASKED_HEADER_VALUE}")
        );
        assert_eq!(sanitized.get("x-auth-token").unwrap(), MASKED_HEADER_VALUE);
    }

    #[test]
    fn test_extract_external_reference_top_level_and_nested() {
        let top = serde_json::json!({"id": 42, "url": "https://x/posts/42"});
        let (id, url) = extract_external_reference(Some(&top));
        assert_eq!(id.as_deref(), Some("42"));
        assert_eq!(url.as_deref(), Some("https://x/posts/42"));

        let nested = serde_json::json!({"data": {"id": "abc", "url": "https://x/abc"}});
        let (id, url) = extract_external_reference(Some(&nested));
        assert_eq!(id.as_deref(), Some("abc"));
        assert_eq!(url.as_deref(), Some("https://x/abc"));

        assert_eq!(extract_external_reference(None), (None, None));
    }

    #[test]
    fn test_error_message_precedence() {
        let with_message = serde_json::json!({"message": "quota exceeded", "error": "other"});
        assert_eq!(
            extract_error_message(422, "Unprocessable Entity", Some(&with_message)),
            "quota exceeded"
        );

        let with_error = serde_json::json!({"error": {"code": 9}});
        assert_eq!(
            extract_error_message(500, "Internal Server Error", Some(&with_error)),
            "{\"code\":9}"
        );

        let with_errors = serde_json::json!({"errors": ["a", "b"]});
        assert_eq!(
            extract_error_message(400, "Bad Request", Some(&with_errors)),
            "a; b"
        );

        assert_eq!(
            extract_error_message(503, "Service Unavailable", None),
            "HTTP 503: Service Unavailable"
        );
    }

    #[test]
    fn test_validate_credentials() {
        let publisher = WebhookPublisher::new();

        let missing_all = Integration::new(Uuid::new_v4(), IntegrationType::Webhook);
        let errors = publisher.validate_credentials(&missing_all);
        assert_eq!(errors.len(), 2);

        let valid = Integration::new(Uuid::new_v4(), IntegrationType::Webhook)
            .with_credentials("token")
            .with_setting("webhook_url", serde_json::json!("https://example.com/hook"));
        assert!(publisher.validate_credentials(&valid).is_empty());

        let bad_url = Integration::new(Uuid::new_v4(), IntegrationType::Webhook)
            .with_credentials("token")
            .with_setting("webhook_url", serde_json::json!("ftp://example.com"));
        assert_eq!(publisher.validate_credentials(&bad_url).len(), 1);
    }

    #[test]
    fn test_settings_defaults() {
        let integration = Integration::new(Uuid::new_v4(), IntegrationType::Webhook)
            .with_setting("webhook_url", serde_json::json!("https://example.com/hook"));
        let settings = WebhookSettings::from_integration(&integration).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.retry_times, 3);
        assert_eq!(settings.retry_delay, Duration::from_millis(100));
        assert!(settings.custom_headers.is_empty());
    }

    #[test]
    fn test_4xx_is_terminal_5xx_is_retryable() {
        let publisher = WebhookPublisher::new();

        let not_found = publisher.handle_response(404, "Not Found", "");
        assert_eq!(not_found.classify(), Some(FailureKind::Client));
        assert!(!not_found.classify().unwrap().is_retryable());

        let unavailable = publisher.handle_response(503, "Service Unavailable", "");
        assert_eq!(unavailable.classify(), Some(FailureKind::Server));
        assert!(unavailable.classify().unwrap().is_retryable());
    }
}
