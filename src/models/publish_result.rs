//! # Publish Result
//!
//! Transient outcome value returned by every publisher call. Publishers never
//! raise across the strategy boundary; the orchestrator only branches on the
//! result, then maps it into the Publication ledger row.

use crate::state_machine::PublicationStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Failure taxonomy used to decide retry vs. terminal handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing/malformed credentials, caught before any network call.
    Validation,
    /// 4xx response: a configuration problem, not worth retrying.
    Client,
    /// 5xx response: the remote may recover.
    Server,
    /// Network/timeout/DNS/TLS fault before a response arrived.
    Connection,
    /// Task-runner-level fault (timeout, panic) outside the publisher layer.
    Infrastructure,
}

impl FailureKind {
    /// Only server-side and connection failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server | Self::Connection)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Client => write!(f, "client"),
            Self::Server => write!(f, "server"),
            Self::Connection => write!(f, "connection"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// Outcome of a single publisher invocation, with full request/response audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub status: PublicationStatus,
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    pub error_message: Option<String>,
    pub payload: Option<String>,
    pub response_body: Option<String>,
    pub http_status: Option<u16>,
    pub request_method: Option<String>,
    pub request_url: Option<String>,
    pub request_headers: HashMap<String, String>,
    pub response_headers: HashMap<String, String>,
    /// Explicit classification hint set by the layer that produced the
    /// failure; derived from the HTTP status when absent.
    pub failure_kind: Option<FailureKind>,
}

impl PublishResult {
    fn base(status: PublicationStatus) -> Self {
        Self {
            status,
            external_id: None,
            external_url: None,
            error_message: None,
            payload: None,
            response_body: None,
            http_status: None,
            request_method: None,
            request_url: None,
            request_headers: HashMap::new(),
            response_headers: HashMap::new(),
            failure_kind: None,
        }
    }

    pub fn success(external_id: Option<String>, external_url: Option<String>) -> Self {
        let mut result = Self::base(PublicationStatus::Published);
        result.external_id = external_id;
        result.external_url = external_url;
        result
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let mut result = Self::base(PublicationStatus::Failed);
        result.error_message = Some(message.into());
        result
    }

    pub fn pending() -> Self {
        Self::base(PublicationStatus::Pending)
    }

    pub fn is_successful(&self) -> bool {
        self.status == PublicationStatus::Published
    }

    pub fn with_kind(mut self, kind: FailureKind) -> Self {
        self.failure_kind = Some(kind);
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    pub fn with_request(mut self, method: impl Into<String>, url: impl Into<String>) -> Self {
        self.request_method = Some(method.into());
        self.request_url = Some(url.into());
        self
    }

    pub fn with_request_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.request_headers = headers;
        self
    }

    pub fn with_response_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.response_headers = headers;
        self
    }

    /// Classify a failed result. Explicit hints win; otherwise the HTTP
    /// status decides; a failure with neither is an infrastructure fault.
    pub fn classify(&self) -> Option<FailureKind> {
        if self.is_successful() {
            return None;
        }
        if let Some(kind) = self.failure_kind {
            return Some(kind);
        }
        Some(match self.http_status {
            Some(code) if (400..500).contains(&code) => FailureKind::Client,
            Some(code) if code >= 500 => FailureKind::Server,
            _ => FailureKind::Infrastructure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let ok = PublishResult::success(Some("ext-1".into()), None);
        assert!(ok.is_successful());
        assert_eq!(ok.external_id.as_deref(), Some("ext-1"));

        let failed = PublishResult::failure("boom");
        assert!(!failed.is_successful());
        assert_eq!(failed.error_message.as_deref(), Some("boom"));

        let pending = PublishResult::pending();
        assert_eq!(pending.status, PublicationStatus::Pending);
    }

    #[test]
    fn test_classification_from_http_status() {
        assert_eq!(
            PublishResult::failure("nope").with_http_status(404).classify(),
            Some(FailureKind::Client)
        );
        assert_eq!(
            PublishResult::failure("nope").with_http_status(503).classify(),
            Some(FailureKind::Server)
        );
        assert_eq!(
            PublishResult::failure("nope").classify(),
            Some(FailureKind::Infrastructure)
        );
    }

    #[test]
    fn test_explicit_kind_wins() {
        let result = PublishResult::failure("no route to host").with_kind(FailureKind::Connection);
        assert_eq!(result.classify(), Some(FailureKind::Connection));
        assert!(result.classify().unwrap().is_retryable());
    }

    #[test]
    fn test_retryability() {
        assert!(FailureKind::Server.is_retryable());
        assert!(FailureKind::Connection.is_retryable());
        assert!(!FailureKind::Client.is_retryable());
        assert!(!FailureKind::Validation.is_retryable());
        assert!(!FailureKind::Infrastructure.is_retryable());
    }

    #[test]
    fn test_success_never_classifies() {
        assert_eq!(PublishResult::success(None, None).classify(), None);
    }
}
