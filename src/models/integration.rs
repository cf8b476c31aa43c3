//! Integration model: one configured delivery target for a project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Type tag keying the publisher factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    Webhook,
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webhook => write!(f, "webhook"),
        }
    }
}

impl std::str::FromStr for IntegrationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webhook" => Ok(Self::Webhook),
            _ => Err(format!("Invalid integration type: {s}")),
        }
    }
}

/// A configured delivery target.
///
/// The credential blob is opaque to the pipeline; decryption is handled by
/// the credential management layer before the strategy sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,
    pub project_id: Uuid,
    pub integration_type: IntegrationType,
    /// Opaque credential blob (for webhooks: the bearer token).
    pub credentials: String,
    /// Per-integration settings such as endpoint URL, timeouts, custom headers.
    pub settings: HashMap<String, Value>,
    pub active: bool,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Integration {
    pub fn new(project_id: Uuid, integration_type: IntegrationType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            integration_type,
            credentials: String::new(),
            settings: HashMap::new(),
            active: true,
            last_connected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = credentials.into();
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// String setting lookup; absent or non-string values return `None`.
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }

    /// Integer setting lookup; absent or non-numeric values return `None`.
    pub fn setting_u64(&self, key: &str) -> Option<u64> {
        self.settings.get(key).and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_setting_lookups() {
        let integration = Integration::new(Uuid::new_v4(), IntegrationType::Webhook)
            .with_setting("webhook_url", json!("https://example.com/hook"))
            .with_setting("retry_times", json!(5));

        assert_eq!(
            integration.setting_str("webhook_url"),
            Some("https://example.com/hook")
        );
        assert_eq!(integration.setting_u64("retry_times"), Some(5));
        assert_eq!(integration.setting_str("missing"), None);
        assert_eq!(integration.setting_u64("webhook_url"), None);
    }

    #[test]
    fn test_integration_type_round_trip() {
        let parsed: IntegrationType = IntegrationType::Webhook.to_string().parse().unwrap();
        assert_eq!(parsed, IntegrationType::Webhook);
        assert!("carrier-pigeon".parse::<IntegrationType>().is_err());
    }
}
