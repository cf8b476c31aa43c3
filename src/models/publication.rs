//! # Publication Model
//!
//! The persisted audit/ledger row recording delivery of one content item to
//! one integration. Unique per (content, integration): re-delivery updates
//! the existing row, never creates a duplicate.

use crate::state_machine::PublicationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One delivery ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: Uuid,
    pub content_id: Uuid,
    pub integration_id: Uuid,
    pub status: PublicationStatus,
    /// Identifier assigned by the remote system, when it reports one.
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    /// Full request/response audit so a delivery can be replayed by hand.
    pub request_method: Option<String>,
    pub request_url: Option<String>,
    pub request_payload: Option<String>,
    pub response_body: Option<String>,
    /// Response headers with sensitive values masked.
    pub response_headers: HashMap<String, String>,
    pub error_message: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Publication {
    pub fn new(content_id: Uuid, integration_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content_id,
            integration_id,
            status: PublicationStatus::Pending,
            external_id: None,
            external_url: None,
            request_method: None,
            request_url: None,
            request_payload: None,
            response_body: None,
            response_headers: HashMap::new(),
            error_message: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the row as in-flight before the strategy is invoked, so a crash
    /// mid-delivery is visible in the ledger.
    pub fn mark_publishing(&mut self) {
        self.status = PublicationStatus::Publishing;
        self.touch();
    }

    pub fn mark_published(&mut self) {
        self.status = PublicationStatus::Published;
        self.published_at = Some(Utc::now());
        self.error_message = None;
        self.touch();
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = PublicationStatus::Failed;
        self.error_message = Some(message.into());
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
