//! Generated article content referenced by the aggregate and shipped in
//! webhook payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated article. Field names match the webhook wire format so the
/// payload serializes directly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content_html: String,
    pub content_markdown: String,
    pub meta_description: String,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            slug: slug.into(),
            content_html: String::new(),
            content_markdown: String::new(),
            meta_description: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Synthetic article used for integration connection tests.
    pub fn test_article() -> Self {
        Self {
            id: Uuid::nil(),
            title: "Test Article".to_string(),
            slug: "test-article".to_string(),
            content_html: "<p>This is a connection test.</p>".to_string(),
            content_markdown: "This is a connection test.".to_string(),
            meta_description: "Connection test payload".to_string(),
            created_at: Utc::now(),
        }
    }
}
