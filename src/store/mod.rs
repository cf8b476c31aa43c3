//! # Persistence Layer
//!
//! Store traits over the pipeline's entities plus two implementations: an
//! in-memory store (tests and embedded use) and a PostgreSQL store backed by
//! SQLx. The persistent aggregate is always the source of truth; the
//! ephemeral progress cache never is.

pub mod memory;
pub mod postgres;

use crate::models::{Article, Integration, Publication, ScheduledContent};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_content(&self, id: Uuid) -> Result<ScheduledContent, StoreError>;
    async fn save_content(&self, content: &ScheduledContent) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get_article(&self, id: Uuid) -> Result<Article, StoreError>;
    async fn save_article(&self, article: &Article) -> Result<(), StoreError>;
}

#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn get_integration(&self, id: Uuid) -> Result<Integration, StoreError>;
    /// Active integrations for a project, the fan-out's dispatch set.
    async fn list_active_integrations(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Integration>, StoreError>;
    async fn save_integration(&self, integration: &Integration) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PublicationStore: Send + Sync {
    async fn get_publication(&self, id: Uuid) -> Result<Publication, StoreError>;

    /// Return the ledger row for this (content, integration) pair, creating
    /// a Pending row when none exists. The pair is unique: repeated publish
    /// attempts update the same row.
    async fn find_or_create_publication(
        &self,
        content_id: Uuid,
        integration_id: Uuid,
    ) -> Result<Publication, StoreError>;

    async fn update_publication(&self, publication: &Publication) -> Result<(), StoreError>;

    async fn list_publications_for_content(
        &self,
        content_id: Uuid,
    ) -> Result<Vec<Publication>, StoreError>;
}

/// Convenience alias for a store implementing every entity trait.
pub trait Store: ContentStore + ArticleStore + IntegrationStore + PublicationStore {}

impl<T: ContentStore + ArticleStore + IntegrationStore + PublicationStore> Store for T {}
