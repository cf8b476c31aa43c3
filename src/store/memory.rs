//! In-memory store on concurrent maps. Used by tests and by embedders that
//! bring their own persistence.

use super::{ArticleStore, ContentStore, IntegrationStore, PublicationStore, StoreError};
use crate::models::{Article, Integration, Publication, ScheduledContent};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// Concurrent-map store; cloning shares the underlying maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    contents: std::sync::Arc<DashMap<Uuid, ScheduledContent>>,
    articles: std::sync::Arc<DashMap<Uuid, Article>>,
    integrations: std::sync::Arc<DashMap<Uuid, Integration>>,
    /// Ledger rows keyed by (content, integration) to enforce pair uniqueness.
    publications: std::sync::Arc<DashMap<(Uuid, Uuid), Publication>>,
    /// Secondary index: publication id -> pair key.
    publication_ids: std::sync::Arc<DashMap<Uuid, (Uuid, Uuid)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_content(&self, id: Uuid) -> Result<ScheduledContent, StoreError> {
        self.contents
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound {
                entity: "content",
                id,
            })
    }

    async fn save_content(&self, content: &ScheduledContent) -> Result<(), StoreError> {
        self.contents.insert(content.id, content.clone());
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn get_article(&self, id: Uuid) -> Result<Article, StoreError> {
        self.articles
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound {
                entity: "article",
                id,
            })
    }

    async fn save_article(&self, article: &Article) -> Result<(), StoreError> {
        self.articles.insert(article.id, article.clone());
        Ok(())
    }
}

#[async_trait]
impl IntegrationStore for MemoryStore {
    async fn get_integration(&self, id: Uuid) -> Result<Integration, StoreError> {
        self.integrations
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound {
                entity: "integration",
                id,
            })
    }

    async fn list_active_integrations(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Integration>, StoreError> {
        Ok(self
            .integrations
            .iter()
            .filter(|entry| entry.project_id == project_id && entry.active)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn save_integration(&self, integration: &Integration) -> Result<(), StoreError> {
        self.integrations.insert(integration.id, integration.clone());
        Ok(())
    }
}

#[async_trait]
impl PublicationStore for MemoryStore {
    async fn get_publication(&self, id: Uuid) -> Result<Publication, StoreError> {
        let pair = self
            .publication_ids
            .get(&id)
            .map(|entry| *entry)
            .ok_or(StoreError::NotFound {
                entity: "publication",
                id,
            })?;
        self.publications
            .get(&pair)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound {
                entity: "publication",
                id,
            })
    }

    async fn find_or_create_publication(
        &self,
        content_id: Uuid,
        integration_id: Uuid,
    ) -> Result<Publication, StoreError> {
        let pair = (content_id, integration_id);
        let row = self
            .publications
            .entry(pair)
            .or_insert_with(|| Publication::new(content_id, integration_id))
            .clone();
        self.publication_ids.insert(row.id, pair);
        Ok(row)
    }

    async fn update_publication(&self, publication: &Publication) -> Result<(), StoreError> {
        let pair = self
            .publication_ids
            .get(&publication.id)
            .map(|entry| *entry)
            .ok_or(StoreError::NotFound {
                entity: "publication",
                id: publication.id,
            })?;
        self.publications.insert(pair, publication.clone());
        Ok(())
    }

    async fn list_publications_for_content(
        &self,
        content_id: Uuid,
    ) -> Result<Vec<Publication>, StoreError> {
        Ok(self
            .publications
            .iter()
            .filter(|entry| entry.content_id == content_id)
            .map(|entry| entry.clone())
            .collect())
    }
}
