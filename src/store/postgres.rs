//! PostgreSQL store on SQLx.
//!
//! Queries are runtime-checked (`query_as::<_, Row>`) so the crate builds
//! without a live database; the schema ships in `migrations/`. Status enums
//! are stored as text and parsed on load.

use super::{ArticleStore, ContentStore, IntegrationStore, PublicationStore, StoreError};
use crate::models::{Article, Integration, Publication, ScheduledContent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// SQLx-backed store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct ContentRow {
    id: Uuid,
    project_id: Uuid,
    keyword_id: Option<Uuid>,
    keyword: Option<String>,
    article_id: Option<Uuid>,
    status: String,
    previous_status: Option<String>,
    scheduled_at: Option<DateTime<Utc>>,
    sort_position: i32,
    generation_attempts: i32,
    error_message: Option<String>,
    generation_started_at: Option<DateTime<Utc>>,
    generation_completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentRow> for ScheduledContent {
    type Error = StoreError;

    fn try_from(row: ContentRow) -> Result<Self, StoreError> {
        let status = row
            .status
            .parse()
            .map_err(|e: String| StoreError::CorruptRow(e))?;
        let previous_status = row
            .previous_status
            .map(|s| s.parse().map_err(|e: String| StoreError::CorruptRow(e)))
            .transpose()?;
        Ok(ScheduledContent {
            id: row.id,
            project_id: row.project_id,
            keyword_id: row.keyword_id,
            keyword: row.keyword,
            article_id: row.article_id,
            status,
            previous_status,
            scheduled_at: row.scheduled_at,
            position: row.sort_position,
            generation_attempts: row.generation_attempts,
            error_message: row.error_message,
            generation_started_at: row.generation_started_at,
            generation_completed_at: row.generation_completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct IntegrationRow {
    id: Uuid,
    project_id: Uuid,
    integration_type: String,
    credentials: String,
    settings: serde_json::Value,
    active: bool,
    last_connected_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<IntegrationRow> for Integration {
    type Error = StoreError;

    fn try_from(row: IntegrationRow) -> Result<Self, StoreError> {
        let integration_type = row
            .integration_type
            .parse()
            .map_err(|e: String| StoreError::CorruptRow(e))?;
        let settings = serde_json::from_value(row.settings)
            .map_err(|e| StoreError::CorruptRow(format!("settings: {e}")))?;
        Ok(Integration {
            id: row.id,
            project_id: row.project_id,
            integration_type,
            credentials: row.credentials,
            settings,
            active: row.active,
            last_connected_at: row.last_connected_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PublicationRow {
    id: Uuid,
    content_id: Uuid,
    integration_id: Uuid,
    status: String,
    external_id: Option<String>,
    external_url: Option<String>,
    request_method: Option<String>,
    request_url: Option<String>,
    request_payload: Option<String>,
    response_body: Option<String>,
    response_headers: serde_json::Value,
    error_message: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PublicationRow> for Publication {
    type Error = StoreError;

    fn try_from(row: PublicationRow) -> Result<Self, StoreError> {
        let status = row
            .status
            .parse()
            .map_err(|e: String| StoreError::CorruptRow(e))?;
        let response_headers = serde_json::from_value(row.response_headers)
            .map_err(|e| StoreError::CorruptRow(format!("response_headers: {e}")))?;
        Ok(Publication {
            id: row.id,
            content_id: row.content_id,
            integration_id: row.integration_id,
            status,
            external_id: row.external_id,
            external_url: row.external_url,
            request_method: row.request_method,
            request_url: row.request_url,
            request_payload: row.request_payload,
            response_body: row.response_body,
            response_headers,
            error_message: row.error_message,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn get_content(&self, id: Uuid) -> Result<ScheduledContent, StoreError> {
        let row = sqlx::query_as::<_, ContentRow>(
            "SELECT id, project_id, keyword_id, keyword, article_id, status, previous_status,
                    scheduled_at, sort_position, generation_attempts, error_message,
                    generation_started_at, generation_completed_at, created_at, updated_at
             FROM pressroom_contents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "content",
            id,
        })?;
        row.try_into()
    }

    async fn save_content(&self, content: &ScheduledContent) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO pressroom_contents
                (id, project_id, keyword_id, keyword, article_id, status, previous_status,
                 scheduled_at, sort_position, generation_attempts, error_message,
                 generation_started_at, generation_completed_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (id) DO UPDATE SET
                 article_id = EXCLUDED.article_id,
                 status = EXCLUDED.status,
                 previous_status = EXCLUDED.previous_status,
                 scheduled_at = EXCLUDED.scheduled_at,
                 sort_position = EXCLUDED.sort_position,
                 generation_attempts = EXCLUDED.generation_attempts,
                 error_message = EXCLUDED.error_message,
                 generation_started_at = EXCLUDED.generation_started_at,
                 generation_completed_at = EXCLUDED.generation_completed_at,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(content.id)
        .bind(content.project_id)
        .bind(content.keyword_id)
        .bind(&content.keyword)
        .bind(content.article_id)
        .bind(content.status.to_string())
        .bind(content.previous_status.map(|s| s.to_string()))
        .bind(content.scheduled_at)
        .bind(content.position)
        .bind(content.generation_attempts)
        .bind(&content.error_message)
        .bind(content.generation_started_at)
        .bind(content.generation_completed_at)
        .bind(content.created_at)
        .bind(content.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for PgStore {
    async fn get_article(&self, id: Uuid) -> Result<Article, StoreError> {
        sqlx::query_as::<_, Article>(
            "SELECT id, title, slug, content_html, content_markdown, meta_description, created_at
             FROM pressroom_articles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "article",
            id,
        })
    }

    async fn save_article(&self, article: &Article) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO pressroom_articles
                (id, title, slug, content_html, content_markdown, meta_description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                 title = EXCLUDED.title,
                 slug = EXCLUDED.slug,
                 content_html = EXCLUDED.content_html,
                 content_markdown = EXCLUDED.content_markdown,
                 meta_description = EXCLUDED.meta_description",
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content_html)
        .bind(&article.content_markdown)
        .bind(&article.meta_description)
        .bind(article.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl IntegrationStore for PgStore {
    async fn get_integration(&self, id: Uuid) -> Result<Integration, StoreError> {
        let row = sqlx::query_as::<_, IntegrationRow>(
            "SELECT id, project_id, integration_type, credentials, settings, active,
                    last_connected_at, created_at, updated_at
             FROM pressroom_integrations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "integration",
            id,
        })?;
        row.try_into()
    }

    async fn list_active_integrations(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Integration>, StoreError> {
        let rows = sqlx::query_as::<_, IntegrationRow>(
            "SELECT id, project_id, integration_type, credentials, settings, active,
                    last_connected_at, created_at, updated_at
             FROM pressroom_integrations WHERE project_id = $1 AND active = TRUE",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn save_integration(&self, integration: &Integration) -> Result<(), StoreError> {
        let settings = serde_json::to_value(&integration.settings)
            .map_err(|e| StoreError::CorruptRow(format!("settings: {e}")))?;
        sqlx::query(
            "INSERT INTO pressroom_integrations
                (id, project_id, integration_type, credentials, settings, active,
                 last_connected_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (id) DO UPDATE SET
                 credentials = EXCLUDED.credentials,
                 settings = EXCLUDED.settings,
                 active = EXCLUDED.active,
                 last_connected_at = EXCLUDED.last_connected_at,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(integration.id)
        .bind(integration.project_id)
        .bind(integration.integration_type.to_string())
        .bind(&integration.credentials)
        .bind(settings)
        .bind(integration.active)
        .bind(integration.last_connected_at)
        .bind(integration.created_at)
        .bind(integration.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PublicationStore for PgStore {
    async fn get_publication(&self, id: Uuid) -> Result<Publication, StoreError> {
        let row = sqlx::query_as::<_, PublicationRow>(
            "SELECT id, content_id, integration_id, status, external_id, external_url,
                    request_method, request_url, request_payload, response_body,
                    response_headers, error_message, published_at, created_at, updated_at
             FROM pressroom_publications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "publication",
            id,
        })?;
        row.try_into()
    }

    async fn find_or_create_publication(
        &self,
        content_id: Uuid,
        integration_id: Uuid,
    ) -> Result<Publication, StoreError> {
        // The unique (content_id, integration_id) index makes the insert a
        // no-op when a row already exists; the follow-up select wins either way.
        let fresh = Publication::new(content_id, integration_id);
        sqlx::query(
            "INSERT INTO pressroom_publications
                (id, content_id, integration_id, status, response_headers, created_at, updated_at)
             VALUES ($1, $2, $3, $4, '{}'::jsonb, $5, $6)
             ON CONFLICT (content_id, integration_id) DO NOTHING",
        )
        .bind(fresh.id)
        .bind(content_id)
        .bind(integration_id)
        .bind(fresh.status.to_string())
        .bind(fresh.created_at)
        .bind(fresh.updated_at)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, PublicationRow>(
            "SELECT id, content_id, integration_id, status, external_id, external_url,
                    request_method, request_url, request_payload, response_body,
                    response_headers, error_message, published_at, created_at, updated_at
             FROM pressroom_publications
             WHERE content_id = $1 AND integration_id = $2",
        )
        .bind(content_id)
        .bind(integration_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_publication(&self, publication: &Publication) -> Result<(), StoreError> {
        let headers = serde_json::to_value(&publication.response_headers)
            .map_err(|e| StoreError::CorruptRow(format!("response_headers: {e}")))?;
        let updated = sqlx::query(
            "UPDATE pressroom_publications SET
                 status = $2, external_id = $3, external_url = $4, request_method = $5,
                 request_url = $6, request_payload = $7, response_body = $8,
                 response_headers = $9, error_message = $10, published_at = $11,
                 updated_at = $12
             WHERE id = $1",
        )
        .bind(publication.id)
        .bind(publication.status.to_string())
        .bind(&publication.external_id)
        .bind(&publication.external_url)
        .bind(&publication.request_method)
        .bind(&publication.request_url)
        .bind(&publication.request_payload)
        .bind(&publication.response_body)
        .bind(headers)
        .bind(&publication.error_message)
        .bind(publication.published_at)
        .bind(publication.updated_at)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "publication",
                id: publication.id,
            });
        }
        Ok(())
    }

    async fn list_publications_for_content(
        &self,
        content_id: Uuid,
    ) -> Result<Vec<Publication>, StoreError> {
        let rows = sqlx::query_as::<_, PublicationRow>(
            "SELECT id, content_id, integration_id, status, external_id, external_url,
                    request_method, request_url, request_payload, response_body,
                    response_headers, error_message, published_at, created_at, updated_at
             FROM pressroom_publications WHERE content_id = $1",
        )
        .bind(content_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
