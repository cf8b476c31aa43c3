//! Collaborator seams consumed by the pipeline.
//!
//! Text generation, image processing and video placeholder handling live
//! outside this crate; the orchestrator only depends on these traits.
//! Failures cross the seam as error values and become the content's
//! recorded error message.

use crate::models::Article;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Video processing failed: {0}")]
    VideoProcessing(String),

    #[error("No provider configured: {0}")]
    NoProvider(String),
}

/// Produces a full article for a keyword. The heavy lifting (prompting,
/// SEO scoring) happens behind this seam.
#[async_trait]
pub trait ArticleGenerator: Send + Sync {
    async fn generate(
        &self,
        keyword: &str,
        provider: Option<&str>,
    ) -> Result<Article, ServiceError>;
}

/// Outcome of an image-processing pass over an article.
#[derive(Debug, Clone, Default)]
pub struct ImageProcessingOutcome {
    pub processed_count: usize,
    pub errors: Vec<String>,
}

/// Replaces image placeholders in an article with provider-generated assets.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process_article_images(
        &self,
        article: &Article,
        provider: &str,
    ) -> Result<ImageProcessingOutcome, ServiceError>;

    /// Generates and attaches a featured image for the article.
    async fn generate_featured_image(&self, article: &Article) -> Result<(), ServiceError>;
}

/// Replaces video placeholders in article content; returns the article
/// unchanged when there is nothing to do.
#[async_trait]
pub trait VideoProcessor: Send + Sync {
    async fn process_video_placeholders(&self, article: Article) -> Result<Article, ServiceError>;
}
