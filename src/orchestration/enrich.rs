//! Enrichment tasks: image and video enhancement of a generated article,
//! plus the single-shot featured-image task.
//!
//! Both tasks wrap their body in the enrichment detour
//! (`start_enriching` / `complete_enriching`); the restore runs on every
//! exit path. Enhancements are optional: their failure never fails the
//! overall pipeline, it only records an error message.

use super::orchestrator::PipelineContext;
use super::types::TaskOutcome;
use crate::constants::dedup_keys;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub(crate) async fn run(ctx: &PipelineContext, content_id: Uuid) -> TaskOutcome {
    let key = dedup_keys::enrichment(content_id);
    let Some(_guard) = ctx.locks.try_acquire(&key) else {
        return TaskOutcome::Skipped(format!("enrichment already in flight for {key}"));
    };

    let mut content = match ctx.store.get_content(content_id).await {
        Ok(content) => content,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };
    let Some(article_id) = content.article_id else {
        return TaskOutcome::Skipped("content has no article to enrich".to_string());
    };

    content.start_enriching();
    if let Err(e) = ctx.store.save_content(&content).await {
        return TaskOutcome::failed(e.to_string());
    }
    ctx.put_progress(content_id, json!({ "stage": "enriching" }));

    let enhancement = enhance_article(ctx, article_id).await;

    // Restore the origin status regardless of how the enhancements went.
    content.complete_enriching();
    if let Err(e) = ctx.store.save_content(&content).await {
        return TaskOutcome::failed(e.to_string());
    }
    ctx.put_progress(content_id, json!({ "stage": content.status.to_string() }));

    match enhancement {
        Ok(()) => {
            info!(%content_id, "Article enrichment complete");
            TaskOutcome::Completed
        }
        Err(message) => TaskOutcome::failed(message),
    }
}

/// Run the independent enhancements, collecting their failures. One
/// enhancement failing does not stop the next from running.
async fn enhance_article(ctx: &PipelineContext, article_id: Uuid) -> Result<(), String> {
    let article = match ctx.store.get_article(article_id).await {
        Ok(article) => article,
        Err(e) => return Err(e.to_string()),
    };

    let mut failures = Vec::new();

    if let Some(images) = &ctx.image_processor {
        match images.process_article_images(&article, "default").await {
            Ok(outcome) => {
                debug!(
                    %article_id,
                    processed = outcome.processed_count,
                    errors = outcome.errors.len(),
                    "Image processing finished"
                );
                failures.extend(outcome.errors);
            }
            Err(e) => failures.push(e.to_string()),
        }
    }

    if let Some(video) = &ctx.video_processor {
        match video.process_video_placeholders(article.clone()).await {
            Ok(updated) => {
                if let Err(e) = ctx.store.save_article(&updated).await {
                    failures.push(e.to_string());
                }
            }
            Err(e) => failures.push(e.to_string()),
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("; "))
    }
}

/// Exhaustion handler shared by the enrichment tasks: restore the detour if
/// the item is still parked in it, and record the error. The content is
/// never marked failed by enrichment.
pub(crate) async fn on_exhaustion(ctx: &PipelineContext, content_id: Uuid, message: &str) {
    let mut content = match ctx.store.get_content(content_id).await {
        Ok(content) => content,
        Err(e) => {
            warn!(%content_id, error = %e, "Cannot restore enrichment detour, load error");
            return;
        }
    };
    if content.status == crate::state_machine::ContentStatus::Enriching {
        content.complete_enriching();
    }
    content.error_message = Some(message.to_string());
    if let Err(e) = ctx.store.save_content(&content).await {
        warn!(%content_id, error = %e, "Cannot record enrichment error");
    }
    warn!(%content_id, error = %message, "Enrichment gave up");
}

/// Single-shot featured-image task. Never propagates a failure: the error
/// is recorded on the content and the detour is restored inline.
pub(crate) async fn run_featured_image(ctx: &PipelineContext, content_id: Uuid) -> TaskOutcome {
    let mut content = match ctx.store.get_content(content_id).await {
        Ok(content) => content,
        Err(e) => return TaskOutcome::failed_terminal(e.to_string()),
    };
    let Some(article_id) = content.article_id else {
        return TaskOutcome::Skipped("content has no article for a featured image".to_string());
    };

    content.start_enriching();
    if let Err(e) = ctx.store.save_content(&content).await {
        return TaskOutcome::failed_terminal(e.to_string());
    }

    let result = match &ctx.image_processor {
        None => Err("no image provider configured".to_string()),
        Some(images) => match ctx.store.get_article(article_id).await {
            Ok(article) => images
                .generate_featured_image(&article)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        },
    };

    content.complete_enriching();
    if let Err(message) = &result {
        warn!(%content_id, error = %message, "Featured image generation failed");
        content.error_message = Some(message.clone());
    } else {
        info!(%content_id, "Featured image attached");
    }
    if let Err(e) = ctx.store.save_content(&content).await {
        warn!(%content_id, error = %e, "Failed to persist featured-image outcome");
    }

    TaskOutcome::Completed
}
