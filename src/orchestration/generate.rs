//! Generation task: drives a queued content item through article generation.

use super::orchestrator::PipelineContext;
use super::types::{Task, TaskOutcome, TaskRequest};
use crate::constants::dedup_keys;
use crate::events::PipelineEvent;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub(crate) async fn run(ctx: &PipelineContext, content_id: Uuid) -> TaskOutcome {
    let mut content = match ctx.store.get_content(content_id).await {
        Ok(content) => content,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };

    // Invocations against already-finished items are no-ops.
    if content.status.is_terminal() || content.article_id.is_some() {
        return TaskOutcome::Skipped("content already generated".to_string());
    }

    let key = dedup_keys::generation(content.keyword_id, content.id);
    let Some(_guard) = ctx.locks.try_acquire(&key) else {
        return TaskOutcome::Skipped(format!("generation already in flight for {key}"));
    };

    let Some(keyword) = content.keyword.clone() else {
        return TaskOutcome::failed_terminal("content has no keyword to generate from");
    };

    content.begin_generation();
    if let Err(e) = ctx.store.save_content(&content).await {
        return TaskOutcome::failed(e.to_string());
    }
    ctx.put_progress(
        content_id,
        json!({ "stage": "generating", "attempt": content.generation_attempts }),
    );
    info!(
        %content_id,
        attempt = content.generation_attempts,
        keyword = %keyword,
        "Generating article"
    );

    match ctx.generator.generate(&keyword, None).await {
        Ok(article) => {
            if let Err(e) = ctx.store.save_article(&article).await {
                return TaskOutcome::failed(e.to_string());
            }
            content.complete_generation(article.id);
            if let Err(e) = ctx.store.save_content(&content).await {
                return TaskOutcome::failed(e.to_string());
            }
            ctx.events.publish(PipelineEvent::GenerationCompleted {
                content_id,
                article_id: article.id,
            });
            ctx.put_progress(content_id, json!({ "stage": "in_review" }));

            // Enrichment enhancements run after generation; each is optional
            // and independently retried.
            let followups = [
                Task::Enrich { content_id },
                Task::GenerateFeaturedImage { content_id },
            ];
            for task in followups {
                if let Err(e) = ctx.queue.enqueue(TaskRequest::new(task)).await {
                    warn!(%content_id, error = %e, "Failed to enqueue enrichment follow-up");
                }
            }
            TaskOutcome::Completed
        }
        Err(e) => {
            debug!(%content_id, error = %e, "Generation attempt failed");
            content.error_message = Some(e.to_string());
            if let Err(save_err) = ctx.store.save_content(&content).await {
                warn!(%content_id, error = %save_err, "Failed to record generation error");
            }
            TaskOutcome::failed(e.to_string())
        }
    }
}

/// Exhaustion handler: the content is marked failed and downstream
/// consumers are notified. The item stays recoverable by rescheduling.
pub(crate) async fn on_exhaustion(ctx: &PipelineContext, content_id: Uuid, message: &str) {
    let mut content = match ctx.store.get_content(content_id).await {
        Ok(content) => content,
        Err(e) => {
            warn!(%content_id, error = %e, "Cannot mark content failed, load error");
            return;
        }
    };
    content.fail(message);
    if let Err(e) = ctx.store.save_content(&content).await {
        warn!(%content_id, error = %e, "Cannot mark content failed, save error");
        return;
    }
    ctx.events.publish(PipelineEvent::ContentFailed {
        content_id,
        error_message: message.to_string(),
    });
    ctx.put_progress(content_id, json!({ "stage": "failed", "error": message }));
    warn!(%content_id, error = %message, "Generation exhausted its retry budget");
}
