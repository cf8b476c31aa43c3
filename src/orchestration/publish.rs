//! Publishing tasks: the fan-out over active integrations and the
//! per-integration delivery.
//!
//! Each (content, integration) delivery is an independent, dedup-locked,
//! retryable task writing one Publication ledger row. There is no
//! cross-integration rollback: partial failure leaves the successful rows
//! in place and the content unpublished.

use super::error_classifier::{classify_publish_failure, RetryDecision};
use super::orchestrator::PipelineContext;
use super::types::{Task, TaskOutcome, TaskRequest};
use crate::constants::dedup_keys;
use crate::events::PipelineEvent;
use crate::models::{FailureKind, Publication, PublishResult};
use crate::publisher;
use crate::state_machine::{ContentStatus, PublicationStatus};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fan content out to active integrations and wait for the resulting
/// deliveries to settle. Promotes the content to `Published` only when at
/// least one delivery was attempted and none failed.
pub(crate) async fn run_fan_out(
    ctx: &PipelineContext,
    content_id: Uuid,
    integration_ids: Option<&[Uuid]>,
) -> TaskOutcome {
    let content = match ctx.store.get_content(content_id).await {
        Ok(content) => content,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };
    if content.status == ContentStatus::Published {
        return TaskOutcome::Skipped("content already published".to_string());
    }

    let mut integrations = match ctx.store.list_active_integrations(content.project_id).await {
        Ok(integrations) => integrations,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };
    if let Some(subset) = integration_ids {
        integrations.retain(|integration| subset.contains(&integration.id));
    }
    if integrations.is_empty() {
        return TaskOutcome::Skipped("no active integrations to publish to".to_string());
    }

    // One ledger row per integration; re-runs re-drive only rows that are
    // not already delivered.
    let mut watched = Vec::with_capacity(integrations.len());
    for integration in &integrations {
        let mut row = match ctx
            .store
            .find_or_create_publication(content_id, integration.id)
            .await
        {
            Ok(row) => row,
            Err(e) => return TaskOutcome::failed(e.to_string()),
        };
        watched.push(row.id);

        match row.status {
            PublicationStatus::Published => continue,
            PublicationStatus::Publishing => continue,
            PublicationStatus::Failed => {
                row.status = PublicationStatus::Pending;
                row.touch();
                if let Err(e) = ctx.store.update_publication(&row).await {
                    return TaskOutcome::failed(e.to_string());
                }
            }
            PublicationStatus::Pending => {}
        }

        let request = TaskRequest::new(Task::PublishToIntegration {
            publication_id: row.id,
        });
        if let Err(e) = ctx.queue.enqueue(request).await {
            return TaskOutcome::failed(e.to_string());
        }
    }
    info!(
        %content_id,
        integrations = watched.len(),
        "Dispatched per-integration deliveries"
    );

    // Wait for every watched row to settle. The task's own wall-clock
    // timeout bounds this loop.
    let rows = loop {
        let rows = match ctx.store.list_publications_for_content(content_id).await {
            Ok(rows) => rows,
            Err(e) => return TaskOutcome::failed(e.to_string()),
        };
        let watched_rows: Vec<&Publication> = rows
            .iter()
            .filter(|row| watched.contains(&row.id))
            .collect();
        if watched_rows.iter().all(|row| row.status.is_settled()) {
            break rows;
        }
        tokio::time::sleep(ctx.config.fanout_poll_interval).await;
    };

    let successes = rows
        .iter()
        .filter(|row| watched.contains(&row.id) && row.status == PublicationStatus::Published)
        .count();
    let failures = rows
        .iter()
        .filter(|row| watched.contains(&row.id) && row.status == PublicationStatus::Failed)
        .count();

    if failures == 0 && successes >= 1 {
        promote_to_published(ctx, content_id).await
    } else {
        // Content is left unpublished; the successful rows stand.
        TaskOutcome::failed(format!(
            "{failures} of {} deliveries failed",
            successes + failures
        ))
    }
}

async fn promote_to_published(ctx: &PipelineContext, content_id: Uuid) -> TaskOutcome {
    let mut content = match ctx.store.get_content(content_id).await {
        Ok(content) => content,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };
    if content.status == ContentStatus::Published {
        return TaskOutcome::Completed;
    }
    if let Err(e) = content.transition_to(ContentStatus::Published) {
        // All deliveries succeeded but the item moved somewhere unexpected
        // in the meantime; surface it rather than forcing the status.
        warn!(%content_id, error = %e, "Cannot promote content to published");
        return TaskOutcome::failed_terminal(e.to_string());
    }
    if let Err(e) = ctx.store.save_content(&content).await {
        return TaskOutcome::failed(e.to_string());
    }
    info!(%content_id, "Content published");
    TaskOutcome::Completed
}

/// Deliver one publication row to its integration. Retries are managed
/// explicitly: the structured result is persisted first, then the task
/// re-enqueues itself with a `backoff_base × attempt` delay.
pub(crate) async fn run_delivery(
    ctx: &PipelineContext,
    publication_id: Uuid,
    attempt: u32,
) -> TaskOutcome {
    let key = dedup_keys::publication(publication_id);
    let Some(_guard) = ctx.locks.try_acquire(&key) else {
        return TaskOutcome::Skipped(format!("delivery already in flight for {key}"));
    };

    let mut publication = match ctx.store.get_publication(publication_id).await {
        Ok(publication) => publication,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };
    if publication.status == PublicationStatus::Published {
        return TaskOutcome::Skipped("publication already delivered".to_string());
    }
    let mut integration = match ctx.store.get_integration(publication.integration_id).await {
        Ok(integration) => integration,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };
    let content = match ctx.store.get_content(publication.content_id).await {
        Ok(content) => content,
        Err(e) => return TaskOutcome::failed(e.to_string()),
    };

    // Visible in the ledger before any network traffic.
    publication.mark_publishing();
    if let Err(e) = ctx.store.update_publication(&publication).await {
        return TaskOutcome::failed(e.to_string());
    }
    debug!(
        %publication_id,
        integration_id = %integration.id,
        attempt,
        "Delivering publication"
    );

    let result = match content.article_id {
        None => PublishResult::failure("content has no generated article")
            .with_kind(FailureKind::Validation),
        Some(article_id) => match ctx.store.get_article(article_id).await {
            Err(e) => {
                PublishResult::failure(e.to_string()).with_kind(FailureKind::Infrastructure)
            }
            Ok(article) => match ctx.factory.resolve(integration.integration_type) {
                None => PublishResult::failure(format!(
                    "no publisher registered for type {}",
                    integration.integration_type
                ))
                .with_kind(FailureKind::Validation),
                Some(strategy) => {
                    publisher::publish_with(strategy.as_ref(), &[article], &integration).await
                }
            },
        },
    };

    apply_result(&mut publication, &result);

    if result.is_successful() {
        publication.mark_published();
        if let Err(e) = ctx.store.update_publication(&publication).await {
            return TaskOutcome::failed(e.to_string());
        }
        integration.last_connected_at = Some(Utc::now());
        if let Err(e) = ctx.store.save_integration(&integration).await {
            warn!(integration_id = %integration.id, error = %e, "Failed to stamp last_connected_at");
        }
        ctx.events.publish(PipelineEvent::Published {
            content_id: publication.content_id,
            integration_id: publication.integration_id,
            publication_id,
        });
        info!(%publication_id, "Delivery succeeded");
        return TaskOutcome::Completed;
    }

    let message = result
        .error_message
        .clone()
        .unwrap_or_else(|| "delivery failed".to_string());

    match classify_publish_failure(&result, attempt, &ctx.config.publish_integration) {
        RetryDecision::Retry { delay } => {
            // Persist the in-progress row with the structured result before
            // the timer fires; the ledger must reflect the failed attempt.
            if let Err(e) = ctx.store.update_publication(&publication).await {
                return TaskOutcome::failed(e.to_string());
            }
            warn!(
                %publication_id,
                attempt,
                delay_secs = delay.as_secs(),
                error = %message,
                "Delivery failed, re-enqueueing"
            );
            ctx.queue.enqueue_after(
                TaskRequest {
                    task: Task::PublishToIntegration { publication_id },
                    attempt: attempt + 1,
                },
                delay,
            );
            TaskOutcome::Completed
        }
        RetryDecision::GiveUp { kind } => {
            publication.mark_failed(&message);
            if let Err(e) = ctx.store.update_publication(&publication).await {
                return TaskOutcome::failed(e.to_string());
            }
            ctx.events.publish(PipelineEvent::PublishFailed {
                content_id: publication.content_id,
                integration_id: publication.integration_id,
                publication_id,
                error_message: message.clone(),
            });
            warn!(%publication_id, %kind, error = %message, "Delivery failed terminally");
            TaskOutcome::Completed
        }
    }
}

/// Map the transient result into the ledger row's audit fields.
fn apply_result(publication: &mut Publication, result: &PublishResult) {
    publication.external_id = result.external_id.clone();
    publication.external_url = result.external_url.clone();
    publication.request_method = result.request_method.clone();
    publication.request_url = result.request_url.clone();
    publication.request_payload = result.payload.clone();
    publication.response_body = result.response_body.clone();
    publication.response_headers = result.response_headers.clone();
    publication.error_message = result.error_message.clone();
    publication.touch();
}

/// Exhaustion handler for delivery infrastructure faults (store errors and
/// the like): mark the row failed so the fan-out can settle.
pub(crate) async fn on_delivery_exhaustion(
    ctx: &PipelineContext,
    publication_id: Uuid,
    message: &str,
) {
    let mut publication = match ctx.store.get_publication(publication_id).await {
        Ok(publication) => publication,
        Err(e) => {
            warn!(%publication_id, error = %e, "Cannot mark publication failed, load error");
            return;
        }
    };
    publication.mark_failed(message);
    if let Err(e) = ctx.store.update_publication(&publication).await {
        warn!(%publication_id, error = %e, "Cannot mark publication failed, save error");
        return;
    }
    ctx.events.publish(PipelineEvent::PublishFailed {
        content_id: publication.content_id,
        integration_id: publication.integration_id,
        publication_id,
        error_message: message.to_string(),
    });
}
