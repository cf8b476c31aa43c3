//! # Task Orchestrator
//!
//! Dispatches pipeline tasks from the queue onto a bounded worker pool,
//! applies per-kind wall-clock timeouts, and drives retry/backoff and
//! exhaustion handling. Task bodies live in the sibling modules; this file
//! only owns the generic execution loop.
//!
//! A timed-out task is handled exactly like any other uncaught fault: its
//! body (and any dedup guard it holds) is dropped, and the failure path
//! runs against freshly loaded state.

use super::dedup::DedupLockRegistry;
use super::queue::TaskQueue;
use super::types::{Task, TaskKind, TaskOutcome, TaskRequest};
use super::{enrich, generate, publish};
use crate::cache::{MemoryProgressCache, ProgressCache};
use crate::config::PressroomConfig;
use crate::error::{PressroomError, Result};
use crate::events::EventPublisher;
use crate::publisher::PublisherFactory;
use crate::services::{ArticleGenerator, ImageProcessor, VideoProcessor};
use crate::store::Store;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Shared dependencies handed to every task body.
pub struct PipelineContext {
    pub config: PressroomConfig,
    pub store: Arc<dyn Store>,
    pub factory: Arc<PublisherFactory>,
    pub events: EventPublisher,
    pub locks: DedupLockRegistry,
    pub cache: Arc<dyn ProgressCache>,
    pub generator: Arc<dyn ArticleGenerator>,
    pub image_processor: Option<Arc<dyn ImageProcessor>>,
    pub video_processor: Option<Arc<dyn VideoProcessor>>,
    pub queue: TaskQueue,
}

impl PipelineContext {
    /// Write a best-effort progress snapshot for UI polling. Never read
    /// back by the orchestrator.
    pub fn put_progress(&self, content_id: Uuid, value: Value) {
        self.cache.put(
            &format!("content-progress:{content_id}"),
            value,
            self.config.progress_ttl,
        );
    }
}

/// Builder wiring the orchestrator's collaborators.
pub struct OrchestratorBuilder {
    config: PressroomConfig,
    store: Arc<dyn Store>,
    generator: Arc<dyn ArticleGenerator>,
    factory: Option<Arc<PublisherFactory>>,
    events: Option<EventPublisher>,
    cache: Option<Arc<dyn ProgressCache>>,
    image_processor: Option<Arc<dyn ImageProcessor>>,
    video_processor: Option<Arc<dyn VideoProcessor>>,
}

impl OrchestratorBuilder {
    pub fn with_factory(mut self, factory: Arc<PublisherFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_events(mut self, events: EventPublisher) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ProgressCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_image_processor(mut self, processor: Arc<dyn ImageProcessor>) -> Self {
        self.image_processor = Some(processor);
        self
    }

    pub fn with_video_processor(mut self, processor: Arc<dyn VideoProcessor>) -> Self {
        self.video_processor = Some(processor);
        self
    }

    pub fn build(self) -> Orchestrator {
        let (queue, receiver) = TaskQueue::new(self.config.queue_capacity);
        let ctx = PipelineContext {
            config: self.config,
            store: self.store,
            factory: self
                .factory
                .unwrap_or_else(|| Arc::new(PublisherFactory::with_defaults())),
            events: self.events.unwrap_or_default(),
            locks: DedupLockRegistry::new(),
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(MemoryProgressCache::new())),
            generator: self.generator,
            image_processor: self.image_processor,
            video_processor: self.video_processor,
            queue,
        };
        Orchestrator {
            ctx: Arc::new(ctx),
            receiver: Mutex::new(Some(receiver)),
            shutdown: Arc::new(Notify::new()),
        }
    }
}

/// The pipeline's task runner.
pub struct Orchestrator {
    ctx: Arc<PipelineContext>,
    receiver: Mutex<Option<mpsc::Receiver<TaskRequest>>>,
    shutdown: Arc<Notify>,
}

impl Orchestrator {
    pub fn builder(
        config: PressroomConfig,
        store: Arc<dyn Store>,
        generator: Arc<dyn ArticleGenerator>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            store,
            generator,
            factory: None,
            events: None,
            cache: None,
            image_processor: None,
            video_processor: None,
        }
    }

    /// Queue handle for dispatching work.
    pub fn queue(&self) -> TaskQueue {
        self.ctx.queue.clone()
    }

    /// Event bus for downstream subscribers.
    pub fn events(&self) -> EventPublisher {
        self.ctx.events.clone()
    }

    /// Convenience dispatch of a first-attempt task.
    pub async fn dispatch(&self, task: Task) -> Result<()> {
        self.ctx.queue.enqueue(TaskRequest::new(task)).await
    }

    /// Start the dispatch loop. Errors if already started.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        let mut receiver = self
            .receiver
            .lock()
            .take()
            .ok_or_else(|| PressroomError::Orchestration("orchestrator already started".into()))?;

        let ctx = Arc::clone(&self.ctx);
        let shutdown = Arc::clone(&self.shutdown);
        let handle = tokio::spawn(async move {
            let semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_tasks));
            info!(
                workers = ctx.config.max_concurrent_tasks,
                "Orchestrator started"
            );
            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    maybe_request = receiver.recv() => {
                        let Some(request) = maybe_request else { break };
                        // Fan-out spends its time waiting on the deliveries
                        // it dispatched; it must not occupy a worker slot
                        // those deliveries need.
                        let permit = if request.task.kind() == TaskKind::PublishFanOut {
                            None
                        } else {
                            match Arc::clone(&semaphore).acquire_owned().await {
                                Ok(permit) => Some(permit),
                                Err(_) => break,
                            }
                        };
                        let task_ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            let _permit = permit;
                            execute(task_ctx, request).await;
                        });
                    }
                }
            }
            info!("Orchestrator stopped");
        });
        Ok(handle)
    }

    /// Signal the dispatch loop to stop. In-flight tasks run to completion.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }
}

/// Execute one task request end to end: body, timeout, retry, exhaustion.
async fn execute(ctx: Arc<PipelineContext>, request: TaskRequest) {
    let kind = request.task.kind();
    let policy = ctx.config.policy_for(kind);

    let outcome = match policy.timeout {
        Some(limit) => match tokio::time::timeout(limit, run_task(&ctx, &request)).await {
            Ok(outcome) => outcome,
            Err(_) => TaskOutcome::failed(format!(
                "{kind} timed out after {}s",
                limit.as_secs()
            )),
        },
        None => run_task(&ctx, &request).await,
    };

    match outcome {
        TaskOutcome::Completed => {
            debug!(%kind, attempt = request.attempt, "Task completed");
        }
        TaskOutcome::Skipped(reason) => {
            // Duplicate dispatches and no-ops exit here without consuming
            // anyone's retry budget.
            debug!(%kind, reason = %reason, "Task skipped");
        }
        TaskOutcome::Failed { message, retryable } => {
            if retryable && policy.has_attempts_remaining(request.attempt) {
                let delay = policy.retry_delay(request.attempt);
                warn!(
                    %kind,
                    attempt = request.attempt,
                    delay_secs = delay.as_secs(),
                    error = %message,
                    "Task failed, retrying"
                );
                ctx.queue.enqueue_after(request.next_attempt(), delay);
            } else {
                error!(
                    %kind,
                    attempt = request.attempt,
                    error = %message,
                    "Task exhausted its retry budget"
                );
                handle_exhaustion(&ctx, &request.task, &message).await;
            }
        }
    }
}

async fn run_task(ctx: &PipelineContext, request: &TaskRequest) -> TaskOutcome {
    match &request.task {
        Task::Generate { content_id } => generate::run(ctx, *content_id).await,
        Task::Enrich { content_id } => enrich::run(ctx, *content_id).await,
        Task::GenerateFeaturedImage { content_id } => {
            enrich::run_featured_image(ctx, *content_id).await
        }
        Task::PublishFanOut {
            content_id,
            integration_ids,
        } => publish::run_fan_out(ctx, *content_id, integration_ids.as_deref()).await,
        Task::PublishToIntegration { publication_id } => {
            publish::run_delivery(ctx, *publication_id, request.attempt).await
        }
    }
}

async fn handle_exhaustion(ctx: &PipelineContext, task: &Task, message: &str) {
    match task {
        Task::Generate { content_id } => generate::on_exhaustion(ctx, *content_id, message).await,
        Task::Enrich { content_id } | Task::GenerateFeaturedImage { content_id } => {
            enrich::on_exhaustion(ctx, *content_id, message).await
        }
        Task::PublishFanOut { content_id, .. } => {
            // Content is deliberately left unpublished; per-integration
            // ledger rows carry the detail.
            error!(%content_id, error = %message, "Publish fan-out gave up");
        }
        Task::PublishToIntegration { publication_id } => {
            publish::on_delivery_exhaustion(ctx, *publication_id, message).await
        }
    }
}
