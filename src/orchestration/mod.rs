//! # Orchestration
//!
//! Asynchronous task definitions and the worker loop driving the content
//! pipeline: generation, enrichment, featured images, and publishing with
//! per-key mutual exclusion, retry/backoff and wall-clock timeouts.

pub mod dedup;
pub mod error_classifier;
pub mod orchestrator;
pub mod queue;
pub mod types;

mod enrich;
mod generate;
mod publish;

pub use dedup::{DedupGuard, DedupLockRegistry};
pub use error_classifier::{classify_publish_failure, RetryDecision};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, PipelineContext};
pub use queue::TaskQueue;
pub use types::{Task, TaskKind, TaskOutcome, TaskRequest};
