#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Pressroom Core
//!
//! Core of a content publishing pipeline: schedules, generates, enriches and
//! publishes content items, then delivers finished items to external
//! endpoints over HTTP with retry and idempotency guarantees.
//!
//! ## Architecture
//!
//! A content item moves through a closed status state machine
//! (`Backlog → Scheduled → Queued → Generating → InReview → Approved →
//! Published`), driven by asynchronous tasks running on a bounded worker
//! pool. Every task class is guarded by a non-blocking per-key dedup lock so
//! at most one execution per logical entity is ever in flight; duplicate
//! dispatches are dropped silently.
//!
//! Delivery goes through a pluggable publisher strategy resolved per
//! integration type. Publishers never raise across their boundary: every
//! call resolves to a [`models::PublishResult`], which the orchestrator maps
//! into a per-(content, integration) [`models::Publication`] ledger row.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Content/publication statuses and the transition table
//! - [`models`] - Domain entities and the transient publish result
//! - [`orchestration`] - Task queue, worker loop, dedup lock, pipeline tasks
//! - [`publisher`] - Strategy trait, factory, wrapper, webhook delivery
//! - [`store`] - Persistence traits with in-memory and PostgreSQL backends
//! - [`events`] - Fire-and-forget lifecycle notifications
//! - [`cache`] - Ephemeral TTL progress cache for UI polling
//! - [`services`] - Collaborator seams (generation, images, video)
//! - [`config`] - Policies and runtime configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pressroom_core::config::PressroomConfig;
//! use pressroom_core::orchestration::{Orchestrator, Task};
//! use pressroom_core::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # use pressroom_core::services::{ArticleGenerator, ServiceError};
//! # use pressroom_core::models::Article;
//! # struct MyGenerator;
//! # #[async_trait::async_trait]
//! # impl ArticleGenerator for MyGenerator {
//! #     async fn generate(&self, keyword: &str, _provider: Option<&str>)
//! #         -> Result<Article, ServiceError> {
//! #         Ok(Article::new(keyword, keyword))
//! #     }
//! # }
//! # async fn example(content_id: uuid::Uuid) -> pressroom_core::Result<()> {
//! let orchestrator = Orchestrator::builder(
//!     PressroomConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MyGenerator),
//! )
//! .build();
//!
//! let handle = orchestrator.start()?;
//! orchestrator.dispatch(Task::Generate { content_id }).await?;
//! # drop(handle);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod publisher;
pub mod services;
pub mod state_machine;
pub mod store;

pub use config::{PressroomConfig, TaskPolicy};
pub use error::{PressroomError, Result};
pub use models::{
    Article, FailureKind, Integration, IntegrationType, Publication, PublishResult,
    ScheduledContent,
};
pub use orchestration::{Orchestrator, Task, TaskKind};
pub use state_machine::{ContentStatus, PublicationStatus};
