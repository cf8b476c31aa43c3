//! Task definitions and outcome types for the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The task classes the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Generate,
    Enrich,
    GenerateFeaturedImage,
    PublishFanOut,
    PublishToIntegration,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Enrich => write!(f, "enrich"),
            Self::GenerateFeaturedImage => write!(f, "generate_featured_image"),
            Self::PublishFanOut => write!(f, "publish_fan_out"),
            Self::PublishToIntegration => write!(f, "publish_to_integration"),
        }
    }
}

/// A dispatchable unit of pipeline work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Task {
    Generate {
        content_id: Uuid,
    },
    Enrich {
        content_id: Uuid,
    },
    GenerateFeaturedImage {
        content_id: Uuid,
    },
    /// Fan content out to active integrations, optionally restricted to an
    /// explicit subset.
    PublishFanOut {
        content_id: Uuid,
        integration_ids: Option<Vec<Uuid>>,
    },
    PublishToIntegration {
        publication_id: Uuid,
    },
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Generate { .. } => TaskKind::Generate,
            Self::Enrich { .. } => TaskKind::Enrich,
            Self::GenerateFeaturedImage { .. } => TaskKind::GenerateFeaturedImage,
            Self::PublishFanOut { .. } => TaskKind::PublishFanOut,
            Self::PublishToIntegration { .. } => TaskKind::PublishToIntegration,
        }
    }
}

/// A task plus its attempt number (1-based).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task: Task,
    pub attempt: u32,
}

impl TaskRequest {
    pub fn new(task: Task) -> Self {
        Self { task, attempt: 1 }
    }

    pub fn next_attempt(&self) -> Self {
        Self {
            task: self.task.clone(),
            attempt: self.attempt + 1,
        }
    }
}

/// Result of one task execution, fed to the orchestrator's retry logic.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The task ran to completion (including terminal failures it already
    /// handled itself, e.g. per-integration delivery exhaustion).
    Completed,
    /// The task exited without doing anything (duplicate dispatch, already
    /// terminal, nothing to deliver). Never retried.
    Skipped(String),
    /// The task failed; the orchestrator decides retry vs. exhaustion.
    Failed { message: String, retryable: bool },
}

impl TaskOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn failed_terminal(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            retryable: false,
        }
    }
}
