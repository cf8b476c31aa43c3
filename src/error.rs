//! Crate-level error types.
//!
//! Structured errors via `thiserror`, one variant per failing layer. Publisher
//! failures never surface here: publishers always resolve to a `PublishResult`
//! value, so only infrastructure-level faults travel this path.

use thiserror::Error;

/// Top-level error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PressroomError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("State transition error: {0}")]
    StateTransition(#[from] crate::state_machine::TransitionError),

    #[error("Orchestration error: {0}")]
    Orchestration(String),

    #[error("Task queue closed: {0}")]
    QueueClosed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PressroomError>;
