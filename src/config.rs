//! Configuration for the pipeline core.
//!
//! Follows the same shape as the rest of the system's configuration: a plain
//! struct with sensible defaults plus environment-variable overrides. Retry,
//! backoff and timeout policies for each task kind live here so the
//! orchestrator stays policy-free.

use crate::constants;
use crate::error::{PressroomError, Result};
use std::time::Duration;

/// Retry/backoff/timeout policy for one task kind.
#[derive(Debug, Clone, Copy)]
pub struct TaskPolicy {
    /// Maximum attempts, counting the first execution.
    pub max_attempts: u32,
    /// Base delay before a retried attempt.
    pub backoff_base: Duration,
    /// When true, the retry delay is `backoff_base * attempt_number`;
    /// otherwise the delay is fixed at `backoff_base`.
    pub linear_backoff: bool,
    /// Hard wall-clock limit for one execution; `None` means unbounded.
    pub timeout: Option<Duration>,
}

impl TaskPolicy {
    /// Delay to apply before the attempt following `current_attempt` (1-based).
    pub fn retry_delay(&self, current_attempt: u32) -> Duration {
        if self.linear_backoff {
            self.backoff_base * current_attempt
        } else {
            self.backoff_base
        }
    }

    /// Whether another attempt is allowed after `current_attempt` failed.
    pub fn has_attempts_remaining(&self, current_attempt: u32) -> bool {
        current_attempt < self.max_attempts
    }
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct PressroomConfig {
    pub database_url: String,
    /// Maximum concurrently executing tasks across the worker pool.
    pub max_concurrent_tasks: usize,
    /// Capacity of the task queue channel.
    pub queue_capacity: usize,
    /// Polling interval used by the fan-out task while waiting for
    /// per-integration deliveries to settle.
    pub fanout_poll_interval: Duration,
    /// TTL for ephemeral progress-cache entries.
    pub progress_ttl: Duration,
    pub generate: TaskPolicy,
    pub enrich: TaskPolicy,
    pub featured_image: TaskPolicy,
    pub publish_fanout: TaskPolicy,
    pub publish_integration: TaskPolicy,
}

impl Default for PressroomConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/pressroom_development".to_string(),
            max_concurrent_tasks: 10,
            queue_capacity: 1024,
            fanout_poll_interval: Duration::from_millis(250),
            progress_ttl: Duration::from_secs(constants::DEFAULT_PROGRESS_TTL_SECS),
            generate: TaskPolicy {
                max_attempts: 3,
                backoff_base: Duration::from_secs(60),
                linear_backoff: false,
                timeout: Some(Duration::from_secs(300)),
            },
            enrich: TaskPolicy {
                max_attempts: 2,
                backoff_base: Duration::from_secs(30),
                linear_backoff: false,
                timeout: Some(Duration::from_secs(900)),
            },
            featured_image: TaskPolicy {
                max_attempts: 1,
                backoff_base: Duration::ZERO,
                linear_backoff: false,
                timeout: Some(Duration::from_secs(300)),
            },
            publish_fanout: TaskPolicy {
                max_attempts: 3,
                backoff_base: Duration::from_secs(60),
                linear_backoff: false,
                timeout: Some(Duration::from_secs(120)),
            },
            publish_integration: TaskPolicy {
                max_attempts: 3,
                backoff_base: Duration::from_secs(60),
                linear_backoff: true,
                timeout: None,
            },
        }
    }
}

impl PressroomConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(max_concurrent) = std::env::var("PRESSROOM_MAX_CONCURRENT_TASKS") {
            config.max_concurrent_tasks = max_concurrent.parse().map_err(|e| {
                PressroomError::Configuration(format!("Invalid max_concurrent_tasks: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("PRESSROOM_QUEUE_CAPACITY") {
            config.queue_capacity = capacity.parse().map_err(|e| {
                PressroomError::Configuration(format!("Invalid queue_capacity: {e}"))
            })?;
        }

        if let Ok(ttl) = std::env::var("PRESSROOM_PROGRESS_TTL_SECS") {
            let secs: u64 = ttl.parse().map_err(|e| {
                PressroomError::Configuration(format!("Invalid progress_ttl_secs: {e}"))
            })?;
            config.progress_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Policy lookup for a task kind.
    pub fn policy_for(&self, kind: crate::orchestration::TaskKind) -> TaskPolicy {
        use crate::orchestration::TaskKind;
        match kind {
            TaskKind::Generate => self.generate,
            TaskKind::Enrich => self.enrich,
            TaskKind::GenerateFeaturedImage => self.featured_image,
            TaskKind::PublishFanOut => self.publish_fanout,
            TaskKind::PublishToIntegration => self.publish_integration,
        }
    }
}
