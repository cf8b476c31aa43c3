//! # Delivery Failure Classification
//!
//! Maps a failed [`PublishResult`] to a retry decision for the
//! per-integration delivery task. Validation and 4xx failures are
//! configuration problems and terminal; 5xx and connection failures retry
//! until the policy's budget runs out, with a delay of
//! `backoff_base × attempt_number`.

use crate::config::TaskPolicy;
use crate::models::{FailureKind, PublishResult};
use std::time::Duration;

/// What the delivery task should do with a failed result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-enqueue after the given delay.
    Retry { delay: Duration },
    /// Stop; record the failure as terminal.
    GiveUp { kind: FailureKind },
}

/// Classify a failed publish result given the current attempt (1-based).
///
/// Callers must only pass unsuccessful results; a successful result
/// classifies as terminal with an infrastructure tag, which no caller
/// should ever observe.
pub fn classify_publish_failure(
    result: &PublishResult,
    attempt: u32,
    policy: &TaskPolicy,
) -> RetryDecision {
    let kind = result.classify().unwrap_or(FailureKind::Infrastructure);
    if kind.is_retryable() && policy.has_attempts_remaining(attempt) {
        RetryDecision::Retry {
            delay: policy.retry_delay(attempt),
        }
    } else {
        RetryDecision::GiveUp { kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TaskPolicy {
        TaskPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_secs(60),
            linear_backoff: true,
            timeout: None,
        }
    }

    #[test]
    fn test_server_failure_retries_with_linear_backoff() {
        let result = PublishResult::failure("HTTP 503").with_http_status(503);
        assert_eq!(
            classify_publish_failure(&result, 1, &policy()),
            RetryDecision::Retry {
                delay: Duration::from_secs(60)
            }
        );
        assert_eq!(
            classify_publish_failure(&result, 2, &policy()),
            RetryDecision::Retry {
                delay: Duration::from_secs(120)
            }
        );
    }

    #[test]
    fn test_budget_exhaustion_gives_up() {
        let result = PublishResult::failure("HTTP 503").with_http_status(503);
        assert_eq!(
            classify_publish_failure(&result, 3, &policy()),
            RetryDecision::GiveUp {
                kind: FailureKind::Server
            }
        );
    }

    #[test]
    fn test_client_failure_never_retries() {
        let result = PublishResult::failure("HTTP 404").with_http_status(404);
        assert_eq!(
            classify_publish_failure(&result, 1, &policy()),
            RetryDecision::GiveUp {
                kind: FailureKind::Client
            }
        );
    }

    #[test]
    fn test_validation_failure_never_retries() {
        let result = PublishResult::failure("missing token").with_kind(FailureKind::Validation);
        assert_eq!(
            classify_publish_failure(&result, 1, &policy()),
            RetryDecision::GiveUp {
                kind: FailureKind::Validation
            }
        );
    }
}
