//! # Publisher Abstraction
//!
//! A strategy trait per integration type, a factory resolving strategies by
//! type tag, and standalone wrapper functions giving every strategy uniform
//! validation, logging and fault capture. Composition over inheritance: the
//! wrappers apply to any strategy instance.
//!
//! The orchestrator never receives a raw error from a publisher, only a
//! `PublishResult`.

pub mod factory;
pub mod webhook;

use crate::models::{Article, FailureKind, Integration, IntegrationType, PublishResult};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::{info, warn};

pub use factory::PublisherFactory;
pub use webhook::{sanitize_headers, WebhookPublisher};

/// Delivery strategy for one integration type.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Type tag this strategy handles; the factory keys on it.
    fn integration_type(&self) -> IntegrationType;

    /// Human-readable credential problems; empty means valid.
    fn validate_credentials(&self, integration: &Integration) -> Vec<String>;

    /// Deliver articles to the integration.
    async fn publish(&self, articles: &[Article], integration: &Integration) -> PublishResult;

    /// Probe the integration with a synthetic payload.
    async fn test_connection(&self, integration: &Integration) -> PublishResult;
}

/// Uniform publish path: log, validate, delegate, capture faults.
///
/// A credential validation error short-circuits before any network call.
/// A panic inside the strategy becomes a failure result carrying the
/// panic message.
pub async fn publish_with(
    strategy: &dyn Publisher,
    articles: &[Article],
    integration: &Integration,
) -> PublishResult {
    info!(
        integration_id = %integration.id,
        integration_type = %integration.integration_type,
        article_count = articles.len(),
        "Publishing content"
    );

    if let Some(result) = validation_failure(strategy, integration) {
        return result;
    }

    let result = catch_strategy_fault(
        AssertUnwindSafe(strategy.publish(articles, integration)).catch_unwind().await,
    );
    log_outcome(&result, integration, "publish");
    result
}

/// Uniform connection-test path; same wrapper behavior as [`publish_with`].
pub async fn test_with(strategy: &dyn Publisher, integration: &Integration) -> PublishResult {
    info!(
        integration_id = %integration.id,
        integration_type = %integration.integration_type,
        "Testing integration connection"
    );

    if let Some(result) = validation_failure(strategy, integration) {
        return result;
    }

    let result = catch_strategy_fault(
        AssertUnwindSafe(strategy.test_connection(integration)).catch_unwind().await,
    );
    log_outcome(&result, integration, "test");
    result
}

fn validation_failure(
    strategy: &dyn Publisher,
    integration: &Integration,
) -> Option<PublishResult> {
    let errors = strategy.validate_credentials(integration);
    if errors.is_empty() {
        return None;
    }
    warn!(
        integration_id = %integration.id,
        errors = ?errors,
        "Credential validation failed, skipping delivery"
    );
    Some(
        PublishResult::failure(format!("Invalid credentials: {}", errors.join("; ")))
            .with_kind(FailureKind::Validation),
    )
}

fn catch_strategy_fault(
    outcome: Result<PublishResult, Box<dyn std::any::Any + Send>>,
) -> PublishResult {
    match outcome {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| panic.downcast_ref::<&str>().copied())
                .unwrap_or("publisher panicked");
            PublishResult::failure(format!("Publisher fault: {message}"))
                .with_kind(FailureKind::Infrastructure)
        }
    }
}

fn log_outcome(result: &PublishResult, integration: &Integration, operation: &str) {
    if result.is_successful() {
        info!(
            integration_id = %integration.id,
            external_id = ?result.external_id,
            "Publisher {operation} succeeded"
        );
    } else {
        warn!(
            integration_id = %integration.id,
            error = ?result.error_message,
            http_status = ?result.http_status,
            "Publisher {operation} failed"
        );
    }
}
