//! Shared fixtures for the integration tests: fast retry policies, stub
//! collaborators, and polling helpers for the asynchronous pipeline.

#![allow(dead_code)]

use async_trait::async_trait;
use pressroom_core::config::PressroomConfig;
use pressroom_core::events::{PipelineEvent, StampedEvent};
use pressroom_core::models::{Article, FailureKind, Integration, IntegrationType, PublishResult};
use pressroom_core::publisher::Publisher;
use pressroom_core::services::{
    ArticleGenerator, ImageProcessingOutcome, ImageProcessor, ServiceError,
};
use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout, Instant};

/// Default configuration with millisecond-scale backoffs and polling so the
/// retry machinery runs at test speed.
pub fn fast_config() -> PressroomConfig {
    let mut config = PressroomConfig::default();
    config.fanout_poll_interval = Duration::from_millis(20);
    config.generate.backoff_base = Duration::from_millis(10);
    config.enrich.backoff_base = Duration::from_millis(10);
    config.publish_fanout.backoff_base = Duration::from_millis(10);
    config.publish_fanout.timeout = Some(Duration::from_secs(10));
    config.publish_integration.backoff_base = Duration::from_millis(10);
    config
}

/// Article generator stub with an invocation counter and an optional delay
/// to widen race windows in dedup tests.
pub struct StubGenerator {
    calls: AtomicUsize,
    delay: Option<Duration>,
    failures_before_success: AtomicU32,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: None,
            failures_before_success: AtomicU32::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_first(self, failures: u32) -> Self {
        self.failures_before_success.store(failures, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleGenerator for StubGenerator {
    async fn generate(
        &self,
        keyword: &str,
        _provider: Option<&str>,
    ) -> Result<Article, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        let remaining = self.failures_before_success.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_before_success
                .store(remaining - 1, Ordering::SeqCst);
            return Err(ServiceError::Generation("provider unavailable".into()));
        }
        let mut article = Article::new(keyword, keyword.replace(' ', "-"));
        article.content_html = format!("<p>{keyword}</p>");
        article.content_markdown = keyword.to_string();
        Ok(article)
    }
}

/// Image processor stub that always succeeds.
pub struct StubImageProcessor;

#[async_trait]
impl ImageProcessor for StubImageProcessor {
    async fn process_article_images(
        &self,
        _article: &Article,
        _provider: &str,
    ) -> Result<ImageProcessingOutcome, ServiceError> {
        Ok(ImageProcessingOutcome {
            processed_count: 1,
            errors: Vec::new(),
        })
    }

    async fn generate_featured_image(&self, _article: &Article) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Webhook-typed publisher stub. Per-integration behavior is keyed off the
/// integration's `mode` setting:
///
/// - absent or `"success"`: delivery succeeds
/// - `"fail"`: terminal client failure
/// - `"flaky"`: server failures until `flaky_failures` calls are spent
pub struct ScriptedPublisher {
    calls: AtomicUsize,
    flaky_failures: AtomicU32,
}

impl ScriptedPublisher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            flaky_failures: AtomicU32::new(0),
        }
    }

    pub fn flaky(failures: u32) -> Self {
        let publisher = Self::new();
        publisher.flaky_failures.store(failures, Ordering::SeqCst);
        publisher
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    fn integration_type(&self) -> IntegrationType {
        IntegrationType::Webhook
    }

    fn validate_credentials(&self, _integration: &Integration) -> Vec<String> {
        Vec::new()
    }

    async fn publish(&self, _articles: &[Article], integration: &Integration) -> PublishResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match integration.setting_str("mode") {
            Some("fail") => PublishResult::failure("endpoint rejected the payload")
                .with_http_status(422)
                .with_kind(FailureKind::Client),
            Some("flaky") => {
                let remaining = self.flaky_failures.load(Ordering::SeqCst);
                if remaining > 0 {
                    self.flaky_failures.store(remaining - 1, Ordering::SeqCst);
                    PublishResult::failure("upstream overloaded")
                        .with_http_status(503)
                        .with_kind(FailureKind::Server)
                } else {
                    success_result(integration)
                }
            }
            _ => success_result(integration),
        }
    }

    async fn test_connection(&self, integration: &Integration) -> PublishResult {
        success_result(integration)
    }
}

fn success_result(integration: &Integration) -> PublishResult {
    PublishResult::success(
        Some(format!("ext-{}", integration.id)),
        Some(format!("https://published.example.com/{}", integration.id)),
    )
    .with_http_status(200)
}

/// Poll an async condition until it holds, failing the test after 5s.
pub async fn wait_until<F, Fut>(description: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition().await {
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {description}");
}

/// Receive events until one matches the predicate, failing the test after 5s.
pub async fn wait_for_event<F>(
    receiver: &mut broadcast::Receiver<StampedEvent>,
    description: &str,
    matches: F,
) -> PipelineEvent
where
    F: Fn(&PipelineEvent) -> bool,
{
    let deadline = Duration::from_secs(5);
    loop {
        let stamped = timeout(deadline, receiver.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for event: {description}"))
            .expect("event channel closed");
        if matches(&stamped.event) {
            return stamped.event;
        }
    }
}
