use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Lifecycle signals emitted by pipeline tasks.
///
/// Consumers subscribe for side channels only; the orchestrator never reads
/// these back as a decision input.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Content delivered to one integration.
    Published {
        content_id: Uuid,
        integration_id: Uuid,
        publication_id: Uuid,
    },
    /// Delivery to one integration failed terminally.
    PublishFailed {
        content_id: Uuid,
        integration_id: Uuid,
        publication_id: Uuid,
        error_message: String,
    },
    /// Article generation finished and the item moved to review.
    GenerationCompleted {
        content_id: Uuid,
        article_id: Uuid,
    },
    /// A pipeline stage exhausted its budget and the item was marked failed.
    ContentFailed {
        content_id: Uuid,
        error_message: String,
    },
}

/// An event stamped at publication time.
#[derive(Debug, Clone)]
pub struct StampedEvent {
    pub event: PipelineEvent,
    pub published_at: DateTime<Utc>,
}

/// High-throughput event publisher for lifecycle events.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<StampedEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Zero subscribers is acceptable: events are a
    /// fire-and-forget side channel, never load-bearing.
    pub fn publish(&self, event: PipelineEvent) {
        let stamped = StampedEvent {
            event,
            published_at: Utc::now(),
        };
        if let Err(broadcast::error::SendError(_)) = self.sender.send(stamped) {
            // No subscribers; nothing to do.
        }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<StampedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::new(8);
        publisher.publish(PipelineEvent::ContentFailed {
            content_id: Uuid::new_v4(),
            error_message: "boom".into(),
        });
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_stamped_event() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();

        let content_id = Uuid::new_v4();
        let article_id = Uuid::new_v4();
        publisher.publish(PipelineEvent::GenerationCompleted {
            content_id,
            article_id,
        });

        let stamped = rx.recv().await.unwrap();
        match stamped.event {
            PipelineEvent::GenerationCompleted {
                content_id: c,
                article_id: a,
            } => {
                assert_eq!(c, content_id);
                assert_eq!(a, article_id);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
