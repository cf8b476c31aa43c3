//! Event system foundation: fire-and-forget lifecycle notifications for
//! downstream consumers (user notifications, metrics).

pub mod publisher;

pub use publisher::{EventPublisher, PipelineEvent, StampedEvent};
