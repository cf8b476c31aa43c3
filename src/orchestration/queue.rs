//! Task queue: an mpsc channel handle with immediate and delayed dispatch.
//!
//! Delayed dispatch backs the explicit re-enqueue path: a retried task is
//! parked on a timer and re-sent, rather than relying on any queue-level
//! retry machinery.

use super::types::TaskRequest;
use crate::error::{PressroomError, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Cloneable sender half of the task queue.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<TaskRequest>,
    capacity: usize,
}

impl TaskQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TaskRequest>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, capacity }, receiver)
    }

    /// Dispatch a task for immediate execution.
    pub async fn enqueue(&self, request: TaskRequest) -> Result<()> {
        debug!(
            kind = %request.task.kind(),
            attempt = request.attempt,
            depth = self.depth(),
            "Enqueueing task"
        );
        self.sender
            .send(request)
            .await
            .map_err(|e| PressroomError::QueueClosed(e.to_string()))
    }

    /// Dispatch a task after `delay`. The send happens on a detached timer
    /// task; a closed queue at fire time is logged and dropped.
    pub fn enqueue_after(&self, request: TaskRequest, delay: Duration) {
        let sender = self.sender.clone();
        debug!(
            kind = %request.task.kind(),
            attempt = request.attempt,
            delay_ms = delay.as_millis() as u64,
            "Scheduling delayed task"
        );
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = sender.send(request).await {
                warn!(error = %e, "Task queue closed before delayed dispatch fired");
            }
        });
    }

    /// Best-effort queue depth for load logging.
    pub fn depth(&self) -> usize {
        self.capacity.saturating_sub(self.sender.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::types::Task;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_enqueue_and_receive() {
        let (queue, mut rx) = TaskQueue::new(4);
        queue
            .enqueue(TaskRequest::new(Task::Generate {
                content_id: Uuid::new_v4(),
            }))
            .await
            .unwrap();

        let request = rx.recv().await.unwrap();
        assert_eq!(request.attempt, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_enqueue_waits_out_the_delay() {
        let (queue, mut rx) = TaskQueue::new(4);
        queue.enqueue_after(
            TaskRequest::new(Task::Enrich {
                content_id: Uuid::new_v4(),
            }),
            Duration::from_secs(30),
        );

        // Nothing arrives before the timer fires.
        assert!(rx.try_recv().is_err());
        let request = rx.recv().await.unwrap();
        assert_eq!(request.attempt, 1);
    }
}
