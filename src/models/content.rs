//! # Scheduled Content Model
//!
//! The stateful aggregate the pipeline advances from backlog to published.
//!
//! ## Overview
//!
//! A `ScheduledContent` row is created when a content item lands on the
//! calendar and is mutated exclusively by pipeline tasks once past
//! `Scheduled`. It owns the status, the schedule, and generation bookkeeping.
//!
//! ## Invariants
//!
//! - `previous_status` is `Some` iff `status == Enriching`
//! - the article reference, once set, is never cleared by the pipeline
//! - `generation_attempts` never decreases

use crate::state_machine::{ContentStatus, TransitionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A content item scheduled on the calendar, tracked through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledContent {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Target keyword, when the item was created from keyword research.
    pub keyword_id: Option<Uuid>,
    pub keyword: Option<String>,
    /// Set only after successful generation; never cleared by the pipeline.
    pub article_id: Option<Uuid>,
    pub status: ContentStatus,
    /// Saved origin status while diverted into `Enriching`.
    pub previous_status: Option<ContentStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Ordering position within the calendar day.
    pub position: i32,
    /// Monotonic counter, incremented at the start of each generation attempt.
    pub generation_attempts: i32,
    pub error_message: Option<String>,
    pub generation_started_at: Option<DateTime<Utc>>,
    pub generation_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduledContent {
    /// Create a new backlog item for a project.
    pub fn new(project_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            keyword_id: None,
            keyword: None,
            article_id: None,
            status: ContentStatus::Backlog,
            previous_status: None,
            scheduled_at: None,
            position: 0,
            generation_attempts: 0,
            error_message: None,
            generation_started_at: None,
            generation_completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_keyword(mut self, keyword_id: Uuid, keyword: impl Into<String>) -> Self {
        self.keyword_id = Some(keyword_id);
        self.keyword = Some(keyword.into());
        self
    }

    /// Validated status change against the transition table.
    pub fn transition_to(&mut self, target: ContentStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(target) {
            return Err(TransitionError {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch();
        Ok(())
    }

    /// Enter the enrichment detour, remembering where we came from.
    ///
    /// Idempotent: a second call while already `Enriching` must not clobber
    /// the real origin status saved by the first.
    pub fn start_enriching(&mut self) {
        if self.status != ContentStatus::Enriching {
            self.previous_status = Some(self.status);
            self.status = ContentStatus::Enriching;
            self.touch();
        }
    }

    /// Leave the enrichment detour, restoring the saved origin status.
    ///
    /// Must run on every exit path of enrichment work, success or failure.
    /// With no saved status the item lands in `InReview`.
    pub fn complete_enriching(&mut self) {
        self.status = self.previous_status.take().unwrap_or(ContentStatus::InReview);
        self.touch();
    }

    /// Start a generation attempt: bump the attempt counter and stamp the
    /// start time. The counter only ever moves up.
    pub fn begin_generation(&mut self) {
        self.generation_attempts += 1;
        self.generation_started_at = Some(Utc::now());
        self.status = ContentStatus::Generating;
        self.touch();
    }

    /// Record a successful generation and move to review.
    pub fn complete_generation(&mut self, article_id: Uuid) {
        self.article_id = Some(article_id);
        self.generation_completed_at = Some(Utc::now());
        self.error_message = None;
        self.status = ContentStatus::InReview;
        self.touch();
    }

    /// Record a failure message and move to `Failed`.
    ///
    /// `Failed` is terminal for this attempt only; the item can be
    /// rescheduled later (`Failed -> Scheduled/Backlog`).
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.status = ContentStatus::Failed;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
