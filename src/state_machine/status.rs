use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Content lifecycle states for the publishing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    /// Created on the calendar, not yet scheduled
    Backlog,
    /// Scheduled for generation at a future date
    Scheduled,
    /// Picked up by the scheduler, waiting for a worker
    Queued,
    /// Article generation in progress
    Generating,
    /// Temporary detour while enrichment work runs
    Enriching,
    /// Generated, waiting for human review
    InReview,
    /// Approved for publishing
    Approved,
    /// Queued for delivery to integrations
    PublishingQueued,
    /// Delivered successfully to at least one integration
    Published,
    /// A pipeline stage failed; recoverable by rescheduling
    Failed,
}

impl ContentStatus {
    /// Statuses a content item may move to from this one.
    ///
    /// The table is the single source of truth for the pipeline; every
    /// status mutation past `Scheduled` goes through it.
    pub fn allowed_transitions(&self) -> &'static [ContentStatus] {
        use ContentStatus::*;
        match self {
            Backlog => &[Scheduled],
            Scheduled => &[Backlog, Queued],
            Queued => &[Generating, Failed],
            Generating => &[Enriching, InReview, Failed],
            Enriching => &[InReview, Approved, Failed],
            InReview => &[Enriching, Approved, Scheduled],
            Approved => &[Enriching, Published, InReview],
            PublishingQueued => &[Published],
            Published => &[],
            Failed => &[Scheduled, Backlog],
        }
    }

    /// Pure lookup: may this status move to `target`?
    pub fn can_transition_to(&self, target: ContentStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Whether users may still edit the item in this status.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::Backlog | Self::Scheduled | Self::InReview | Self::Approved | Self::Failed
        )
    }

    /// Check if this is a terminal state (no further transitions allowed).
    /// `Failed` is deliberately not terminal: a failed item can be rescheduled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published)
    }
}

impl Default for ContentStatus {
    fn default() -> Self {
        Self::Backlog
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backlog => write!(f, "backlog"),
            Self::Scheduled => write!(f, "scheduled"),
            Self::Queued => write!(f, "queued"),
            Self::Generating => write!(f, "generating"),
            Self::Enriching => write!(f, "enriching"),
            Self::InReview => write!(f, "in_review"),
            Self::Approved => write!(f, "approved"),
            Self::PublishingQueued => write!(f, "publishing_queued"),
            Self::Published => write!(f, "published"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "scheduled" => Ok(Self::Scheduled),
            "queued" => Ok(Self::Queued),
            "generating" => Ok(Self::Generating),
            "enriching" => Ok(Self::Enriching),
            "in_review" => Ok(Self::InReview),
            "approved" => Ok(Self::Approved),
            "publishing_queued" => Ok(Self::PublishingQueued),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid content status: {s}")),
        }
    }
}

/// Lifecycle states for one (content, integration) delivery row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    /// Row created, delivery not yet started
    Pending,
    /// Delivery task currently running
    Publishing,
    /// Delivered successfully
    Published,
    /// Delivery exhausted its retry budget or hit a terminal failure
    Failed,
}

impl PublicationStatus {
    /// A settled row will not change again without a new fan-out.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Published | Self::Failed)
    }
}

impl Default for PublicationStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Publishing => write!(f, "publishing"),
            Self::Published => write!(f, "published"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PublicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "publishing" => Ok(Self::Publishing),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid publication status: {s}")),
        }
    }
}

/// Error returned when a status change violates the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid transition from {from} to {to}")]
pub struct TransitionError {
    pub from: ContentStatus,
    pub to: ContentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ContentStatus::*;

    const ALL: [ContentStatus; 10] = [
        Backlog,
        Scheduled,
        Queued,
        Generating,
        Enriching,
        InReview,
        Approved,
        PublishingQueued,
        Published,
        Failed,
    ];

    #[test]
    fn test_transition_table_exhaustive() {
        // Every (from, to) pair checked against the expected table.
        let expected: [(ContentStatus, &[ContentStatus]); 10] = [
            (Backlog, &[Scheduled]),
            (Scheduled, &[Backlog, Queued]),
            (Queued, &[Generating, Failed]),
            (Generating, &[Enriching, InReview, Failed]),
            (Enriching, &[InReview, Approved, Failed]),
            (InReview, &[Enriching, Approved, Scheduled]),
            (Approved, &[Enriching, Published, InReview]),
            (PublishingQueued, &[Published]),
            (Published, &[]),
            (Failed, &[Scheduled, Backlog]),
        ];

        for (from, allowed) in expected {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&to),
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_published_is_only_terminal_status() {
        for status in ALL {
            assert_eq!(status.is_terminal(), status == Published, "{status}");
        }
    }

    #[test]
    fn test_editable_statuses() {
        let editable = [Backlog, Scheduled, InReview, Approved, Failed];
        for status in ALL {
            assert_eq!(status.is_editable(), editable.contains(&status), "{status}");
        }
    }

    #[test]
    fn test_failed_is_recoverable() {
        assert!(Failed.can_transition_to(Scheduled));
        assert!(Failed.can_transition_to(Backlog));
        assert!(!Failed.is_terminal());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in ALL {
            let parsed: ContentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<ContentStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&InReview).unwrap();
        assert_eq!(json, "\"in_review\"");
        let parsed: ContentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, InReview);
    }

    #[test]
    fn test_publication_status_settled() {
        assert!(PublicationStatus::Published.is_settled());
        assert!(PublicationStatus::Failed.is_settled());
        assert!(!PublicationStatus::Pending.is_settled());
        assert!(!PublicationStatus::Publishing.is_settled());
    }
}
