//! Notification batch entity and status enumeration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::notification::NotificationCategory;

/// Status of a batch fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Fan-out in progress.
    Processing,
    /// Fan-out finished with no failures.
    Completed,
    /// Fan-out finished with at least one failure.
    Failed,
    /// Administratively cancelled; future dispatch is refused.
    Cancelled,
}

impl BatchStatus {
    /// Check if the batch is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate record for one logical notification fanned out to many users.
///
/// A batch is a reporting record, not a transactional unit: individual
/// notifications succeed or fail independently of the batch's own status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationBatch {
    /// Unique batch identifier.
    pub id: Uuid,
    /// Event type of the fanned-out notification.
    pub event_type: String,
    /// Category of the fanned-out notification.
    pub category: NotificationCategory,
    /// Number of recipients targeted.
    pub total_count: u32,
    /// Recipients whose notification was created (or dispatched) successfully.
    pub sent_count: u32,
    /// Recipients whose notification failed.
    pub failed_count: u32,
    /// Batch status.
    pub status: BatchStatus,
    /// When the fan-out started.
    pub started_at: DateTime<Utc>,
    /// When the fan-out finished.
    pub completed_at: Option<DateTime<Utc>>,
}
