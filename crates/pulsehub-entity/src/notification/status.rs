//! Notification lifecycle status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a notification.
///
/// Valid transitions: `Pending → Scheduled → Sent/Failed/Expired` and
/// `Sent → Read`. Pending, Scheduled, and Failed rows expire once their
/// deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Created and awaiting immediate dispatch.
    Pending,
    /// Deferred to a future delivery time (explicit schedule, quiet hours,
    /// or retry backoff).
    Scheduled,
    /// At least one channel delivered successfully.
    Sent,
    /// Every channel failed on the last attempt.
    Failed,
    /// The user has read the notification.
    Read,
    /// The expiry deadline passed before delivery.
    Expired,
}

impl NotificationStatus {
    /// Check if a notification in this status may still be dispatched.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Pending | Self::Scheduled)
    }

    /// Check if this status is unconditionally terminal.
    ///
    /// `Failed` is terminal only once retries are exhausted, which depends
    /// on the entity's counters, so it is not included here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Read | Self::Expired)
    }

    /// Check if a row in this status is eligible for the expiry sweep.
    pub fn is_cleanup_eligible(&self) -> bool {
        matches!(self, Self::Pending | Self::Scheduled | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Read => "read",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatchable_states() {
        assert!(NotificationStatus::Pending.is_dispatchable());
        assert!(NotificationStatus::Scheduled.is_dispatchable());
        assert!(!NotificationStatus::Sent.is_dispatchable());
        assert!(!NotificationStatus::Read.is_dispatchable());
        assert!(!NotificationStatus::Expired.is_dispatchable());
        assert!(!NotificationStatus::Failed.is_dispatchable());
    }

    #[test]
    fn test_cleanup_targets_undelivered_only() {
        assert!(NotificationStatus::Pending.is_cleanup_eligible());
        assert!(NotificationStatus::Scheduled.is_cleanup_eligible());
        assert!(NotificationStatus::Failed.is_cleanup_eligible());
        assert!(!NotificationStatus::Sent.is_cleanup_eligible());
        assert!(!NotificationStatus::Read.is_cleanup_eligible());
        assert!(!NotificationStatus::Expired.is_cleanup_eligible());
    }
}
