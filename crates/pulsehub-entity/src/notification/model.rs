//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::category::NotificationCategory;
use super::channel::NotificationChannel;
use super::priority::NotificationPriority;
use super::status::NotificationStatus;

/// A notification to be delivered to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient user.
    pub user_id: Uuid,
    /// Template this notification was rendered from, if any.
    pub template_id: Option<Uuid>,
    /// Event type that triggered this notification (free-form tag,
    /// e.g. `"activity.logged"`).
    pub event_type: String,
    /// Notification category.
    pub category: NotificationCategory,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Rendered email body (HTML), when distinct from `message`.
    pub email_body: Option<String>,
    /// Additional structured data (JSON).
    pub payload: Option<serde_json::Value>,
    /// Delivery channels, in dispatch order. Fixed at creation time from
    /// the user's preferences; later preference edits do not alter it.
    pub channels: Vec<NotificationChannel>,
    /// Lifecycle status.
    pub status: NotificationStatus,
    /// Deferred delivery time, set for explicit schedules, quiet-hours
    /// deferral, and retry backoff.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When the first successful delivery happened.
    pub sent_at: Option<DateTime<Utc>>,
    /// When the user read the notification.
    pub read_at: Option<DateTime<Utc>>,
    /// When the user clicked through the notification.
    pub clicked_at: Option<DateTime<Utc>>,
    /// Hard expiry deadline; undelivered rows past it are swept.
    pub expires_at: DateTime<Utc>,
    /// Delivery attempts made so far.
    pub retry_count: u32,
    /// Maximum delivery attempts before the row is permanently failed.
    pub max_retries: u32,
    /// Message of the most recent channel failure.
    pub last_error: Option<String>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Check if the notification has been read.
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }

    /// Check if the expiry deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Check if delivery attempts are exhausted.
    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    /// Check if the notification can never be dispatched again.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
            || (self.status == NotificationStatus::Failed && self.retries_exhausted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_notification(status: NotificationStatus) -> Notification {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            template_id: None,
            event_type: "activity.logged".to_string(),
            category: NotificationCategory::Activity,
            priority: NotificationPriority::Medium,
            title: "Run logged".to_string(),
            message: "You logged a 5km run".to_string(),
            email_body: None,
            payload: None,
            channels: vec![NotificationChannel::Realtime],
            status,
            scheduled_for: None,
            sent_at: None,
            read_at: None,
            clicked_at: None,
            expires_at: now + chrono::Duration::hours(1),
            retry_count: 0,
            max_retries: 3,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_failed_is_terminal_only_when_retries_exhausted() {
        let mut n = make_notification(NotificationStatus::Failed);
        assert!(!n.is_terminal());

        n.retry_count = 3;
        assert!(n.is_terminal());
    }

    #[test]
    fn test_expiry_check() {
        let n = make_notification(NotificationStatus::Pending);
        assert!(!n.is_expired(Utc::now()));
        assert!(n.is_expired(Utc::now() + chrono::Duration::hours(2)));
    }
}
