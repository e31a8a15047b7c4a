//! Push channel adapter — explicit not-yet-implemented stub.

use async_trait::async_trait;

use pulsehub_entity::notification::{Notification, NotificationChannel};
use pulsehub_entity::user::UserAccount;

use crate::error::{NotifyError, NotifyResult};

use super::ChannelAdapter;

/// Push delivery stub.
///
/// Upstream has no push provider integration yet; every send fails with
/// [`NotifyError::PushUnimplemented`] so the failure is recorded on the
/// notification rather than silently dropped.
#[derive(Debug, Default)]
pub struct PushChannelAdapter;

#[async_trait]
impl ChannelAdapter for PushChannelAdapter {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Push
    }

    async fn send(
        &self,
        _notification: &Notification,
        _recipient: &UserAccount,
    ) -> NotifyResult<()> {
        Err(NotifyError::PushUnimplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use pulsehub_entity::notification::{
        NotificationCategory, NotificationPriority, NotificationStatus,
    };

    #[tokio::test]
    async fn test_always_fails_unimplemented() {
        let adapter = PushChannelAdapter;
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            template_id: None,
            event_type: "reminder.workout".to_string(),
            category: NotificationCategory::Reminder,
            priority: NotificationPriority::Low,
            title: "Workout reminder".to_string(),
            message: "Time to move".to_string(),
            email_body: None,
            payload: None,
            channels: vec![NotificationChannel::Push],
            status: NotificationStatus::Pending,
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
        };
        let recipient = UserAccount {
            id: user_id,
            username: "maya".to_string(),
            email: None,
            is_active: true,
            created_at: now,
        };

        let err = adapter.send(&notification, &recipient).await.unwrap_err();
        assert!(matches!(err, NotifyError::PushUnimplemented));
    }
}
