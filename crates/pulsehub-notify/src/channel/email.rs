//! Email channel adapter.

use std::sync::Arc;

use async_trait::async_trait;

use pulsehub_core::error::AppError;
use pulsehub_core::result::AppResult;
use pulsehub_entity::notification::{Notification, NotificationChannel};
use pulsehub_entity::user::UserAccount;

use crate::error::{NotifyError, NotifyResult};

use super::ChannelAdapter;

/// An outbound email message.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain-text body.
    pub text: String,
}

/// Collaborator contract for the outbound email transport.
#[async_trait]
pub trait EmailTransport: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver one email message.
    async fn deliver(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Delivers notifications by email.
///
/// Built without a transport, every send fails with
/// [`NotifyError::EmailUnavailable`].
#[derive(Debug)]
pub struct EmailChannelAdapter {
    /// The configured transport, if any.
    transport: Option<Arc<dyn EmailTransport>>,
}

impl EmailChannelAdapter {
    /// Create an adapter backed by the given transport.
    pub fn new(transport: Arc<dyn EmailTransport>) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    /// Create an adapter with no transport configured.
    pub fn unconfigured() -> Self {
        Self { transport: None }
    }
}

#[async_trait]
impl ChannelAdapter for EmailChannelAdapter {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    async fn send(
        &self,
        notification: &Notification,
        recipient: &UserAccount,
    ) -> NotifyResult<()> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(NotifyError::EmailUnavailable)?;

        let to = recipient.email.clone().ok_or_else(|| {
            NotifyError::from(AppError::validation(format!(
                "User {} has no email address",
                recipient.id
            )))
        })?;

        let message = EmailMessage {
            to,
            subject: notification.title.clone(),
            html: notification
                .email_body
                .clone()
                .unwrap_or_else(|| notification.message.clone()),
            text: notification.message.clone(),
        };

        transport.deliver(&message).await?;

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %recipient.id,
            "Delivered notification email"
        );
        Ok(())
    }
}

/// Development transport that logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogEmailTransport;

#[async_trait]
impl EmailTransport for LogEmailTransport {
    async fn deliver(&self, message: &EmailMessage) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email delivery (log transport)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    use pulsehub_entity::notification::{
        NotificationCategory, NotificationPriority, NotificationStatus,
    };

    /// Transport fake that records delivered messages.
    #[derive(Debug, Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl EmailTransport for RecordingTransport {
        async fn deliver(&self, message: &EmailMessage) -> AppResult<()> {
            self.delivered
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(message.clone());
            Ok(())
        }
    }

    fn make_notification(user_id: Uuid, email_body: Option<&str>) -> Notification {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            user_id,
            template_id: None,
            event_type: "team.goal_completed".to_string(),
            category: NotificationCategory::Team,
            priority: NotificationPriority::Medium,
            title: "Team goal completed".to_string(),
            message: "Your team hit its weekly goal".to_string(),
            email_body: email_body.map(String::from),
            payload: None,
            channels: vec![NotificationChannel::Email],
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
        }
    }

    fn make_user(id: Uuid, email: Option<&str>) -> UserAccount {
        UserAccount {
            id,
            username: "maya".to_string(),
            email: email.map(String::from),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_no_transport_fails_unavailable() {
        let adapter = EmailChannelAdapter::unconfigured();
        let user_id = Uuid::new_v4();

        let err = adapter
            .send(
                &make_notification(user_id, None),
                &make_user(user_id, Some("maya@example.com")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::EmailUnavailable));
    }

    #[tokio::test]
    async fn test_html_falls_back_to_message_body() {
        let transport = Arc::new(RecordingTransport::default());
        let adapter = EmailChannelAdapter::new(transport.clone());
        let user_id = Uuid::new_v4();

        adapter
            .send(
                &make_notification(user_id, None),
                &make_user(user_id, Some("maya@example.com")),
            )
            .await
            .unwrap();

        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].to, "maya@example.com");
        assert_eq!(delivered[0].subject, "Team goal completed");
        assert_eq!(delivered[0].html, "Your team hit its weekly goal");
        assert_eq!(delivered[0].text, "Your team hit its weekly goal");
    }

    #[tokio::test]
    async fn test_email_body_used_as_html_when_present() {
        let transport = Arc::new(RecordingTransport::default());
        let adapter = EmailChannelAdapter::new(transport.clone());
        let user_id = Uuid::new_v4();

        adapter
            .send(
                &make_notification(user_id, Some("<p>Goal hit!</p>")),
                &make_user(user_id, Some("maya@example.com")),
            )
            .await
            .unwrap();

        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered[0].html, "<p>Goal hit!</p>");
        assert_eq!(delivered[0].text, "Your team hit its weekly goal");
    }

    #[tokio::test]
    async fn test_recipient_without_address_fails() {
        let transport = Arc::new(RecordingTransport::default());
        let adapter = EmailChannelAdapter::new(transport.clone());
        let user_id = Uuid::new_v4();

        let err = adapter
            .send(
                &make_notification(user_id, None),
                &make_user(user_id, None),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert!(transport.delivered.lock().unwrap().is_empty());
    }
}
