//! Real-time channel adapter — publishes to the per-user hub channel.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use pulsehub_core::result::AppResult;
use pulsehub_entity::notification::{Notification, NotificationChannel};
use pulsehub_entity::user::UserAccount;

use crate::error::NotifyResult;

use super::ChannelAdapter;

/// Collaborator contract for the real-time transport.
///
/// The engine does not define the transport's wire protocol; it only hands
/// a JSON-serializable payload to the user's channel.
#[async_trait]
pub trait Broadcaster: Send + Sync + std::fmt::Debug + 'static {
    /// Publish a payload to a user's channel.
    async fn publish(&self, user_id: Uuid, payload: serde_json::Value) -> AppResult<()>;
}

/// Delivers notifications over the real-time hub.
#[derive(Debug)]
pub struct RealtimeChannelAdapter {
    /// The broadcaster collaborator.
    hub: Arc<dyn Broadcaster>,
}

impl RealtimeChannelAdapter {
    /// Create a new real-time channel adapter.
    pub fn new(hub: Arc<dyn Broadcaster>) -> Self {
        Self { hub }
    }

    /// Project the notification into the payload published to the hub.
    fn project(notification: &Notification) -> serde_json::Value {
        serde_json::json!({
            "type": "notification",
            "id": notification.id,
            "category": notification.category,
            "event_type": notification.event_type,
            "title": notification.title,
            "message": notification.message,
            "payload": notification.payload,
            "priority": notification.priority,
            "created_at": notification.created_at,
        })
    }
}

#[async_trait]
impl ChannelAdapter for RealtimeChannelAdapter {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Realtime
    }

    async fn send(
        &self,
        notification: &Notification,
        recipient: &UserAccount,
    ) -> NotifyResult<()> {
        self.hub
            .publish(recipient.id, Self::project(notification))
            .await?;

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %recipient.id,
            "Published notification to realtime hub"
        );
        Ok(())
    }
}
