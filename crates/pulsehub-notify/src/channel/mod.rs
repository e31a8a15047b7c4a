//! Delivery channel adapters.
//!
//! Each channel implements [`ChannelAdapter`] and registers in the
//! [`ChannelRegistry`]; adding a channel means adding one implementation,
//! not editing a dispatch switch.

pub mod email;
pub mod push;
pub mod realtime;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use pulsehub_entity::notification::{Notification, NotificationChannel};
use pulsehub_entity::user::UserAccount;

use crate::error::NotifyResult;

pub use email::{EmailChannelAdapter, EmailMessage, EmailTransport, LogEmailTransport};
pub use push::PushChannelAdapter;
pub use realtime::{Broadcaster, RealtimeChannelAdapter};

/// The outcome of one channel's delivery attempt.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    /// The channel that was attempted.
    pub channel: NotificationChannel,
    /// Whether delivery succeeded.
    pub success: bool,
    /// Failure message, when delivery did not succeed.
    pub error: Option<String>,
}

impl DeliveryOutcome {
    /// A successful delivery.
    pub fn success(channel: NotificationChannel) -> Self {
        Self {
            channel,
            success: true,
            error: None,
        }
    }

    /// A failed delivery.
    pub fn failure(channel: NotificationChannel, error: impl Into<String>) -> Self {
        Self {
            channel,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Uniform send contract implemented once per channel.
#[async_trait]
pub trait ChannelAdapter: Send + Sync + std::fmt::Debug {
    /// The channel this adapter delivers on.
    fn channel(&self) -> NotificationChannel;

    /// Deliver the notification to the recipient.
    async fn send(&self, notification: &Notification, recipient: &UserAccount)
    -> NotifyResult<()>;
}

/// Registry of channel adapters, looked up by channel at dispatch time.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Registered adapters by channel.
    adapters: HashMap<NotificationChannel, Arc<dyn ChannelAdapter>>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter for its channel.
    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter>) {
        let channel = adapter.channel();
        tracing::info!(%channel, "Registered delivery channel adapter");
        self.adapters.insert(channel, adapter);
    }

    /// Look up the adapter for a channel.
    pub fn get(&self, channel: NotificationChannel) -> Option<&Arc<dyn ChannelAdapter>> {
        self.adapters.get(&channel)
    }

    /// Check if an adapter is registered for a channel.
    pub fn has(&self, channel: NotificationChannel) -> bool {
        self.adapters.contains_key(&channel)
    }

    /// The channels with a registered adapter.
    pub fn registered_channels(&self) -> Vec<NotificationChannel> {
        self.adapters.keys().copied().collect()
    }
}
