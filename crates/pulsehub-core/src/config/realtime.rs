//! Real-time delivery hub configuration.

use serde::{Deserialize, Serialize};

/// Real-time notification hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Internal channel buffer size per subscriber.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum concurrent subscriptions per user.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_user: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_subscriptions_per_user: default_max_subscriptions(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_subscriptions() -> usize {
    5
}
