//! Delivery channel enumeration.

use serde::{Deserialize, Serialize};

/// A delivery medium for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// In-app delivery over the real-time hub.
    Realtime,
    /// Email delivery.
    Email,
    /// Mobile push delivery.
    Push,
}

impl NotificationChannel {
    /// Return the channel as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Email => "email",
            Self::Push => "push",
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
