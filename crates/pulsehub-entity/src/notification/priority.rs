//! Notification priority levels.

use serde::{Deserialize, Serialize};

/// Notification priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    /// Low priority — background events.
    Low,
    /// Medium priority — standard events (default).
    Medium,
    /// High priority — important events.
    High,
    /// Urgent priority — requires immediate attention.
    Urgent,
}

impl NotificationPriority {
    /// Parse from string, defaulting to `Medium` for unknown values.
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Medium,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl Default for NotificationPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
