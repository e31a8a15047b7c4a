//! Notification category enumeration.

use serde::{Deserialize, Serialize};

/// Category of a notification for filtering and preference matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Activity notifications (workout logged, run completed, etc.).
    Activity,
    /// Team notifications (goals, membership, challenges).
    Team,
    /// Achievement notifications (milestones, personal records).
    Achievement,
    /// System-level notifications.
    System,
    /// Social notifications (follows, comments, kudos).
    Social,
    /// Reminder notifications.
    Reminder,
}

impl NotificationCategory {
    /// All categories, for iteration (cache invalidation, default rows).
    pub const ALL: [NotificationCategory; 6] = [
        Self::Activity,
        Self::Team,
        Self::Achievement,
        Self::System,
        Self::Social,
        Self::Reminder,
    ];

    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Team => "team",
            Self::Achievement => "achievement",
            Self::System => "system",
            Self::Social => "social",
            Self::Reminder => "reminder",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
