//! Notification preference entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::{NotificationCategory, NotificationChannel};

/// Per-user, per-category delivery preferences.
///
/// The absence of a row for a category disables that category entirely:
/// no channels deliver until the user opts in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreference {
    /// The user these preferences belong to.
    pub user_id: Uuid,
    /// The category this row configures.
    pub category: NotificationCategory,
    /// Channels the user allows for this category.
    pub channels: Vec<NotificationChannel>,
    /// Whether the category is enabled at all.
    pub enabled: bool,
    /// Quiet hours start, local `"HH:MM"`.
    pub quiet_hours_start: Option<String>,
    /// Quiet hours end, local `"HH:MM"`.
    pub quiet_hours_end: Option<String>,
    /// Fixed-offset timezone for quiet hours (`"UTC"`, `"+02:00"`,
    /// `"UTC-05:30"`). Defaults to UTC when unset.
    pub timezone: Option<String>,
    /// When preferences were last updated.
    pub updated_at: DateTime<Utc>,
}
