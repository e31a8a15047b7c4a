//! Notification template entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notification::NotificationCategory;

/// Reusable notification content with `{{variable}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTemplate {
    /// Unique template identifier.
    pub id: Uuid,
    /// Unique lookup key (e.g. `"activity.distance_logged"`).
    pub key: String,
    /// Category this template produces notifications for.
    pub category: NotificationCategory,
    /// Title template.
    pub subject: String,
    /// Body template.
    pub content: String,
    /// Email body template (HTML), when distinct from `content`.
    pub email_content: Option<String>,
    /// Placeholder names the template expects. Documentation for callers;
    /// rendering substitutes whatever the caller actually provides.
    pub variables: Vec<String>,
    /// Whether the template may be used for new notifications.
    pub is_active: bool,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
    /// When the template was last updated.
    pub updated_at: DateTime<Utc>,
}
