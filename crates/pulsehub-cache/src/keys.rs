//! Cache key builders for all PulseHub cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use uuid::Uuid;

use pulsehub_entity::notification::NotificationCategory;

/// Prefix applied to all PulseHub cache keys.
const PREFIX: &str = "pulsehub";

// ── Notification keys ──────────────────────────────────────

/// Cache key for unread notification count.
pub fn unread_notification_count(user_id: Uuid) -> String {
    format!("{PREFIX}:notif:unread:{user_id}")
}

/// Cache key for per-user notification statistics.
pub fn notification_stats(user_id: Uuid) -> String {
    format!("{PREFIX}:notif:stats:{user_id}")
}

// ── Preference keys ────────────────────────────────────────

/// Cache key for a user's preference row for one category.
pub fn notification_preference(user_id: Uuid, category: NotificationCategory) -> String {
    format!("{PREFIX}:notif:prefs:{user_id}:{category}")
}
