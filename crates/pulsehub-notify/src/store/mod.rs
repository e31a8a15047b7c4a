//! Store ports for the notification engine.
//!
//! Persistence is an external collaborator: the engine only ever talks to
//! these async traits. A relational implementation binds each method to a
//! query; [`memory::MemoryStore`] backs tests and standalone mode.

pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pulsehub_core::result::AppResult;
use pulsehub_entity::batch::NotificationBatch;
use pulsehub_entity::notification::{
    Notification, NotificationCategory, NotificationPriority, NotificationStatus,
};
use pulsehub_entity::preference::NotificationPreference;
use pulsehub_entity::template::NotificationTemplate;
use pulsehub_entity::user::UserAccount;

pub use memory::MemoryStore;

/// Filters for listing a user's notifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFilter {
    /// Only notifications in this status.
    pub status: Option<NotificationStatus>,
    /// Only notifications in this category.
    pub category: Option<NotificationCategory>,
    /// Only notifications with this priority.
    pub priority: Option<NotificationPriority>,
    /// Only unread notifications.
    pub unread_only: bool,
    /// Only notifications created at or after this time.
    pub start_date: Option<DateTime<Utc>>,
    /// Only notifications created at or before this time.
    pub end_date: Option<DateTime<Utc>>,
}

impl NotificationFilter {
    /// Check whether a notification passes every active filter.
    pub fn matches(&self, n: &Notification) -> bool {
        if let Some(status) = self.status {
            if n.status != status {
                return false;
            }
        }
        if let Some(category) = self.category {
            if n.category != category {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if n.priority != priority {
                return false;
            }
        }
        if self.unread_only && !n.is_unread() {
            return false;
        }
        if let Some(start) = self.start_date {
            if n.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if n.created_at > end {
                return false;
            }
        }
        true
    }
}

/// Per-user notification statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationStats {
    /// Total notifications for the user.
    pub total: u64,
    /// Unread notifications.
    pub unread: u64,
    /// Counts grouped by category.
    pub by_category: HashMap<String, u64>,
    /// Counts grouped by priority.
    pub by_priority: HashMap<String, u64>,
    /// Counts grouped by status.
    pub by_status: HashMap<String, u64>,
}

/// Persistence port for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new notification.
    async fn insert(&self, notification: &Notification) -> AppResult<()>;

    /// Find a notification by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Persist an updated notification.
    async fn update(&self, notification: &Notification) -> AppResult<()>;

    /// List a user's notifications, newest first, starting after the
    /// keyset `position` when given.
    async fn find_by_user(
        &self,
        user_id: Uuid,
        filter: &NotificationFilter,
        limit: usize,
        position: Option<(DateTime<Utc>, Uuid)>,
    ) -> AppResult<Vec<Notification>>;

    /// Mark the given notifications read, scoped to unread delivered
    /// (`Sent`) rows owned by `user_id`. The ownership scope is enforced
    /// here and is never bypassable. Returns the number of rows updated.
    async fn mark_read(&self, ids: &[Uuid], user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Mark all of a user's unread delivered notifications read, optionally
    /// limited to one category. Returns the number of rows updated.
    async fn mark_all_read(
        &self,
        user_id: Uuid,
        category: Option<NotificationCategory>,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Record a click-through on a delivered notification owned by
    /// `user_id`. Returns whether a row was updated.
    async fn mark_clicked(&self, id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    /// Find scheduled notifications due for delivery: status `Scheduled`,
    /// `scheduled_for <= now`, and not yet expired.
    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Notification>>;

    /// Delete undelivered rows past their expiry (status Pending, Scheduled,
    /// or Failed only). Returns the number of rows removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Find pending members of a batch fan-out by its event type, category,
    /// and creation window.
    async fn find_batch_members(
        &self,
        event_type: &str,
        category: NotificationCategory,
        created_after: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>>;

    /// Compute per-user statistics.
    async fn stats(&self, user_id: Uuid) -> AppResult<NotificationStats>;
}

/// Persistence port for notification templates.
#[async_trait]
pub trait TemplateStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new template. A duplicate key is a conflict.
    async fn insert(&self, template: &NotificationTemplate) -> AppResult<()>;

    /// Persist an updated template.
    async fn update(&self, template: &NotificationTemplate) -> AppResult<()>;

    /// Find a template by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationTemplate>>;

    /// Find a template by its unique key.
    async fn find_by_key(&self, key: &str) -> AppResult<Option<NotificationTemplate>>;

    /// List templates, optionally limited to one category.
    async fn list(
        &self,
        category: Option<NotificationCategory>,
    ) -> AppResult<Vec<NotificationTemplate>>;
}

/// Persistence port for notification preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Replace all preference rows for a user (delete then recreate).
    async fn replace_all(
        &self,
        user_id: Uuid,
        preferences: &[NotificationPreference],
    ) -> AppResult<()>;

    /// Find a user's preference row for one category.
    async fn find(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
    ) -> AppResult<Option<NotificationPreference>>;

    /// Find all preference rows for a user.
    async fn find_all(&self, user_id: Uuid) -> AppResult<Vec<NotificationPreference>>;
}

/// Persistence port for batch records.
#[async_trait]
pub trait BatchStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new batch record.
    async fn insert(&self, batch: &NotificationBatch) -> AppResult<()>;

    /// Persist an updated batch record.
    async fn update(&self, batch: &NotificationBatch) -> AppResult<()>;

    /// Find a batch by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationBatch>>;
}

/// Read-only port onto the accounts subsystem.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user account by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserAccount>>;
}
