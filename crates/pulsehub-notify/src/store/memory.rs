//! In-memory store implementation backing tests and standalone mode.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use pulsehub_core::error::AppError;
use pulsehub_core::result::AppResult;
use pulsehub_entity::batch::NotificationBatch;
use pulsehub_entity::notification::{
    Notification, NotificationCategory, NotificationStatus,
};
use pulsehub_entity::preference::NotificationPreference;
use pulsehub_entity::template::NotificationTemplate;
use pulsehub_entity::user::UserAccount;

use super::{
    BatchStore, NotificationFilter, NotificationStats, NotificationStore, PreferenceStore,
    TemplateStore, UserStore,
};

/// Thread-safe in-memory implementation of every store port.
///
/// Each mutation touches a single map entry, so concurrent dispatchers
/// cannot interleave a load-mutate-save on the same row.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    notifications: Arc<DashMap<Uuid, Notification>>,
    templates: Arc<DashMap<Uuid, NotificationTemplate>>,
    template_keys: Arc<DashMap<String, Uuid>>,
    preferences: Arc<DashMap<(Uuid, NotificationCategory), NotificationPreference>>,
    batches: Arc<DashMap<Uuid, NotificationBatch>>,
    users: Arc<DashMap<Uuid, UserAccount>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user account.
    pub fn add_user(&self, user: UserAccount) {
        self.users.insert(user.id, user);
    }

    /// Seed a preference row.
    pub fn add_preference(&self, preference: NotificationPreference) {
        self.preferences
            .insert((preference.user_id, preference.category), preference);
    }

    /// Seed a template.
    pub fn add_template(&self, template: NotificationTemplate) {
        self.template_keys
            .insert(template.key.clone(), template.id);
        self.templates.insert(template.id, template);
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, notification: &Notification) -> AppResult<()> {
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        Ok(self.notifications.get(&id).map(|entry| entry.clone()))
    }

    async fn update(&self, notification: &Notification) -> AppResult<()> {
        match self.notifications.get_mut(&notification.id) {
            Some(mut entry) => {
                *entry = notification.clone();
                Ok(())
            }
            None => Err(AppError::store(format!(
                "Notification {} does not exist",
                notification.id
            ))),
        }
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        filter: &NotificationFilter,
        limit: usize,
        position: Option<(DateTime<Utc>, Uuid)>,
    ) -> AppResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.user_id == user_id && filter.matches(entry))
            .map(|entry| entry.clone())
            .collect();

        // Newest first, id as tiebreaker for a stable keyset order.
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        if let Some((created_at, id)) = position {
            rows.retain(|n| {
                n.created_at < created_at || (n.created_at == created_at && n.id < id)
            });
        }

        rows.truncate(limit);
        Ok(rows)
    }

    async fn mark_read(&self, ids: &[Uuid], user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut updated = 0;
        for id in ids {
            if let Some(mut entry) = self.notifications.get_mut(id) {
                if entry.user_id == user_id
                    && entry.status == NotificationStatus::Sent
                    && entry.read_at.is_none()
                {
                    entry.status = NotificationStatus::Read;
                    entry.read_at = Some(now);
                    entry.updated_at = now;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn mark_all_read(
        &self,
        user_id: Uuid,
        category: Option<NotificationCategory>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut updated = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.user_id == user_id
                && entry.status == NotificationStatus::Sent
                && entry.read_at.is_none()
                && category.is_none_or(|c| entry.category == c)
            {
                entry.status = NotificationStatus::Read;
                entry.read_at = Some(now);
                entry.updated_at = now;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn mark_clicked(&self, id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        if let Some(mut entry) = self.notifications.get_mut(&id) {
            let delivered = matches!(
                entry.status,
                NotificationStatus::Sent | NotificationStatus::Read
            );
            if entry.user_id == user_id && delivered && entry.clicked_at.is_none() {
                entry.clicked_at = Some(now);
                entry.updated_at = now;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn find_due_scheduled(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<Vec<Notification>> {
        let mut due: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| {
                entry.status == NotificationStatus::Scheduled
                    && entry.scheduled_for.is_some_and(|at| at <= now)
                    && entry.expires_at > now
            })
            .map(|entry| entry.clone())
            .collect();

        due.sort_by_key(|n| n.scheduled_for);
        due.truncate(limit);
        Ok(due)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let before = self.notifications.len() as u64;
        self.notifications
            .retain(|_, n| !(n.expires_at < now && n.status.is_cleanup_eligible()));
        Ok(before - self.notifications.len() as u64)
    }

    async fn find_batch_members(
        &self,
        event_type: &str,
        category: NotificationCategory,
        created_after: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>> {
        let mut members: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| {
                entry.status == NotificationStatus::Pending
                    && entry.event_type == event_type
                    && entry.category == category
                    && entry.created_at >= created_after
            })
            .map(|entry| entry.clone())
            .collect();

        members.sort_by_key(|n| n.created_at);
        Ok(members)
    }

    async fn stats(&self, user_id: Uuid) -> AppResult<NotificationStats> {
        let mut stats = NotificationStats::default();
        for entry in self.notifications.iter() {
            if entry.user_id != user_id {
                continue;
            }
            stats.total += 1;
            if entry.is_unread() {
                stats.unread += 1;
            }
            *stats
                .by_category
                .entry(entry.category.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_priority
                .entry(entry.priority.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_status
                .entry(entry.status.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn insert(&self, template: &NotificationTemplate) -> AppResult<()> {
        if self.template_keys.contains_key(&template.key) {
            return Err(AppError::conflict(format!(
                "Template key '{}' already exists",
                template.key
            )));
        }
        self.template_keys
            .insert(template.key.clone(), template.id);
        self.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn update(&self, template: &NotificationTemplate) -> AppResult<()> {
        let previous = self
            .templates
            .get(&template.id)
            .map(|entry| entry.key.clone())
            .ok_or_else(|| {
                AppError::store(format!("Template {} does not exist", template.id))
            })?;

        if previous != template.key {
            if self.template_keys.contains_key(&template.key) {
                return Err(AppError::conflict(format!(
                    "Template key '{}' already exists",
                    template.key
                )));
            }
            self.template_keys.remove(&previous);
            self.template_keys
                .insert(template.key.clone(), template.id);
        }

        self.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationTemplate>> {
        Ok(self.templates.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_key(&self, key: &str) -> AppResult<Option<NotificationTemplate>> {
        let id = match self.template_keys.get(key) {
            Some(entry) => *entry,
            None => return Ok(None),
        };
        Ok(self.templates.get(&id).map(|entry| entry.clone()))
    }

    async fn list(
        &self,
        category: Option<NotificationCategory>,
    ) -> AppResult<Vec<NotificationTemplate>> {
        let mut templates: Vec<NotificationTemplate> = self
            .templates
            .iter()
            .filter(|entry| category.is_none_or(|c| entry.category == c))
            .map(|entry| entry.clone())
            .collect();
        templates.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(templates)
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn replace_all(
        &self,
        user_id: Uuid,
        preferences: &[NotificationPreference],
    ) -> AppResult<()> {
        self.preferences.retain(|(uid, _), _| *uid != user_id);
        for preference in preferences {
            self.preferences
                .insert((user_id, preference.category), preference.clone());
        }
        Ok(())
    }

    async fn find(
        &self,
        user_id: Uuid,
        category: NotificationCategory,
    ) -> AppResult<Option<NotificationPreference>> {
        Ok(self
            .preferences
            .get(&(user_id, category))
            .map(|entry| entry.clone()))
    }

    async fn find_all(&self, user_id: Uuid) -> AppResult<Vec<NotificationPreference>> {
        let mut prefs: Vec<NotificationPreference> = self
            .preferences
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.clone())
            .collect();
        prefs.sort_by_key(|p| p.category.as_str());
        Ok(prefs)
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn insert(&self, batch: &NotificationBatch) -> AppResult<()> {
        self.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn update(&self, batch: &NotificationBatch) -> AppResult<()> {
        match self.batches.get_mut(&batch.id) {
            Some(mut entry) => {
                *entry = batch.clone();
                Ok(())
            }
            None => Err(AppError::store(format!("Batch {} does not exist", batch.id))),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationBatch>> {
        Ok(self.batches.get(&id).map(|entry| entry.clone()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserAccount>> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }
}
