//! Read-side queries: cursor-paginated listing and cached statistics.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use pulsehub_cache::{CacheManager, keys};
use pulsehub_core::traits::cache::CacheProvider;
use pulsehub_core::types::cursor::{CursorPage, CursorRequest};
use pulsehub_entity::notification::Notification;

use crate::error::NotifyResult;
use crate::store::{NotificationFilter, NotificationStats, NotificationStore};

/// Read-side query service for user-facing notification listings.
#[derive(Debug, Clone)]
pub struct NotificationQueries {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
    /// Read-through cache for stats.
    cache: CacheManager,
    /// TTL for cached statistics.
    stats_ttl: Duration,
}

impl NotificationQueries {
    /// Create a new query service.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        cache: CacheManager,
        stats_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            stats_ttl,
        }
    }

    /// List a user's notifications, newest first, with cursor pagination.
    ///
    /// The page limit is silently clamped to the global maximum.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &NotificationFilter,
        page: &CursorRequest,
    ) -> NotifyResult<CursorPage<Notification>> {
        let limit = page.effective_limit();
        let position = page.position()?;

        // Fetch one extra row to learn whether a next page exists.
        let mut items = self
            .store
            .find_by_user(user_id, filter, limit + 1, position)
            .await?;

        let has_more = items.len() > limit;
        items.truncate(limit);
        let last = items.last().map(|n| (n.created_at, n.id));

        Ok(CursorPage::new(items, has_more, last))
    }

    /// Per-user statistics with a short-TTL read-through cache.
    pub async fn stats(&self, user_id: Uuid) -> NotifyResult<NotificationStats> {
        let key = keys::notification_stats(user_id);

        if let Some(cached) = self.cache.get_json::<NotificationStats>(&key).await? {
            return Ok(cached);
        }

        let stats = self.store.stats(user_id).await?;
        self.cache.set_json(&key, &stats, self.stats_ttl).await?;
        Ok(stats)
    }

    /// Unread notification count, served from the cached statistics.
    pub async fn unread_count(&self, user_id: Uuid) -> NotifyResult<u64> {
        Ok(self.stats(user_id).await?.unread)
    }
}

/// Drop a user's cached notification aggregates after a lifecycle mutation.
///
/// Invalidation failures only degrade cache freshness, so they are logged
/// rather than propagated.
pub(crate) async fn invalidate_user_caches(cache: &CacheManager, user_id: Uuid) {
    for key in [
        keys::notification_stats(user_id),
        keys::unread_notification_count(user_id),
    ] {
        if let Err(err) = cache.delete(&key).await {
            tracing::warn!(%user_id, error = %err, "Failed to invalidate notification cache");
        }
    }
}
