//! Engine facade — wires the lifecycle service, dispatcher, queries, batch
//! coordinator, and admin flows together and owns the dispatch queue
//! consumer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use pulsehub_cache::CacheManager;
use pulsehub_core::config::cache::CacheConfig;
use pulsehub_core::config::notifications::NotificationsConfig;
use pulsehub_core::types::cursor::{CursorPage, CursorRequest};
use pulsehub_entity::batch::NotificationBatch;
use pulsehub_entity::notification::{Notification, NotificationCategory};
use pulsehub_entity::preference::NotificationPreference;
use pulsehub_entity::template::NotificationTemplate;

use crate::admin::{PreferenceAdmin, PreferenceInput, TemplateAdmin, TemplateInput, TemplateUpdate};
use crate::batch::{BatchCoordinator, BatchDeliveryResult, BatchInput};
use crate::channel::{ChannelRegistry, DeliveryOutcome};
use crate::dispatch::Dispatcher;
use crate::error::NotifyResult;
use crate::preference::PreferenceResolver;
use crate::query::NotificationQueries;
use crate::queue;
use crate::rate_limit::RateLimiter;
use crate::service::{CreateNotificationInput, NotificationService};
use crate::store::{
    BatchStore, MemoryStore, NotificationFilter, NotificationStats, NotificationStore,
    PreferenceStore, TemplateStore, UserStore,
};
use crate::template::TemplateRenderer;

/// The store ports the engine is constructed over.
#[derive(Debug, Clone)]
pub struct NotificationStores {
    /// Notification rows.
    pub notifications: Arc<dyn NotificationStore>,
    /// Template rows.
    pub templates: Arc<dyn TemplateStore>,
    /// Preference rows.
    pub preferences: Arc<dyn PreferenceStore>,
    /// Batch records.
    pub batches: Arc<dyn BatchStore>,
    /// User accounts (read-only).
    pub users: Arc<dyn UserStore>,
}

impl NotificationStores {
    /// Bind every port to one in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            notifications: store.clone(),
            templates: store.clone(),
            preferences: store.clone(),
            batches: store.clone(),
            users: store,
        }
    }
}

/// The assembled notification engine.
///
/// Construction wires every component with shared `Arc` references and
/// spawns the dispatch queue consumer; [`NotificationEngine::shutdown`]
/// drains it.
#[derive(Debug)]
pub struct NotificationEngine {
    service: Arc<NotificationService>,
    dispatcher: Arc<Dispatcher>,
    batches: Arc<BatchCoordinator>,
    queries: Arc<NotificationQueries>,
    templates: Arc<TemplateAdmin>,
    preferences: Arc<PreferenceAdmin>,
    consumer: JoinHandle<()>,
}

impl NotificationEngine {
    /// Wire the engine and start the dispatch queue consumer.
    ///
    /// Must run inside a tokio runtime.
    pub fn start(
        stores: NotificationStores,
        registry: ChannelRegistry,
        cache: CacheManager,
        config: NotificationsConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        let registry = Arc::new(registry);
        let resolver = Arc::new(PreferenceResolver::new(
            stores.preferences.clone(),
            cache.clone(),
            Duration::from_secs(cache_config.default_ttl_seconds),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let renderer = TemplateRenderer::new(stores.templates.clone());

        let (dispatch_tx, dispatch_rx) = queue::channel(config.dispatch_queue_size);

        let dispatcher = Arc::new(Dispatcher::new(
            stores.notifications.clone(),
            stores.users.clone(),
            registry,
            resolver.clone(),
            cache.clone(),
            config.clone(),
        ));

        let service = Arc::new(NotificationService::new(
            stores.notifications.clone(),
            stores.users.clone(),
            renderer,
            resolver.clone(),
            rate_limiter,
            cache.clone(),
            config.clone(),
            dispatch_tx,
        ));

        let batches = Arc::new(BatchCoordinator::new(
            stores.batches.clone(),
            stores.notifications.clone(),
            service.clone(),
            dispatcher.clone(),
            config,
        ));

        let queries = Arc::new(NotificationQueries::new(
            stores.notifications,
            cache,
            Duration::from_secs(cache_config.stats_ttl_seconds),
        ));

        let templates = Arc::new(TemplateAdmin::new(stores.templates));
        let preferences = Arc::new(PreferenceAdmin::new(stores.preferences, resolver));

        let consumer = queue::spawn_consumer(dispatcher.clone(), dispatch_rx);

        tracing::info!("Notification engine started");

        Self {
            service,
            dispatcher,
            batches,
            queries,
            templates,
            preferences,
            consumer,
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Create a notification; immediate delivery is queued in-process.
    pub async fn create_notification(
        &self,
        input: CreateNotificationInput,
    ) -> NotifyResult<Notification> {
        self.service.create(input).await
    }

    /// Fan one payload out to many users as a batch.
    pub async fn create_batch_notification(
        &self,
        user_ids: &[Uuid],
        input: BatchInput,
    ) -> NotifyResult<NotificationBatch> {
        self.batches.create_batch(user_ids, input).await
    }

    /// Dispatch one notification now, returning per-channel results.
    pub async fn send_notification(&self, id: Uuid) -> NotifyResult<Vec<DeliveryOutcome>> {
        self.dispatcher.dispatch(id).await
    }

    /// Dispatch a batch's pending members.
    pub async fn send_batch_notifications(
        &self,
        batch_id: Uuid,
    ) -> NotifyResult<BatchDeliveryResult> {
        self.batches.send_batch(batch_id).await
    }

    /// Administratively cancel a batch.
    pub async fn cancel_batch(&self, batch_id: Uuid) -> NotifyResult<NotificationBatch> {
        self.batches.cancel_batch(batch_id).await
    }

    /// Defer a notification to a delivery time.
    pub async fn schedule_notification(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> NotifyResult<Notification> {
        self.service.schedule(id, at).await
    }

    /// Mark notifications read, scoped to rows owned by `user_id`.
    pub async fn mark_as_read(&self, ids: &[Uuid], user_id: Uuid) -> NotifyResult<u64> {
        self.service.mark_read(ids, user_id).await
    }

    /// Mark all of a user's notifications read, optionally per category.
    pub async fn mark_all_as_read(
        &self,
        user_id: Uuid,
        category: Option<NotificationCategory>,
    ) -> NotifyResult<u64> {
        self.service.mark_all_read(user_id, category).await
    }

    /// Record a click-through on a notification owned by `user_id`.
    pub async fn mark_as_clicked(&self, id: Uuid, user_id: Uuid) -> NotifyResult<bool> {
        self.service.mark_clicked(id, user_id).await
    }

    // ── Queries ────────────────────────────────────────────────

    /// List a user's notifications with filters and cursor pagination.
    pub async fn get_user_notifications(
        &self,
        user_id: Uuid,
        filter: &NotificationFilter,
        page: &CursorRequest,
    ) -> NotifyResult<CursorPage<Notification>> {
        self.queries.list(user_id, filter, page).await
    }

    /// Per-user statistics, cached with a short TTL.
    pub async fn get_notification_stats(&self, user_id: Uuid) -> NotifyResult<NotificationStats> {
        self.queries.stats(user_id).await
    }

    /// Unread count fast path.
    pub async fn get_unread_count(&self, user_id: Uuid) -> NotifyResult<u64> {
        self.queries.unread_count(user_id).await
    }

    // ── Background entry points ────────────────────────────────

    /// Dispatch due scheduled notifications; returns the dispatched count.
    pub async fn process_scheduled_notifications(&self) -> NotifyResult<u64> {
        self.dispatcher.process_scheduled().await
    }

    /// Sweep expired undelivered notifications; returns the removed count.
    pub async fn cleanup_expired_notifications(&self) -> NotifyResult<u64> {
        self.service.cleanup_expired().await
    }

    // ── Administration ─────────────────────────────────────────

    /// Create a notification template.
    pub async fn create_template(
        &self,
        input: TemplateInput,
    ) -> NotifyResult<NotificationTemplate> {
        self.templates.create_template(input).await
    }

    /// Apply a partial template update.
    pub async fn update_template(
        &self,
        id: Uuid,
        update: TemplateUpdate,
    ) -> NotifyResult<NotificationTemplate> {
        self.templates.update_template(id, update).await
    }

    /// Fetch a template by key.
    pub async fn get_template(&self, key: &str) -> NotifyResult<NotificationTemplate> {
        self.templates.get_template(key).await
    }

    /// List templates, optionally limited to one category.
    pub async fn list_templates(
        &self,
        category: Option<NotificationCategory>,
    ) -> NotifyResult<Vec<NotificationTemplate>> {
        self.templates.list_templates(category).await
    }

    /// Replace a user's preference rows.
    pub async fn update_user_preferences(
        &self,
        user_id: Uuid,
        preferences: Vec<PreferenceInput>,
    ) -> NotifyResult<Vec<NotificationPreference>> {
        self.preferences.update_preferences(user_id, preferences).await
    }

    /// Fetch a user's preference rows.
    pub async fn get_user_preferences(
        &self,
        user_id: Uuid,
    ) -> NotifyResult<Vec<NotificationPreference>> {
        self.preferences.get_preferences(user_id).await
    }

    // ── Component access ───────────────────────────────────────

    /// The dispatcher, for background drivers.
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// The lifecycle service, for background drivers.
    pub fn service(&self) -> Arc<NotificationService> {
        self.service.clone()
    }

    // ── Shutdown ───────────────────────────────────────────────

    /// Stop the engine, draining the dispatch queue consumer.
    pub async fn shutdown(self) {
        let Self {
            service,
            dispatcher,
            batches,
            queries,
            templates,
            preferences,
            consumer,
        } = self;

        // The consumer exits once every queue sender is dropped.
        drop(batches);
        drop(service);
        drop(queries);
        drop(templates);
        drop(preferences);
        drop(dispatcher);

        if tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .is_err()
        {
            tracing::warn!("Dispatch queue consumer did not stop within the shutdown grace period");
        } else {
            tracing::info!("Notification engine stopped");
        }
    }
}
