//! Dispatch and retry engine — drives notification delivery and the
//! scheduled-notification scan.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use uuid::Uuid;

use pulsehub_cache::CacheManager;
use pulsehub_core::config::notifications::NotificationsConfig;
use pulsehub_entity::notification::{Notification, NotificationChannel, NotificationStatus};
use pulsehub_entity::user::UserAccount;

use crate::channel::{ChannelRegistry, DeliveryOutcome};
use crate::error::{NotifyError, NotifyResult};
use crate::preference::PreferenceResolver;
use crate::query;
use crate::store::{NotificationStore, UserStore};

/// Cap on the backoff exponent so the shift cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Drives notification state transitions: delivery, quiet-hours deferral,
/// expiry, and retry with exponential backoff.
#[derive(Debug)]
pub struct Dispatcher {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
    /// User account lookups for delivery.
    users: Arc<dyn UserStore>,
    /// Channel adapter registry.
    registry: Arc<ChannelRegistry>,
    /// Preference resolver for quiet hours.
    prefs: Arc<PreferenceResolver>,
    /// Cache for stats invalidation on state changes.
    cache: CacheManager,
    /// Engine configuration.
    config: NotificationsConfig,
    /// Notifications currently being dispatched by this process. Guards
    /// against the scan loop and API-triggered sends racing on one row.
    in_flight: Mutex<HashSet<Uuid>>,
}

/// Marker for an id held in the in-flight set; removed on drop.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

impl Dispatcher {
    /// Create a new dispatcher.
    pub fn new(
        store: Arc<dyn NotificationStore>,
        users: Arc<dyn UserStore>,
        registry: Arc<ChannelRegistry>,
        prefs: Arc<PreferenceResolver>,
        cache: CacheManager,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            store,
            users,
            registry,
            prefs,
            cache,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Attempt delivery of one notification on every stored channel.
    ///
    /// Returns one [`DeliveryOutcome`] per channel, in the stored channel
    /// order. Returns an empty list when there is nothing to do: the row is
    /// not dispatchable, another dispatch is in flight, or delivery was
    /// deferred for quiet hours.
    pub async fn dispatch(&self, id: Uuid) -> NotifyResult<Vec<DeliveryOutcome>> {
        let _guard = match self.begin(id) {
            Some(guard) => guard,
            None => {
                tracing::trace!(notification_id = %id, "Dispatch already in flight, skipping");
                return Ok(Vec::new());
            }
        };

        let now = Utc::now();
        let mut notification = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(NotifyError::NotFound(id))?;

        if !notification.status.is_dispatchable() {
            tracing::debug!(
                notification_id = %id,
                status = %notification.status,
                "Notification is not dispatchable, skipping"
            );
            return Ok(Vec::new());
        }

        if notification.is_expired(now) {
            notification.status = NotificationStatus::Expired;
            notification.updated_at = now;
            self.store.update(&notification).await?;
            query::invalidate_user_caches(&self.cache, notification.user_id).await;
            return Err(NotifyError::Expired(id));
        }

        if self.config.quiet_hours_enabled
            && self
                .prefs
                .is_quiet_hours(notification.user_id, notification.category, now)
                .await?
        {
            let resume = self
                .prefs
                .next_delivery_time(notification.user_id, notification.category, now)
                .await?;
            notification.status = NotificationStatus::Scheduled;
            notification.scheduled_for = Some(resume);
            notification.updated_at = now;
            self.store.update(&notification).await?;

            tracing::debug!(
                notification_id = %id,
                resume_at = %resume,
                "Delivery deferred for quiet hours"
            );
            return Ok(Vec::new());
        }

        if notification.channels.is_empty() {
            // Channels are fixed at creation, so retrying cannot help.
            notification.status = NotificationStatus::Failed;
            notification.retry_count = notification.max_retries.max(notification.retry_count + 1);
            notification.last_error = Some("no delivery channels enabled".to_string());
            notification.updated_at = now;
            self.store.update(&notification).await?;
            query::invalidate_user_caches(&self.cache, notification.user_id).await;

            tracing::debug!(notification_id = %id, "No delivery channels, marked failed");
            return Ok(Vec::new());
        }

        let recipient = self
            .users
            .find_by_id(notification.user_id)
            .await?
            .ok_or(NotifyError::InvalidUser(notification.user_id))?;

        let outcomes = self.attempt_channels(&notification, &recipient).await;

        let any_success = outcomes.iter().any(|o| o.success);
        notification.retry_count += 1;
        notification.last_error = outcomes
            .iter()
            .find(|o| !o.success)
            .and_then(|o| o.error.clone());
        notification.updated_at = now;
        if any_success {
            notification.status = NotificationStatus::Sent;
            notification.sent_at = Some(now);
            notification.scheduled_for = None;
        } else {
            notification.status = NotificationStatus::Failed;
        }
        self.store.update(&notification).await?;
        query::invalidate_user_caches(&self.cache, notification.user_id).await;

        if any_success {
            tracing::info!(
                notification_id = %id,
                user_id = %notification.user_id,
                channels = notification.channels.len(),
                "Notification dispatched"
            );
        } else {
            tracing::warn!(
                notification_id = %id,
                user_id = %notification.user_id,
                error = notification.last_error.as_deref().unwrap_or("unknown"),
                "Every delivery channel failed"
            );
        }

        Ok(outcomes)
    }

    /// Scan for due scheduled notifications and dispatch each one.
    ///
    /// Returns how many dispatched with at least one successful channel.
    /// Per-notification failures are recorded on the entity and never halt
    /// the scan. Safe to invoke concurrently or back-to-back: the scan
    /// predicate excludes non-scheduled rows and in-flight ids are skipped.
    pub async fn process_scheduled(&self) -> NotifyResult<u64> {
        let now = Utc::now();
        let due = self
            .store
            .find_due_scheduled(now, self.config.dispatch_batch_size)
            .await?;

        if due.is_empty() {
            return Ok(0);
        }
        tracing::debug!(count = due.len(), "Processing due scheduled notifications");

        let mut dispatched = 0u64;
        for notification in due {
            match self.dispatch(notification.id).await {
                Ok(outcomes) if outcomes.iter().any(|o| o.success) => dispatched += 1,
                // Deferred, raced, or permanently failed inside dispatch.
                Ok(outcomes) if outcomes.is_empty() => {}
                Ok(_) => {
                    // Every channel failed; the attempt is already counted.
                    self.reschedule_or_fail(notification.id, now, false).await;
                }
                Err(NotifyError::Expired(_)) => {}
                Err(err) => {
                    tracing::warn!(
                        notification_id = %notification.id,
                        error = %err,
                        "Dispatch failed before delivery"
                    );
                    self.reschedule_or_fail(notification.id, now, true).await;
                }
            }
        }

        Ok(dispatched)
    }

    /// Apply retry policy after a failed attempt: permanent failure once
    /// retries are exhausted, otherwise exponential backoff.
    ///
    /// `count_attempt` is set for failures thrown before channel results
    /// were aggregated, where `retry_count` was not yet incremented.
    async fn reschedule_or_fail(&self, id: Uuid, now: DateTime<Utc>, count_attempt: bool) {
        let mut notification = match self.store.find_by_id(id).await {
            Ok(Some(notification)) => notification,
            Ok(None) => return,
            Err(err) => {
                tracing::error!(notification_id = %id, error = %err, "Failed to load for retry");
                return;
            }
        };

        if count_attempt {
            notification.retry_count += 1;
        }
        notification.updated_at = now;

        if notification.retry_count >= notification.max_retries {
            notification.status = NotificationStatus::Failed;
            if let Err(err) = self.store.update(&notification).await {
                tracing::error!(notification_id = %id, error = %err, "Failed to persist failure");
            }
            tracing::warn!(
                notification_id = %id,
                retry_count = notification.retry_count,
                "Delivery permanently failed, retries exhausted"
            );
            return;
        }

        let exponent = notification.retry_count.min(MAX_BACKOFF_EXPONENT);
        let delay_ms = self.config.retry_delay_ms.saturating_mul(1u64 << exponent);
        notification.status = NotificationStatus::Scheduled;
        notification.scheduled_for = Some(now + Duration::milliseconds(delay_ms as i64));

        if let Err(err) = self.store.update(&notification).await {
            tracing::error!(notification_id = %id, error = %err, "Failed to persist retry");
            return;
        }

        tracing::debug!(
            notification_id = %id,
            retry_count = notification.retry_count,
            delay_ms,
            "Delivery rescheduled with backoff"
        );
    }

    /// Attempt delivery on every channel concurrently, joining results in
    /// channel order. One adapter's failure never prevents the others.
    async fn attempt_channels(
        &self,
        notification: &Notification,
        recipient: &UserAccount,
    ) -> Vec<DeliveryOutcome> {
        let attempts = notification.channels.iter().map(|&channel| async move {
            if !self.channel_enabled(channel) {
                return DeliveryOutcome::failure(channel, format!("{channel} channel is disabled"));
            }
            match self.registry.get(channel) {
                Some(adapter) => match adapter.send(notification, recipient).await {
                    Ok(()) => DeliveryOutcome::success(channel),
                    Err(err) => DeliveryOutcome::failure(channel, err.to_string()),
                },
                None => DeliveryOutcome::failure(
                    channel,
                    format!("no adapter registered for {channel}"),
                ),
            }
        });

        join_all(attempts).await
    }

    /// Check whether a channel is enabled at the global config level.
    fn channel_enabled(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Realtime => self.config.enable_realtime,
            NotificationChannel::Email => self.config.enable_email,
            NotificationChannel::Push => self.config.enable_push,
        }
    }

    /// Mark an id in flight, returning `None` if it already is.
    fn begin(&self, id: Uuid) -> Option<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(id) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use pulsehub_core::config::cache::CacheConfig;
    use pulsehub_core::result::AppResult;
    use pulsehub_entity::notification::{NotificationCategory, NotificationPriority};
    use pulsehub_entity::preference::NotificationPreference;

    use crate::channel::ChannelAdapter;
    use crate::store::MemoryStore;

    /// Adapter fake that records sends and optionally fails.
    #[derive(Debug)]
    struct RecordingAdapter {
        channel: NotificationChannel,
        sent: AtomicU32,
        fail_with: Option<String>,
    }

    impl RecordingAdapter {
        fn succeeding(channel: NotificationChannel) -> Arc<Self> {
            Arc::new(Self {
                channel,
                sent: AtomicU32::new(0),
                fail_with: None,
            })
        }

        fn failing(channel: NotificationChannel, message: &str) -> Arc<Self> {
            Arc::new(Self {
                channel,
                sent: AtomicU32::new(0),
                fail_with: Some(message.to_string()),
            })
        }

        fn send_count(&self) -> u32 {
            self.sent.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChannelAdapter for RecordingAdapter {
        fn channel(&self) -> NotificationChannel {
            self.channel
        }

        async fn send(
            &self,
            _notification: &Notification,
            _recipient: &UserAccount,
        ) -> NotifyResult<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(message) => Err(NotifyError::from(
                    pulsehub_core::error::AppError::external_service(message.clone()),
                )),
                None => Ok(()),
            }
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        dispatcher: Dispatcher,
        user_id: Uuid,
    }

    impl Fixture {
        async fn get(&self, id: Uuid) -> Notification {
            NotificationStore::find_by_id(&*self.store, id)
                .await
                .unwrap()
                .unwrap()
        }

        async fn put(&self, notification: &Notification) {
            NotificationStore::update(&*self.store, notification)
                .await
                .unwrap();
        }
    }

    fn make_fixture(
        adapters: Vec<Arc<dyn ChannelAdapter>>,
        config: NotificationsConfig,
    ) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let user_id = Uuid::new_v4();
        store.add_user(UserAccount {
            id: user_id,
            username: "maya".to_string(),
            email: Some("maya@example.com".to_string()),
            is_active: true,
            created_at: Utc::now(),
        });

        let mut registry = ChannelRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }

        let cache = CacheManager::new(&CacheConfig::default()).unwrap();
        let prefs = Arc::new(PreferenceResolver::new(
            store.clone(),
            cache.clone(),
            std::time::Duration::from_secs(60),
        ));

        let dispatcher = Dispatcher::new(
            store.clone(),
            store.clone(),
            Arc::new(registry),
            prefs,
            cache,
            config,
        );

        Fixture {
            store,
            dispatcher,
            user_id,
        }
    }

    fn make_notification(
        user_id: Uuid,
        channels: Vec<NotificationChannel>,
        status: NotificationStatus,
    ) -> Notification {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            user_id,
            template_id: None,
            event_type: "activity.logged".to_string(),
            category: NotificationCategory::Activity,
            priority: NotificationPriority::Medium,
            title: "Run logged".to_string(),
            message: "You logged a run".to_string(),
            email_body: None,
            payload: None,
            channels,
            status,
            scheduled_for: None,
            sent_at: None,
            read_at: None,
            clicked_at: None,
            expires_at: now + chrono::Duration::hours(1),
            retry_count: 0,
            max_retries: 3,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_dispatch_marks_sent_on_success() {
        let adapter = RecordingAdapter::succeeding(NotificationChannel::Realtime);
        let fixture = make_fixture(
            vec![adapter.clone() as Arc<dyn ChannelAdapter>],
            NotificationsConfig::default(),
        );
        let n = make_notification(
            fixture.user_id,
            vec![NotificationChannel::Realtime],
            NotificationStatus::Pending,
        );
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        let outcomes = fixture.dispatcher.dispatch(n.id).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].success);
        assert_eq!(adapter.send_count(), 1);

        let stored = fixture.get(n.id).await;
        assert_eq!(stored.status, NotificationStatus::Sent);
        assert!(stored.sent_at.is_some());
        assert_eq!(stored.retry_count, 1);
    }

    #[tokio::test]
    async fn test_dispatch_expired_transitions_and_fails() {
        let adapter = RecordingAdapter::succeeding(NotificationChannel::Realtime);
        let fixture = make_fixture(
            vec![adapter.clone() as Arc<dyn ChannelAdapter>],
            NotificationsConfig::default(),
        );
        let mut n = make_notification(
            fixture.user_id,
            vec![NotificationChannel::Realtime],
            NotificationStatus::Pending,
        );
        n.expires_at = Utc::now() - chrono::Duration::minutes(1);
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        let err = fixture.dispatcher.dispatch(n.id).await.unwrap_err();
        assert!(matches!(err, NotifyError::Expired(_)));
        assert_eq!(adapter.send_count(), 0);

        let stored = fixture.get(n.id).await;
        assert_eq!(stored.status, NotificationStatus::Expired);
    }

    #[tokio::test]
    async fn test_dispatch_missing_notification() {
        let fixture = make_fixture(vec![], NotificationsConfig::default());
        let err = fixture.dispatcher.dispatch(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, NotifyError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_one_channel_failure_does_not_block_others() {
        let email = RecordingAdapter::failing(NotificationChannel::Email, "smtp down");
        let realtime = RecordingAdapter::succeeding(NotificationChannel::Realtime);
        let fixture = make_fixture(
            vec![
                email.clone() as Arc<dyn ChannelAdapter>,
                realtime.clone() as Arc<dyn ChannelAdapter>,
            ],
            NotificationsConfig::default(),
        );
        let n = make_notification(
            fixture.user_id,
            vec![NotificationChannel::Email, NotificationChannel::Realtime],
            NotificationStatus::Pending,
        );
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        let outcomes = fixture.dispatcher.dispatch(n.id).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].channel, NotificationChannel::Email);
        assert!(!outcomes[0].success);
        assert_eq!(outcomes[1].channel, NotificationChannel::Realtime);
        assert!(outcomes[1].success);
        assert_eq!(email.send_count(), 1);
        assert_eq!(realtime.send_count(), 1);

        // Partial success still counts as sent, first failure is recorded.
        let stored = fixture.get(n.id).await;
        assert_eq!(stored.status, NotificationStatus::Sent);
        assert!(stored.last_error.as_deref().unwrap().contains("smtp down"));
    }

    #[tokio::test]
    async fn test_disabled_channel_records_failure_without_sending() {
        let email = RecordingAdapter::succeeding(NotificationChannel::Email);
        let config = NotificationsConfig {
            enable_email: false,
            ..NotificationsConfig::default()
        };
        let fixture = make_fixture(vec![email.clone() as Arc<dyn ChannelAdapter>], config);
        let n = make_notification(
            fixture.user_id,
            vec![NotificationChannel::Email],
            NotificationStatus::Pending,
        );
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        let outcomes = fixture.dispatcher.dispatch(n.id).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert_eq!(email.send_count(), 0);

        let stored = fixture.get(n.id).await;
        assert_eq!(stored.status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_dispatch_on_sent_row_is_a_noop() {
        let adapter = RecordingAdapter::succeeding(NotificationChannel::Realtime);
        let fixture = make_fixture(
            vec![adapter.clone() as Arc<dyn ChannelAdapter>],
            NotificationsConfig::default(),
        );
        let mut n = make_notification(
            fixture.user_id,
            vec![NotificationChannel::Realtime],
            NotificationStatus::Sent,
        );
        n.sent_at = Some(Utc::now());
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        let outcomes = fixture.dispatcher.dispatch(n.id).await.unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(adapter.send_count(), 0);
    }

    #[tokio::test]
    async fn test_quiet_hours_defer_delivery() {
        let adapter = RecordingAdapter::succeeding(NotificationChannel::Realtime);
        let fixture = make_fixture(
            vec![adapter.clone() as Arc<dyn ChannelAdapter>],
            NotificationsConfig::default(),
        );

        // Quiet window covering the whole day makes the check deterministic.
        fixture.store.add_preference(NotificationPreference {
            user_id: fixture.user_id,
            category: NotificationCategory::Activity,
            channels: vec![NotificationChannel::Realtime],
            enabled: true,
            quiet_hours_start: Some("00:00".to_string()),
            quiet_hours_end: Some("23:59".to_string()),
            timezone: None,
            updated_at: Utc::now(),
        });

        let n = make_notification(
            fixture.user_id,
            vec![NotificationChannel::Realtime],
            NotificationStatus::Pending,
        );
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        let outcomes = fixture.dispatcher.dispatch(n.id).await.unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(adapter.send_count(), 0);

        let stored = fixture.get(n.id).await;
        assert_eq!(stored.status, NotificationStatus::Scheduled);
        assert!(stored.scheduled_for.is_some());
        assert_eq!(stored.retry_count, 0);
    }

    #[tokio::test]
    async fn test_retry_backoff_doubles_then_fails_permanently() {
        let adapter = RecordingAdapter::failing(NotificationChannel::Realtime, "hub down");
        let config = NotificationsConfig {
            retry_delay_ms: 1000,
            ..NotificationsConfig::default()
        };
        let fixture = make_fixture(vec![adapter.clone() as Arc<dyn ChannelAdapter>], config);

        let mut n = make_notification(
            fixture.user_id,
            vec![NotificationChannel::Realtime],
            NotificationStatus::Scheduled,
        );
        n.scheduled_for = Some(Utc::now() - chrono::Duration::seconds(1));
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        // Attempt 1: rescheduled at roughly now + 2^1 * 1000ms.
        let before = Utc::now();
        let dispatched = fixture.dispatcher.process_scheduled().await.unwrap();
        assert_eq!(dispatched, 0);

        let stored = fixture.get(n.id).await;
        assert_eq!(stored.status, NotificationStatus::Scheduled);
        assert_eq!(stored.retry_count, 1);
        let delay = stored.scheduled_for.unwrap() - before;
        assert!(delay >= chrono::Duration::milliseconds(1900));
        assert!(delay <= chrono::Duration::milliseconds(2500));

        // Attempt 2: roughly now + 2^2 * 1000ms.
        let mut stored = stored;
        stored.scheduled_for = Some(Utc::now() - chrono::Duration::seconds(1));
        fixture.put(&stored).await;

        let before = Utc::now();
        fixture.dispatcher.process_scheduled().await.unwrap();
        let stored = fixture.get(n.id).await;
        assert_eq!(stored.retry_count, 2);
        assert_eq!(stored.status, NotificationStatus::Scheduled);
        let delay = stored.scheduled_for.unwrap() - before;
        assert!(delay >= chrono::Duration::milliseconds(3900));
        assert!(delay <= chrono::Duration::milliseconds(4500));

        // Attempt 3 exhausts max_retries: permanently failed.
        let mut stored = stored;
        stored.scheduled_for = Some(Utc::now() - chrono::Duration::seconds(1));
        fixture.put(&stored).await;

        fixture.dispatcher.process_scheduled().await.unwrap();
        let stored = fixture.get(n.id).await;
        assert_eq!(stored.retry_count, 3);
        assert_eq!(stored.status, NotificationStatus::Failed);

        // Failed rows are never rescanned.
        let dispatched = fixture.dispatcher.process_scheduled().await.unwrap();
        assert_eq!(dispatched, 0);
        let stored = fixture.get(n.id).await;
        assert_eq!(stored.retry_count, 3);
        assert_eq!(stored.status, NotificationStatus::Failed);
        assert_eq!(adapter.send_count(), 3);
    }

    #[tokio::test]
    async fn test_scan_counts_only_successful_dispatches() {
        let adapter = RecordingAdapter::succeeding(NotificationChannel::Realtime);
        let fixture = make_fixture(
            vec![adapter.clone() as Arc<dyn ChannelAdapter>],
            NotificationsConfig::default(),
        );

        for _ in 0..3 {
            let mut n = make_notification(
                fixture.user_id,
                vec![NotificationChannel::Realtime],
                NotificationStatus::Scheduled,
            );
            n.scheduled_for = Some(Utc::now() - chrono::Duration::seconds(1));
            NotificationStore::insert(&*fixture.store, &n).await.unwrap();
        }

        let dispatched = fixture.dispatcher.process_scheduled().await.unwrap();
        assert_eq!(dispatched, 3);
        assert_eq!(adapter.send_count(), 3);

        // Second pass is a no-op: nothing is scheduled any more.
        let dispatched = fixture.dispatcher.process_scheduled().await.unwrap();
        assert_eq!(dispatched, 0);
        assert_eq!(adapter.send_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_channel_set_fails_permanently() {
        let fixture = make_fixture(vec![], NotificationsConfig::default());
        let n = make_notification(fixture.user_id, vec![], NotificationStatus::Pending);
        NotificationStore::insert(&*fixture.store, &n).await.unwrap();

        let outcomes = fixture.dispatcher.dispatch(n.id).await.unwrap();
        assert!(outcomes.is_empty());

        let stored = fixture.get(n.id).await;
        assert_eq!(stored.status, NotificationStatus::Failed);
        assert!(stored.retries_exhausted());
    }
}
