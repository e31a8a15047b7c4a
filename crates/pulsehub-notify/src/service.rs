//! Notification lifecycle management: creation, read tracking, scheduling,
//! and the expiry sweep.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use pulsehub_cache::CacheManager;
use pulsehub_core::config::notifications::NotificationsConfig;
use pulsehub_entity::notification::{
    Notification, NotificationCategory, NotificationChannel, NotificationPriority,
    NotificationStatus,
};

use crate::error::{NotifyError, NotifyResult};
use crate::preference::PreferenceResolver;
use crate::query;
use crate::rate_limit::RateLimiter;
use crate::store::{NotificationStore, UserStore};
use crate::template::TemplateRenderer;

/// Input for creating one notification.
#[derive(Debug, Clone)]
pub struct CreateNotificationInput {
    /// The recipient user.
    pub user_id: Uuid,
    /// Free-form event tag (e.g. `"activity.logged"`).
    pub event_type: String,
    /// Notification category.
    pub category: NotificationCategory,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Title; overridden by the template when `template_id` is set.
    pub title: String,
    /// Body text; overridden by the template when `template_id` is set.
    pub message: String,
    /// Email body; overridden by the template when `template_id` is set.
    pub email_body: Option<String>,
    /// Template to render content from.
    pub template_id: Option<Uuid>,
    /// Variables for template rendering.
    pub variables: serde_json::Map<String, serde_json::Value>,
    /// Additional structured data carried on the notification.
    pub payload: Option<serde_json::Value>,
    /// Requested delivery channels; intersected with the user's
    /// preferences. `None` requests the full preferred set.
    pub channels: Option<Vec<NotificationChannel>>,
    /// Deliver at this time instead of immediately.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Expiry deadline; defaults from configuration when unset.
    pub expires_at: Option<DateTime<Utc>>,
    /// Maximum delivery attempts; defaults from configuration when unset.
    pub max_retries: Option<u32>,
}

impl CreateNotificationInput {
    /// Create an input with the required fields; the rest default off.
    pub fn new(
        user_id: Uuid,
        event_type: impl Into<String>,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            event_type: event_type.into(),
            category,
            priority: NotificationPriority::default(),
            title: title.into(),
            message: message.into(),
            email_body: None,
            template_id: None,
            variables: serde_json::Map::new(),
            payload: None,
            channels: None,
            scheduled_for: None,
            expires_at: None,
            max_retries: None,
        }
    }

    /// Request a channel subset.
    pub fn with_channels(mut self, channels: Vec<NotificationChannel>) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Render content from a template.
    pub fn with_template(
        mut self,
        template_id: Uuid,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.template_id = Some(template_id);
        self.variables = variables;
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Defer delivery to a future time.
    pub fn with_schedule(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_for = Some(at);
        self
    }

    /// Set an explicit expiry deadline.
    pub fn with_expiry(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Attach a structured payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Owns the notification entity's lifecycle: creation with policy checks,
/// read tracking, explicit scheduling, and the expiry sweep.
#[derive(Debug)]
pub struct NotificationService {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
    /// User account lookups for validation.
    users: Arc<dyn UserStore>,
    /// Template renderer.
    renderer: TemplateRenderer,
    /// Preference resolver.
    prefs: Arc<PreferenceResolver>,
    /// Creation rate limiter.
    rate_limiter: Arc<RateLimiter>,
    /// Cache for aggregate invalidation.
    cache: CacheManager,
    /// Engine configuration.
    config: NotificationsConfig,
    /// Immediate-dispatch queue; submissions never block or fail creation.
    dispatch_tx: mpsc::Sender<Uuid>,
}

impl NotificationService {
    /// Create a new lifecycle service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn NotificationStore>,
        users: Arc<dyn UserStore>,
        renderer: TemplateRenderer,
        prefs: Arc<PreferenceResolver>,
        rate_limiter: Arc<RateLimiter>,
        cache: CacheManager,
        config: NotificationsConfig,
        dispatch_tx: mpsc::Sender<Uuid>,
    ) -> Self {
        Self {
            store,
            users,
            renderer,
            prefs,
            rate_limiter,
            cache,
            config,
            dispatch_tx,
        }
    }

    /// Create a notification.
    ///
    /// Validation failures (unknown user, missing template, rate limit)
    /// surface to the caller and nothing is persisted. Resolving to an
    /// empty channel set is not an error: the notification is stored but
    /// delivers nowhere. Immediate delivery is handed to the dispatch
    /// queue; delivery failures never reach the creating caller.
    pub async fn create(&self, input: CreateNotificationInput) -> NotifyResult<Notification> {
        let now = Utc::now();

        self.users
            .find_by_id(input.user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(NotifyError::InvalidUser(input.user_id))?;

        let (title, message, email_body) = match input.template_id {
            Some(template_id) => {
                let rendered = self.renderer.render(template_id, &input.variables).await?;
                (rendered.title, rendered.message, rendered.email_body)
            }
            None => (input.title, input.message, input.email_body),
        };

        if self.config.rate_limit_enabled {
            self.rate_limiter.check_and_consume(input.user_id, now)?;
        }

        let channels = self
            .prefs
            .resolve_channels(input.user_id, input.category, input.channels.as_deref())
            .await?;

        let expires_at = input
            .expires_at
            .unwrap_or(now + Duration::hours(self.config.default_expiration_hours));

        let future_scheduled = self.config.enable_scheduling
            && input.scheduled_for.is_some_and(|at| at > now);

        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            template_id: input.template_id,
            event_type: input.event_type,
            category: input.category,
            priority: input.priority,
            title,
            message,
            email_body,
            payload: input.payload,
            channels,
            status: if future_scheduled {
                NotificationStatus::Scheduled
            } else {
                NotificationStatus::Pending
            },
            scheduled_for: if future_scheduled {
                input.scheduled_for
            } else {
                None
            },
            sent_at: None,
            read_at: None,
            clicked_at: None,
            expires_at,
            retry_count: 0,
            max_retries: input
                .max_retries
                .unwrap_or(self.config.default_retry_count),
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&notification).await?;
        query::invalidate_user_caches(&self.cache, notification.user_id).await;

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            category = %notification.category,
            status = %notification.status,
            channels = notification.channels.len(),
            "Notification created"
        );

        if !future_scheduled && !notification.channels.is_empty() {
            if let Err(err) = self.dispatch_tx.try_send(notification.id) {
                tracing::warn!(
                    notification_id = %notification.id,
                    error = %err,
                    "Dispatch queue unavailable, delivery deferred to the scan"
                );
            }
        }

        Ok(notification)
    }

    /// Mark notifications read, scoped to delivered rows owned by `user_id`.
    ///
    /// The ownership scope is a security invariant and is enforced in the
    /// store query itself. Returns the number of rows updated.
    pub async fn mark_read(&self, ids: &[Uuid], user_id: Uuid) -> NotifyResult<u64> {
        let updated = self.store.mark_read(ids, user_id, Utc::now()).await?;
        if updated > 0 {
            query::invalidate_user_caches(&self.cache, user_id).await;
        }
        Ok(updated)
    }

    /// Mark all of a user's delivered notifications read, optionally
    /// limited to one category.
    pub async fn mark_all_read(
        &self,
        user_id: Uuid,
        category: Option<NotificationCategory>,
    ) -> NotifyResult<u64> {
        let updated = self
            .store
            .mark_all_read(user_id, category, Utc::now())
            .await?;
        if updated > 0 {
            query::invalidate_user_caches(&self.cache, user_id).await;
        }
        Ok(updated)
    }

    /// Record a click-through on a notification owned by `user_id`.
    pub async fn mark_clicked(&self, id: Uuid, user_id: Uuid) -> NotifyResult<bool> {
        Ok(self.store.mark_clicked(id, user_id, Utc::now()).await?)
    }

    /// Defer a notification to a delivery time.
    pub async fn schedule(&self, id: Uuid, at: DateTime<Utc>) -> NotifyResult<Notification> {
        let mut notification = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(NotifyError::NotFound(id))?;

        if notification.is_terminal() || notification.status == NotificationStatus::Sent {
            return Err(NotifyError::from(pulsehub_core::error::AppError::conflict(
                format!("Notification {id} is {} and cannot be scheduled", notification.status),
            )));
        }

        notification.status = NotificationStatus::Scheduled;
        notification.scheduled_for = Some(at);
        notification.updated_at = Utc::now();
        self.store.update(&notification).await?;

        tracing::debug!(notification_id = %id, at = %at, "Notification scheduled");
        Ok(notification)
    }

    /// Delete undelivered notifications past their expiry.
    ///
    /// Targets only rows that will never be delivered (Pending, Scheduled,
    /// Failed); delivered and read rows are retained. Returns the count
    /// removed.
    pub async fn cleanup_expired(&self) -> NotifyResult<u64> {
        let removed = self.store.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Expired notifications cleaned up");
        }
        Ok(removed)
    }
}
