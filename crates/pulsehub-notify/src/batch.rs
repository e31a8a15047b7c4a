//! Batch coordination — fans one logical notification out to many users.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use uuid::Uuid;

use pulsehub_core::config::notifications::NotificationsConfig;
use pulsehub_entity::batch::{BatchStatus, NotificationBatch};
use pulsehub_entity::notification::{
    NotificationCategory, NotificationChannel, NotificationPriority,
};

use crate::dispatch::Dispatcher;
use crate::error::{NotifyError, NotifyResult};
use crate::service::{CreateNotificationInput, NotificationService};
use crate::store::{BatchStore, NotificationStore};

/// Clock-skew allowance when re-locating a batch's member notifications.
const MEMBER_WINDOW_SKEW_SECONDS: i64 = 5;

/// The payload fanned out to every recipient of a batch.
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// Free-form event tag.
    pub event_type: String,
    /// Notification category.
    pub category: NotificationCategory,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Title; overridden by the template when `template_id` is set.
    pub title: String,
    /// Body text; overridden by the template when `template_id` is set.
    pub message: String,
    /// Email body.
    pub email_body: Option<String>,
    /// Template to render content from.
    pub template_id: Option<Uuid>,
    /// Variables for template rendering.
    pub variables: serde_json::Map<String, serde_json::Value>,
    /// Structured payload carried on every member notification.
    pub payload: Option<serde_json::Value>,
    /// Requested delivery channels.
    pub channels: Option<Vec<NotificationChannel>>,
}

impl BatchInput {
    /// Create a batch payload with the required fields.
    pub fn new(
        event_type: impl Into<String>,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
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
        }
    }

    /// Build the per-user creation input.
    fn for_user(&self, user_id: Uuid) -> CreateNotificationInput {
        CreateNotificationInput {
            user_id,
            event_type: self.event_type.clone(),
            category: self.category,
            priority: self.priority,
            title: self.title.clone(),
            message: self.message.clone(),
            email_body: self.email_body.clone(),
            template_id: self.template_id,
            variables: self.variables.clone(),
            payload: self.payload.clone(),
            channels: self.channels.clone(),
            scheduled_for: None,
            expires_at: None,
            max_retries: None,
        }
    }
}

/// Aggregate result of dispatching a batch.
#[derive(Debug, Clone)]
pub struct BatchDeliveryResult {
    /// The batch that was dispatched.
    pub batch_id: Uuid,
    /// Member notifications considered.
    pub total: u32,
    /// Members that delivered on at least one channel.
    pub sent: u32,
    /// Members that failed or deferred.
    pub failed: u32,
}

/// Fans a single logical notification out to many users, aggregating
/// partial success and failure into a batch record.
///
/// The batch is a reporting record: member notifications are created and
/// dispatched with all-settled semantics, individual failures are captured
/// and never propagate.
#[derive(Debug)]
pub struct BatchCoordinator {
    /// Batch record store.
    batches: Arc<dyn BatchStore>,
    /// Notification store for member lookups.
    store: Arc<dyn NotificationStore>,
    /// Lifecycle service for member creation.
    service: Arc<NotificationService>,
    /// Dispatcher for member delivery.
    dispatcher: Arc<Dispatcher>,
    /// Engine configuration.
    config: NotificationsConfig,
}

impl BatchCoordinator {
    /// Create a new batch coordinator.
    pub fn new(
        batches: Arc<dyn BatchStore>,
        store: Arc<dyn NotificationStore>,
        service: Arc<NotificationService>,
        dispatcher: Arc<Dispatcher>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            batches,
            store,
            service,
            dispatcher,
            config,
        }
    }

    /// Fan the payload out to every user, one notification each.
    ///
    /// Individual creation failures are captured into the batch counters;
    /// the batch ends `Failed` when any member failed, else `Completed`.
    pub async fn create_batch(
        &self,
        user_ids: &[Uuid],
        input: BatchInput,
    ) -> NotifyResult<NotificationBatch> {
        if user_ids.len() > self.config.max_batch_size {
            return Err(NotifyError::BatchTooLarge {
                requested: user_ids.len(),
                max: self.config.max_batch_size,
            });
        }

        let now = Utc::now();
        let mut batch = NotificationBatch {
            id: Uuid::new_v4(),
            event_type: input.event_type.clone(),
            category: input.category,
            total_count: user_ids.len() as u32,
            sent_count: 0,
            failed_count: 0,
            status: BatchStatus::Processing,
            started_at: now,
            completed_at: None,
        };
        self.batches.insert(&batch).await?;

        let results = join_all(
            user_ids
                .iter()
                .map(|&user_id| self.service.create(input.for_user(user_id))),
        )
        .await;

        for (user_id, result) in user_ids.iter().zip(&results) {
            match result {
                Ok(_) => batch.sent_count += 1,
                Err(err) => {
                    batch.failed_count += 1;
                    tracing::warn!(
                        batch_id = %batch.id,
                        %user_id,
                        code = %err.code(),
                        error = %err,
                        "Batch member creation failed"
                    );
                }
            }
        }

        batch.status = if batch.failed_count > 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::Completed
        };
        batch.completed_at = Some(Utc::now());
        self.batches.update(&batch).await?;

        tracing::info!(
            batch_id = %batch.id,
            total = batch.total_count,
            sent = batch.sent_count,
            failed = batch.failed_count,
            status = %batch.status,
            "Batch fan-out finished"
        );

        Ok(batch)
    }

    /// Dispatch the batch's pending member notifications.
    ///
    /// Members are re-located by the batch's event type, category, and
    /// creation window. A cancelled batch refuses dispatch. Failures are
    /// tolerated per member and aggregated into the batch record.
    pub async fn send_batch(&self, batch_id: Uuid) -> NotifyResult<BatchDeliveryResult> {
        let mut batch = self
            .batches
            .find_by_id(batch_id)
            .await?
            .ok_or(NotifyError::BatchNotFound(batch_id))?;

        if batch.status == BatchStatus::Cancelled {
            tracing::info!(batch_id = %batch_id, "Batch is cancelled, refusing dispatch");
            return Ok(BatchDeliveryResult {
                batch_id,
                total: 0,
                sent: 0,
                failed: 0,
            });
        }

        let created_after = batch.started_at - Duration::seconds(MEMBER_WINDOW_SKEW_SECONDS);
        let members = self
            .store
            .find_batch_members(&batch.event_type, batch.category, created_after)
            .await?;

        let outcomes = join_all(
            members
                .iter()
                .map(|member| self.dispatcher.dispatch(member.id)),
        )
        .await;

        let mut result = BatchDeliveryResult {
            batch_id,
            total: members.len() as u32,
            sent: 0,
            failed: 0,
        };
        for (member, outcome) in members.iter().zip(&outcomes) {
            match outcome {
                Ok(channel_outcomes) if channel_outcomes.iter().any(|o| o.success) => {
                    result.sent += 1;
                }
                Ok(_) => result.failed += 1,
                Err(err) => {
                    result.failed += 1;
                    tracing::warn!(
                        batch_id = %batch_id,
                        notification_id = %member.id,
                        code = %err.code(),
                        error = %err,
                        "Batch member dispatch failed"
                    );
                }
            }
        }

        batch.sent_count = result.sent;
        batch.failed_count = result.failed;
        batch.status = if result.failed > 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::Completed
        };
        batch.completed_at = Some(Utc::now());
        self.batches.update(&batch).await?;

        tracing::info!(
            batch_id = %batch_id,
            total = result.total,
            sent = result.sent,
            failed = result.failed,
            "Batch dispatch finished"
        );

        Ok(result)
    }

    /// Administratively cancel a batch, preventing future dispatch.
    ///
    /// Does not interrupt member sends already in flight.
    pub async fn cancel_batch(&self, batch_id: Uuid) -> NotifyResult<NotificationBatch> {
        let mut batch = self
            .batches
            .find_by_id(batch_id)
            .await?
            .ok_or(NotifyError::BatchNotFound(batch_id))?;

        batch.status = BatchStatus::Cancelled;
        batch.completed_at = Some(Utc::now());
        self.batches.update(&batch).await?;

        tracing::info!(batch_id = %batch_id, "Batch cancelled");
        Ok(batch)
    }
}
