//! Cron scheduler for periodic notification engine tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use pulsehub_core::error::AppError;
use pulsehub_notify::dispatch::Dispatcher;
use pulsehub_notify::service::NotificationService;

/// Cron-based scheduler for periodic background tasks.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Dispatcher for the due-notification scan.
    dispatcher: Arc<Dispatcher>,
    /// Lifecycle service for the cleanup sweep.
    service: Arc<NotificationService>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(
        dispatcher: Arc<Dispatcher>,
        service: Arc<NotificationService>,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            dispatcher,
            service,
        })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        self.register_notification_dispatch().await?;
        self.register_notification_cleanup().await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Due-notification dispatch scan — every minute.
    async fn register_notification_dispatch(&self) -> Result<(), AppError> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let job = CronJob::new_async("0 * * * * *", move |_uuid, _lock| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                match dispatcher.process_scheduled().await {
                    Ok(0) => {}
                    Ok(count) => {
                        tracing::info!(count, "Dispatched scheduled notifications");
                    }
                    Err(e) => {
                        tracing::error!("Scheduled notification scan failed: {}", e);
                    }
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create notification_dispatch schedule: {}",
                e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add notification_dispatch schedule: {}", e))
        })?;

        tracing::info!("Registered: notification_dispatch (every 1min)");
        Ok(())
    }

    /// Expired-notification cleanup — daily at 2 AM.
    async fn register_notification_cleanup(&self) -> Result<(), AppError> {
        let service = Arc::clone(&self.service);
        let job = CronJob::new_async("0 0 2 * * *", move |_uuid, _lock| {
            let service = Arc::clone(&service);
            Box::pin(async move {
                match service.cleanup_expired().await {
                    Ok(count) => {
                        tracing::info!(count, "Notification cleanup finished");
                    }
                    Err(e) => {
                        tracing::error!("Notification cleanup failed: {}", e);
                    }
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create notification_cleanup schedule: {}",
                e
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add notification_cleanup schedule: {}", e))
        })?;

        tracing::info!("Registered: notification_cleanup (daily at 2AM)");
        Ok(())
    }
}
