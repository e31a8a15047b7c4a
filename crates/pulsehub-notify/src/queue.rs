//! In-process dispatch queue for fire-and-forget immediate delivery.
//!
//! `create` submits a notification id and returns immediately; the
//! consumer task drains the queue and reports outcomes only through logs.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::dispatch::Dispatcher;

/// Build the dispatch queue channel with the configured capacity.
pub fn channel(capacity: usize) -> (mpsc::Sender<Uuid>, mpsc::Receiver<Uuid>) {
    mpsc::channel(capacity)
}

/// Spawn the queue consumer task.
///
/// The task runs until every sender is dropped. Dispatch failures are
/// swallowed into logs; a bad notification never stops the consumer.
pub fn spawn_consumer(dispatcher: Arc<Dispatcher>, mut rx: mpsc::Receiver<Uuid>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Dispatch queue consumer started");

        while let Some(id) = rx.recv().await {
            match dispatcher.dispatch(id).await {
                Ok(outcomes) => {
                    tracing::trace!(
                        notification_id = %id,
                        attempted = outcomes.len(),
                        delivered = outcomes.iter().filter(|o| o.success).count(),
                        "Queued dispatch finished"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        notification_id = %id,
                        code = %err.code(),
                        error = %err,
                        "Queued dispatch failed"
                    );
                }
            }
        }

        tracing::debug!("Dispatch queue consumer stopped");
    })
}
