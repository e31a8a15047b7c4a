//! Per-user pub/sub hub.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use pulsehub_core::config::realtime::RealtimeConfig;
use pulsehub_core::result::AppResult;
use pulsehub_notify::channel::Broadcaster;

/// In-process hub fanning payloads out to a user's live subscribers.
///
/// Closed subscribers are pruned on publish; publishing to a user with no
/// subscribers is a silent no-op (the notification row itself is the
/// durable record).
#[derive(Debug)]
pub struct NotificationHub {
    /// User ID → that user's subscriber senders.
    subscribers: DashMap<Uuid, Vec<mpsc::Sender<serde_json::Value>>>,
    /// Hub configuration.
    config: RealtimeConfig,
}

impl NotificationHub {
    /// Create a new hub.
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            subscribers: DashMap::new(),
            config,
        }
    }

    /// Subscribe to a user's channel.
    ///
    /// Returns the receiving end of a bounded channel. When the user is at
    /// the subscription cap, the oldest subscriber is dropped.
    pub fn subscribe(&self, user_id: Uuid) -> mpsc::Receiver<serde_json::Value> {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);

        let mut entry = self.subscribers.entry(user_id).or_default();
        if entry.len() >= self.config.max_subscriptions_per_user {
            tracing::warn!(
                %user_id,
                max = self.config.max_subscriptions_per_user,
                "User at subscription cap, dropping oldest subscriber"
            );
            entry.remove(0);
        }
        entry.push(tx);

        tracing::debug!(%user_id, subscribers = entry.len(), "Subscriber added");
        rx
    }

    /// Whether the user currently has live subscribers.
    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.subscribers
            .get(&user_id)
            .is_some_and(|entry| entry.iter().any(|tx| !tx.is_closed()))
    }

    /// Number of live subscribers across all users.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .iter()
            .map(|entry| entry.iter().filter(|tx| !tx.is_closed()).count())
            .sum()
    }
}

#[async_trait]
impl Broadcaster for NotificationHub {
    async fn publish(&self, user_id: Uuid, payload: serde_json::Value) -> AppResult<()> {
        let senders: Vec<mpsc::Sender<serde_json::Value>> = match self.subscribers.get(&user_id) {
            Some(entry) => entry.clone(),
            None => return Ok(()),
        };

        let mut delivered = 0usize;
        for tx in &senders {
            // A full buffer drops the payload for that subscriber; the
            // notification row remains the durable record.
            if tx.try_send(payload.clone()).is_ok() {
                delivered += 1;
            }
        }

        // Prune subscribers that went away.
        if let Some(mut entry) = self.subscribers.get_mut(&user_id) {
            entry.retain(|tx| !tx.is_closed());
            if entry.is_empty() {
                drop(entry);
                self.subscribers.remove(&user_id);
            }
        }

        tracing::trace!(%user_id, delivered, "Published to user channel");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_hub() -> NotificationHub {
        NotificationHub::new(RealtimeConfig::default())
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_payload() {
        let hub = make_hub();
        let user = Uuid::new_v4();
        let mut rx = hub.subscribe(user);

        hub.publish(user, serde_json::json!({"title": "Run logged"}))
            .await
            .unwrap();

        let payload = rx.recv().await.unwrap();
        assert_eq!(payload["title"], "Run logged");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = make_hub();
        hub.publish(Uuid::new_v4(), serde_json::json!({}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_publish_targets_only_that_user() {
        let hub = make_hub();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let mut rx_a = hub.subscribe(user_a);
        let mut rx_b = hub.subscribe(user_b);

        hub.publish(user_a, serde_json::json!({"n": 1})).await.unwrap();

        assert_eq!(rx_a.recv().await.unwrap()["n"], 1);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_pruned() {
        let hub = make_hub();
        let user = Uuid::new_v4();
        let rx = hub.subscribe(user);
        assert!(hub.is_online(user));

        drop(rx);
        hub.publish(user, serde_json::json!({})).await.unwrap();

        assert!(!hub.is_online(user));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_cap_drops_oldest() {
        let config = RealtimeConfig {
            channel_buffer_size: 4,
            max_subscriptions_per_user: 2,
        };
        let hub = NotificationHub::new(config);
        let user = Uuid::new_v4();

        let mut first = hub.subscribe(user);
        let mut second = hub.subscribe(user);
        let mut third = hub.subscribe(user);

        hub.publish(user, serde_json::json!({"n": 1})).await.unwrap();

        assert!(first.try_recv().is_err());
        assert_eq!(second.try_recv().unwrap()["n"], 1);
        assert_eq!(third.try_recv().unwrap()["n"], 1);
    }
}
