//! Event publishing with lazy, idempotent topic provisioning.
//!
//! Every lifecycle event is sent to a topic named after its kind. Before the first
//! send to a topic, its delivery topology has to exist on the broker. Declaring it
//! on every publish would be wasteful (and externally visible), so the publisher
//! remembers which topics it has already provisioned.
//!
//! ## Provisioning Protocol
//!
//! ```text
//! publish(event) ─→ topic known? ──yes──────────────────────────────→ send
//!                        │ no
//!                        ↓
//!                 lock provisioning (one holder, any topic)
//!                        ↓
//!                 topic known now? ──yes──→ unlock ─────────────────→ send
//!                        │ no
//!                        ↓
//!                 declare topic → record topic → unlock ────────────→ send
//! ```
//!
//! - Publishes to known topics never touch the provisioning lock.
//! - Concurrent first publishes to the same new topic declare it exactly once: the
//!   losers of the race find the topic recorded when they re-check under the lock.
//! - The lock is released before sending.
//! - A failed declare is not recorded; the next publish to that topic tries again.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::bus::{BrokerError, MessageBroker};
use crate::event::Event;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize event: {0}")]
    Serialize(String),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Fire-and-forget publication of lifecycle events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish<E>(&self, event: &E) -> Result<(), PublishError>
    where
        E: Event;
}

#[async_trait]
impl<P> EventPublisher for Arc<P>
where
    P: EventPublisher,
{
    async fn publish<E>(&self, event: &E) -> Result<(), PublishError>
    where
        E: Event,
    {
        (**self).publish(event).await
    }
}

/// Set of topics whose topology is known to exist, plus the lock that serializes
/// provisioning decisions.
///
/// Owned by a publisher instance (or shared between several via `Arc`); never
/// process-global.
#[derive(Debug, Default)]
pub struct KnownTopics {
    provisioned: RwLock<HashSet<String>>,
    provisioning: Mutex<()>,
}

impl KnownTopics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, topic: &str) -> bool {
        // The set only ever grows, so a poisoned guard still holds a valid set.
        self.provisioned
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(topic)
    }

    pub fn len(&self) -> usize {
        self.provisioned
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, topic: &str) {
        self.provisioned
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(topic.to_string());
    }

    /// Run `declare` for `topic` unless it is already known.
    ///
    /// Returns `Ok(true)` when this call performed the declaration, `Ok(false)`
    /// when the topic was already provisioned (before or while waiting for the lock).
    pub async fn ensure<F, Fut, E>(&self, topic: &str, declare: F) -> Result<bool, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        if self.contains(topic) {
            return Ok(false);
        }

        let _guard = self.provisioning.lock().await;

        // Another task may have finished provisioning while we waited.
        if self.contains(topic) {
            return Ok(false);
        }

        declare().await?;
        self.record(topic);
        Ok(true)
    }
}

/// [`EventPublisher`] over a [`MessageBroker`], provisioning each topic on first use.
///
/// Payloads are the JSON serialization of the event.
#[derive(Debug)]
pub struct ProvisioningPublisher<B> {
    broker: B,
    topics: Arc<KnownTopics>,
}

impl<B> ProvisioningPublisher<B> {
    pub fn new(broker: B) -> Self {
        Self::with_known_topics(broker, Arc::new(KnownTopics::new()))
    }

    /// Build a publisher that shares its provisioning state with others.
    pub fn with_known_topics(broker: B, topics: Arc<KnownTopics>) -> Self {
        Self { broker, topics }
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn known_topics(&self) -> &Arc<KnownTopics> {
        &self.topics
    }
}

#[async_trait]
impl<B> EventPublisher for ProvisioningPublisher<B>
where
    B: MessageBroker,
{
    #[instrument(skip_all, fields(topic = event.event_type()))]
    async fn publish<E>(&self, event: &E) -> Result<(), PublishError>
    where
        E: Event,
    {
        let topic = event.event_type();
        let payload =
            serde_json::to_vec(event).map_err(|e| PublishError::Serialize(e.to_string()))?;

        let broker = &self.broker;
        if self
            .topics
            .ensure(topic, || broker.declare_topic(topic))
            .await?
        {
            debug!(topic, "provisioned topic topology");
        }

        self.broker.send(topic, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use serde::Serialize;

    use super::*;
    use crate::in_memory_bus::InMemoryBroker;

    #[derive(Debug, Clone, Serialize)]
    struct Pinged {
        id: i64,
        occurred_at: DateTime<Utc>,
    }

    impl Event for Pinged {
        fn event_type(&self) -> &'static str {
            "Pinged"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.occurred_at
        }
    }

    #[derive(Debug, Clone, Serialize)]
    struct Ponged {
        occurred_at: DateTime<Utc>,
    }

    impl Event for Ponged {
        fn event_type(&self) -> &'static str {
            "Ponged"
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.occurred_at
        }
    }

    fn pinged(id: i64) -> Pinged {
        Pinged {
            id,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_publishes_declare_once() {
        let broker = Arc::new(InMemoryBroker::new().with_declare_delay(Duration::from_millis(50)));
        let sub = broker.subscribe("Pinged");
        let publisher = ProvisioningPublisher::new(broker.clone());

        let (first, second) = (pinged(1), pinged(2));
        let (a, b) = tokio::join!(publisher.publish(&first), publisher.publish(&second));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(broker.declarations("Pinged"), 1);
        assert!(sub.recv_timeout(Duration::from_secs(1)).is_ok());
        assert!(sub.recv_timeout(Duration::from_secs(1)).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_spawned_first_publishes_declare_once() {
        let broker = Arc::new(InMemoryBroker::new().with_declare_delay(Duration::from_millis(20)));
        let publisher = Arc::new(ProvisioningPublisher::new(broker.clone()));

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let publisher = publisher.clone();
                tokio::spawn(async move { publisher.publish(&pinged(i)).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(broker.declarations("Pinged"), 1);
        assert_eq!(publisher.known_topics().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn known_topic_does_not_wait_for_provisioning_of_another() {
        let broker = Arc::new(InMemoryBroker::new());
        let publisher = Arc::new(ProvisioningPublisher::new(broker.clone()));
        publisher.publish(&pinged(1)).await.unwrap();

        // Declares from here on are slow; "Ponged" is new and will hold the lock.
        broker.set_declare_delay(Some(Duration::from_millis(500)));
        let slow = {
            let publisher = publisher.clone();
            tokio::spawn(async move {
                publisher
                    .publish(&Ponged {
                        occurred_at: Utc::now(),
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let fast = tokio::time::timeout(Duration::from_millis(200), publisher.publish(&pinged(2))).await;
        assert!(matches!(fast, Ok(Ok(()))));

        slow.await.unwrap().unwrap();
        assert_eq!(broker.declarations("Pinged"), 1);
        assert_eq!(broker.declarations("Ponged"), 1);
    }

    #[tokio::test]
    async fn send_to_undeclared_topic_fails_without_publisher() {
        let broker = InMemoryBroker::new();
        let err = broker.send("Pinged", b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, BrokerError::TopicMissing(t) if t == "Pinged"));
    }

    /// Broker whose first declare fails.
    #[derive(Debug, Default)]
    struct FlakyBroker {
        declares: AtomicUsize,
        sends: AtomicUsize,
    }

    #[async_trait]
    impl MessageBroker for FlakyBroker {
        async fn declare_topic(&self, _topic: &str) -> Result<(), BrokerError> {
            if self.declares.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(BrokerError::Transport("exchange unavailable".to_string()));
            }
            Ok(())
        }

        async fn send(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), BrokerError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_declare_is_retried_on_next_publish() {
        let publisher = ProvisioningPublisher::new(FlakyBroker::default());

        let err = publisher.publish(&pinged(1)).await.unwrap_err();
        assert!(matches!(err, PublishError::Broker(BrokerError::Transport(_))));
        assert!(!publisher.known_topics().contains("Pinged"));
        assert_eq!(publisher.broker().sends.load(Ordering::SeqCst), 0);

        publisher.publish(&pinged(2)).await.unwrap();
        assert!(publisher.known_topics().contains("Pinged"));
        assert_eq!(publisher.broker().declares.load(Ordering::SeqCst), 2);
        assert_eq!(publisher.broker().sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shared_known_topics_skip_redeclare() {
        let broker = Arc::new(InMemoryBroker::new());
        let topics = Arc::new(KnownTopics::new());
        let first = ProvisioningPublisher::with_known_topics(broker.clone(), topics.clone());
        let second = ProvisioningPublisher::with_known_topics(broker.clone(), topics);

        first.publish(&pinged(1)).await.unwrap();
        second.publish(&pinged(2)).await.unwrap();

        assert_eq!(broker.declarations("Pinged"), 1);
    }

    #[tokio::test]
    async fn payload_is_the_json_event() {
        let broker = Arc::new(InMemoryBroker::new());
        let sub = broker.subscribe("Pinged");
        let publisher = ProvisioningPublisher::new(broker);

        publisher.publish(&pinged(7)).await.unwrap();

        let payload = sub.try_recv().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(json["id"], 7);
    }
}
