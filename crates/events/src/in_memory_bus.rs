//! In-memory message broker for tests/dev.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, mpsc};
use std::time::Duration;

use async_trait::async_trait;

use crate::bus::{BrokerError, MessageBroker, Subscription};

#[derive(Debug, Default)]
struct TopicState {
    declared: bool,
    declarations: usize,
    subscribers: Vec<mpsc::Sender<Vec<u8>>>,
}

/// In-memory topic broker.
///
/// - Topics must be declared before anything can be sent to them
/// - Best-effort fan-out to the subscribers of a topic
/// - Counts declarations per topic so callers can observe provisioning
/// - Optional declare latency and send failure injection
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    topics: Mutex<HashMap<String, TopicState>>,
    declare_delay: Mutex<Option<Duration>>,
    fail_sends: AtomicBool,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every declaration take at least `delay`.
    pub fn with_declare_delay(self, delay: Duration) -> Self {
        self.set_declare_delay(Some(delay));
        self
    }

    pub fn set_declare_delay(&self, delay: Option<Duration>) {
        if let Ok(mut current) = self.declare_delay.lock() {
            *current = delay;
        }
    }

    /// When set, every send fails with [`BrokerError::Transport`].
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Subscribe to payloads sent to `topic` from now on.
    ///
    /// Subscribing does not declare the topic.
    pub fn subscribe(&self, topic: &str) -> Subscription<Vec<u8>> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages.
        if let Ok(mut topics) = self.topics.lock() {
            topics.entry(topic.to_string()).or_default().subscribers.push(tx);
        }

        Subscription::new(rx)
    }

    /// How many times `topic` has been declared.
    pub fn declarations(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .map(|topics| topics.get(topic).map(|t| t.declarations).unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn is_declared(&self, topic: &str) -> bool {
        self.topics
            .lock()
            .map(|topics| topics.get(topic).is_some_and(|t| t.declared))
            .unwrap_or(false)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn declare_topic(&self, topic: &str) -> Result<(), BrokerError> {
        let delay = *self.declare_delay.lock().map_err(|_| BrokerError::Poisoned)?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut topics = self.topics.lock().map_err(|_| BrokerError::Poisoned)?;
        let state = topics.entry(topic.to_string()).or_default();
        state.declared = true;
        state.declarations += 1;
        Ok(())
    }

    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BrokerError::Transport(format!("send to '{topic}' rejected")));
        }

        let mut topics = self.topics.lock().map_err(|_| BrokerError::Poisoned)?;
        match topics.get_mut(topic) {
            Some(state) if state.declared => {
                // Drop any dead subscribers while sending.
                state
                    .subscribers
                    .retain(|tx| tx.send(payload.clone()).is_ok());
                Ok(())
            }
            _ => Err(BrokerError::TopicMissing(topic.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn declared_topic_fans_out_to_subscribers() {
        let broker = InMemoryBroker::new();
        let a = broker.subscribe("t");
        let b = broker.subscribe("t");
        broker.declare_topic("t").await.unwrap();

        broker.send("t", b"hello".to_vec()).await.unwrap();

        assert_eq!(a.try_recv().unwrap(), b"hello");
        assert_eq!(b.try_recv().unwrap(), b"hello");
    }

    #[tokio::test]
    async fn subscribing_does_not_declare() {
        let broker = InMemoryBroker::new();
        let _sub = broker.subscribe("t");
        assert!(!broker.is_declared("t"));
        assert!(broker.send("t", vec![]).await.is_err());
    }

    #[tokio::test]
    async fn counts_repeated_declarations() {
        let broker = InMemoryBroker::new();
        broker.declare_topic("t").await.unwrap();
        broker.declare_topic("t").await.unwrap();
        assert_eq!(broker.declarations("t"), 2);
        assert_eq!(broker.declarations("other"), 0);
    }

    #[tokio::test]
    async fn injected_send_failure() {
        let broker = InMemoryBroker::new();
        broker.declare_topic("t").await.unwrap();
        broker.set_fail_sends(true);
        assert!(matches!(
            broker.send("t", vec![]).await,
            Err(BrokerError::Transport(_))
        ));
    }
}
