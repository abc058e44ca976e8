//! Redis pub/sub-backed message broker (optional).
//!
//! Redis pub/sub is not durable (messages are dropped if no subscriber is
//! listening), which matches the at-most-once contract of the publisher.
//!
//! Redis channels need no setup, so "declaring" a topic registers it in a set
//! (`{prefix}:topics`) that operators and consumers can inspect to discover
//! which channels carry events. Payloads go to `{prefix}:{topic}`.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::instrument;

use depot_events::{BrokerError, MessageBroker};

fn transport(err: redis::RedisError) -> BrokerError {
    BrokerError::Transport(err.to_string())
}

/// Redis pub/sub broker for JSON event payloads.
#[derive(Clone)]
pub struct RedisBroker {
    conn: redis::aio::ConnectionManager,
    prefix: String,
}

impl RedisBroker {
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url).map_err(transport)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(transport)?;
        Ok(Self {
            conn,
            prefix: prefix.into(),
        })
    }

    pub fn registry_key(&self) -> String {
        format!("{}:topics", self.prefix)
    }

    pub fn channel(&self, topic: &str) -> String {
        format!("{}:{}", self.prefix, topic)
    }
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageBroker for RedisBroker {
    #[instrument(skip(self), fields(registry = %self.registry_key()))]
    async fn declare_topic(&self, topic: &str) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(self.registry_key(), topic)
            .await
            .map_err(transport)
    }

    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let _receivers: i64 = conn
            .publish(self.channel(topic), payload)
            .await
            .map_err(transport)?;
        Ok(())
    }
}
