//! Message broker abstraction (mechanics only).
//!
//! The broker is the transport underneath the [`EventPublisher`](crate::EventPublisher):
//! it knows about named topics and opaque payloads, nothing about domain events.
//!
//! ## Delivery Model
//!
//! - **At-most-once**: a payload is handed to the transport once; there is no retry
//!   and no dead-lettering.
//! - **No ordering guarantees** across publishers.
//! - **No persistence**: the store is the source of truth, the broker only notifies.
//!
//! ## Topology
//!
//! Some transports need a destination to exist before anything is sent to it
//! (an exchange, a registered channel). [`MessageBroker::declare_topic`] creates
//! that topology. Declaring is idempotent on the transport side but may be slow
//! and externally visible, so callers are expected to avoid repeating it.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// A subscription to one topic.
///
/// Each subscription gets a copy of every payload sent to its topic after it was
/// created (broadcast semantics). Subscriptions are designed for single-threaded
/// consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A payload was sent to a topic whose topology was never declared.
    #[error("topic not declared: {0}")]
    TopicMissing(String),

    /// The transport rejected the operation (connection, protocol, ...).
    #[error("broker transport error: {0}")]
    Transport(String),

    /// Internal lock poisoning.
    #[error("broker state poisoned")]
    Poisoned,
}

/// Named-topic transport.
///
/// Implementations must be safe to share across tasks; many commands publish
/// concurrently through one broker.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Create the delivery topology for `topic`.
    async fn declare_topic(&self, topic: &str) -> Result<(), BrokerError>;

    /// Hand `payload` to the transport for `topic`.
    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError>;
}

#[async_trait]
impl<B> MessageBroker for Arc<B>
where
    B: MessageBroker + ?Sized,
{
    async fn declare_topic(&self, topic: &str) -> Result<(), BrokerError> {
        (**self).declare_topic(topic).await
    }

    async fn send(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        (**self).send(topic, payload).await
    }
}
