//! Infrastructure message broker implementations.
//!
//! The broker port and the provisioning publisher live in `depot-events` as pure
//! mechanics. This module provides infrastructure-backed brokers (e.g. Redis).

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::RedisBroker;
