//! Lifecycle notifications: the event abstraction, the broker port and the
//! publisher that provisions topic topology on first use.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod publisher;

pub use bus::{BrokerError, MessageBroker, Subscription};
pub use event::Event;
pub use in_memory_bus::InMemoryBroker;
pub use publisher::{EventPublisher, KnownTopics, ProvisioningPublisher, PublishError};
