//! Infrastructure layer: stores, cache, brokers, config, and the command
//! handlers that drive them.

pub mod cache;
pub mod commands;
pub mod config;
pub mod depot;
pub mod event_bus;
pub mod store;

pub use commands::{CommandError, CommandResult, ContainerCommands, WorkOrderCommands};
pub use config::DepotConfig;
pub use depot::{Depot, InMemoryBackends, WiringError};
