//! Mutation command handlers.
//!
//! Every create/update/delete command runs the same pipeline, awaiting each step
//! before starting the next:
//!
//! ```text
//! Command
//!   ↓
//! 1. Validate (field rules, existence, business rules) → ValidationError
//!   ↓
//! 2. Commit the change set to the store
//!   ↓
//! 3. Mirror the result into the cache (write on create/update, evict on delete)
//!   ↓
//! 4. Publish the lifecycle event (identifiers only)
//!   ↓
//! 5. Return the view
//! ```
//!
//! ## Partial Failure
//!
//! There is no transaction spanning store, cache and broker. A cache or publish
//! failure after a successful commit is returned to the caller as a failure even
//! though the store already changed; nothing is retried or compensated. Callers
//! must not read `CommandError::Cache` / `CommandError::Publish` as "nothing
//! happened".
//!
//! ## Cancellation
//!
//! A command is cancelled by dropping its future. Dropping it after the commit
//! skips the remaining cache and publish steps.
//!
//! ## Concurrency
//!
//! Commands are independent tasks. The duplicate-name check and the commit that
//! follows are separate store calls, so two concurrent commands can both pass
//! the check with the same name.

use thiserror::Error;

use depot_core::ValidationError;
use depot_events::PublishError;

use crate::cache::CacheError;
use crate::store::StoreError;

pub mod container;
pub mod work_order;

pub use container::ContainerCommands;
pub use work_order::WorkOrderCommands;

#[derive(Debug, Error)]
pub enum CommandError {
    /// The command was rejected; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Store failure. Nothing after the store step ran.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// Cache failure. The store commit (if any) already happened.
    #[error("cache failure: {0}")]
    Cache(#[from] CacheError),

    /// Publish failure. Store and cache were already updated.
    #[error("publish failure: {0}")]
    Publish(#[from] PublishError),
}

impl CommandError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            CommandError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
