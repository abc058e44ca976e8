//! Durable entity persistence (the store port).
//!
//! Handlers never write to a store piecemeal. They stage what they want to happen
//! in a [`ChangeSet`] (the `add` / `remove` half of the port) and hand it to
//! [`Store::commit`], which applies the whole set and reports what it did:
//!
//! ```text
//! ChangeSet { added, modified, removed }
//!   ↓ commit
//! Committed { added (with store-assigned ids), affected }
//! ```
//!
//! ## Concurrency
//!
//! There is no optimistic-concurrency token. Two commits that modify the same
//! entity race and the later one wins. Existence queries such as
//! [`ContainerStore::exists_by_name_excluding`] are not atomic with a later commit.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use depot_core::{ContainerId, Entity};
use depot_inventory::Container;

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{InMemoryContainerStore, InMemoryDatabase, InMemoryWorkOrderStore};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresContainerStore, PostgresWorkOrderStore};

/// Store operation error.
///
/// These are infrastructure failures; they never describe a business rule.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A commit targeted a row that no longer exists.
    #[error("{entity_type} {id} no longer exists")]
    Stale { entity_type: &'static str, id: String },

    /// A referenced row does not exist (e.g. linking an unknown item).
    #[error("{entity_type} {id} not found")]
    MissingReference { entity_type: &'static str, id: String },

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store state poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Staged changes for one entity type, applied together by [`Store::commit`].
#[derive(Debug, Clone)]
pub struct ChangeSet<E> {
    added: Vec<E>,
    modified: Vec<E>,
    removed: Vec<E>,
}

impl<E> Default for ChangeSet<E> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            modified: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<E> ChangeSet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a new entity; the store assigns its identity if needed.
    pub fn add(&mut self, entity: E) -> &mut Self {
        self.added.push(entity);
        self
    }

    /// Stage a new state for an existing entity.
    pub fn update(&mut self, entity: E) -> &mut Self {
        self.modified.push(entity);
        self
    }

    pub fn remove(&mut self, entity: E) -> &mut Self {
        self.removed.push(entity);
        self
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> (Vec<E>, Vec<E>, Vec<E>) {
        (self.added, self.modified, self.removed)
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone)]
pub struct Committed<E> {
    /// Added entities as persisted, carrying their assigned identities.
    pub added: Vec<E>,
    /// Number of rows written (added + modified + removed).
    pub affected: usize,
}

/// Persistence for one entity type.
#[async_trait]
pub trait Store<E: Entity>: Send + Sync {
    async fn find(&self, id: &E::Id) -> StoreResult<Option<E>>;

    async fn list(&self) -> StoreResult<Vec<E>>;

    /// Apply every staged change, or none of them.
    async fn commit(&self, changes: ChangeSet<E>) -> StoreResult<Committed<E>>;
}

/// Container-specific queries.
#[async_trait]
pub trait ContainerStore: Store<Container> {
    /// Like [`Store::find`], with the container's item links loaded.
    async fn find_with_items(&self, id: ContainerId) -> StoreResult<Option<Container>>;

    /// Whether any container other than `exclude` is named exactly `name`.
    async fn exists_by_name_excluding(
        &self,
        name: &str,
        exclude: Option<ContainerId>,
    ) -> StoreResult<bool>;
}

#[async_trait]
impl<E, S> Store<E> for Arc<S>
where
    E: Entity,
    S: Store<E> + ?Sized,
{
    async fn find(&self, id: &E::Id) -> StoreResult<Option<E>> {
        (**self).find(id).await
    }

    async fn list(&self) -> StoreResult<Vec<E>> {
        (**self).list().await
    }

    async fn commit(&self, changes: ChangeSet<E>) -> StoreResult<Committed<E>> {
        (**self).commit(changes).await
    }
}

#[async_trait]
impl<S> ContainerStore for Arc<S>
where
    S: ContainerStore + ?Sized,
{
    async fn find_with_items(&self, id: ContainerId) -> StoreResult<Option<Container>> {
        (**self).find_with_items(id).await
    }

    async fn exists_by_name_excluding(
        &self,
        name: &str,
        exclude: Option<ContainerId>,
    ) -> StoreResult<bool> {
        (**self).exists_by_name_excluding(name, exclude).await
    }
}
