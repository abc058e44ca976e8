//! Best-effort key → entity side store (the cache port).
//!
//! The mutation pipeline mirrors entities into the cache after every successful
//! commit and evicts them after every successful delete. It never reads them
//! back; the store stays authoritative.
//!
//! Keys follow `"{TypeName}:{Id}"` (e.g. `"Container:42"`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use depot_core::Entity;

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_cache;

pub use memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),

    #[error("cache operation failed: {0}")]
    Operation(String),

    #[error("cache serialization failed: {0}")]
    Serialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-level cache operations.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, expiring after `ttl` when given.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()>;

    async fn remove(&self, key: &str) -> CacheResult<()>;
}

#[async_trait]
impl<C> Cache for Arc<C>
where
    C: Cache + ?Sized,
{
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        (**self).set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key).await
    }
}

/// Cache key for an entity: `"{TypeName}:{Id}"`.
pub fn entity_key<E: Entity>(id: &E::Id) -> String {
    format!("{}:{}", E::TYPE_NAME, id)
}

/// Typed, JSON-encoded view over a [`Cache`].
#[derive(Debug, Clone)]
pub struct EntityCache<C> {
    cache: C,
    ttl: Option<Duration>,
}

impl<C> EntityCache<C> {
    pub fn new(cache: C, ttl: Option<Duration>) -> Self {
        Self { cache, ttl }
    }

    pub fn inner(&self) -> &C {
        &self.cache
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

impl<C: Cache> EntityCache<C> {
    /// Write (or overwrite) the entry for `entity`.
    pub async fn put<E>(&self, entity: &E) -> CacheResult<()>
    where
        E: Entity + Serialize,
    {
        let bytes =
            serde_json::to_vec(entity).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.cache
            .set(&entity_key::<E>(entity.id()), &bytes, self.ttl)
            .await
    }

    pub async fn fetch<E>(&self, id: &E::Id) -> CacheResult<Option<E>>
    where
        E: Entity + DeserializeOwned,
    {
        match self.cache.get(&entity_key::<E>(id)).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    pub async fn evict<E: Entity>(&self, id: &E::Id) -> CacheResult<()> {
        self.cache.remove(&entity_key::<E>(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{ContainerId, WorkOrderId};
    use depot_inventory::{Container, WorkOrder};
    use uuid::Uuid;

    #[test]
    fn key_is_type_name_and_id() {
        assert_eq!(entity_key::<Container>(&ContainerId::new(42)), "Container:42");
        assert_eq!(
            entity_key::<WorkOrder>(&WorkOrderId::from_uuid(Uuid::nil())),
            "WorkOrder:00000000-0000-0000-0000-000000000000"
        );
    }

    #[tokio::test]
    async fn put_fetch_evict() {
        let cache = EntityCache::new(InMemoryCache::new(), None);
        let c = Container::restore(ContainerId::new(7), "Bin", "Small parts", vec![]);

        cache.put(&c).await.unwrap();
        assert_eq!(cache.fetch::<Container>(&ContainerId::new(7)).await.unwrap(), Some(c));

        cache.evict::<Container>(&ContainerId::new(7)).await.unwrap();
        assert_eq!(cache.fetch::<Container>(&ContainerId::new(7)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_serialization_error() {
        let raw = InMemoryCache::new();
        raw.set("Container:1", b"not json", None).await.unwrap();
        let cache = EntityCache::new(raw, None);

        let err = cache.fetch::<Container>(&ContainerId::new(1)).await.unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }
}
