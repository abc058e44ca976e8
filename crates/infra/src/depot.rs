//! Composition root: picks a store, a cache and a broker, and hands out the
//! command handlers wired over them.
//!
//! Backends are chosen from [`DepotConfig`]:
//!
//! - `database_url` → Postgres stores (feature `postgres`), in-memory otherwise
//! - `redis_url` → Redis cache and Redis pub/sub broker (feature `redis`),
//!   in-memory otherwise
//!
//! Every handler shares one publisher, so topic provisioning happens once per
//! `Depot` no matter which handler publishes first.

use std::sync::Arc;

use thiserror::Error;

use depot_events::{BrokerError, InMemoryBroker, KnownTopics, MessageBroker, ProvisioningPublisher};
use depot_inventory::WorkOrder;

use crate::cache::{Cache, CacheError, EntityCache, InMemoryCache};
use crate::commands::{ContainerCommands, WorkOrderCommands};
use crate::config::DepotConfig;
use crate::store::{ContainerStore, InMemoryDatabase, Store, StoreError};

pub type SharedPublisher = Arc<ProvisioningPublisher<Arc<dyn MessageBroker>>>;

pub type DepotContainerCommands =
    ContainerCommands<Arc<dyn ContainerStore>, Arc<dyn Cache>, SharedPublisher>;

pub type DepotWorkOrderCommands =
    WorkOrderCommands<Arc<dyn Store<WorkOrder>>, Arc<dyn Cache>, SharedPublisher>;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("{var} is set but the `{feature}` feature is not enabled")]
    FeatureDisabled {
        var: &'static str,
        feature: &'static str,
    },

    #[error("store wiring failed: {0}")]
    Store(#[from] StoreError),

    #[error("cache wiring failed: {0}")]
    Cache(#[from] CacheError),

    #[error("broker wiring failed: {0}")]
    Broker(#[from] BrokerError),
}

/// Handles onto the in-memory backends behind [`Depot::in_memory`].
#[derive(Debug, Clone)]
pub struct InMemoryBackends {
    pub database: InMemoryDatabase,
    pub cache: InMemoryCache,
    pub broker: Arc<InMemoryBroker>,
}

/// The mutation pipeline, wired.
pub struct Depot {
    containers: DepotContainerCommands,
    work_orders: DepotWorkOrderCommands,
    publisher: SharedPublisher,
}

impl Depot {
    pub fn new(
        container_store: Arc<dyn ContainerStore>,
        work_order_store: Arc<dyn Store<WorkOrder>>,
        cache: Arc<dyn Cache>,
        broker: Arc<dyn MessageBroker>,
        config: &DepotConfig,
    ) -> Self {
        let publisher: SharedPublisher = Arc::new(ProvisioningPublisher::new(broker));
        let cache = EntityCache::new(cache, config.cache_ttl);
        Self {
            containers: ContainerCommands::new(container_store, cache.clone(), publisher.clone()),
            work_orders: WorkOrderCommands::new(work_order_store, cache, publisher.clone()),
            publisher,
        }
    }

    /// Wire everything in memory (tests/dev) and return the backends for inspection.
    pub fn in_memory(config: &DepotConfig) -> (Self, InMemoryBackends) {
        let backends = InMemoryBackends {
            database: InMemoryDatabase::new(),
            cache: InMemoryCache::new(),
            broker: Arc::new(InMemoryBroker::new()),
        };
        let depot = Self::new(
            Arc::new(backends.database.containers()),
            Arc::new(backends.database.work_orders()),
            Arc::new(backends.cache.clone()),
            backends.broker.clone(),
            config,
        );
        (depot, backends)
    }

    /// Connect the backends named by `config`.
    pub async fn from_config(config: &DepotConfig) -> Result<Self, WiringError> {
        let (container_store, work_order_store) = stores(config).await?;
        let (cache, broker) = messaging(config).await?;
        Ok(Self::new(
            container_store,
            work_order_store,
            cache,
            broker,
            config,
        ))
    }

    pub fn containers(&self) -> &DepotContainerCommands {
        &self.containers
    }

    pub fn work_orders(&self) -> &DepotWorkOrderCommands {
        &self.work_orders
    }

    /// Topics this depot has provisioned so far.
    pub fn known_topics(&self) -> &KnownTopics {
        self.publisher.known_topics()
    }
}

impl std::fmt::Debug for Depot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Depot")
            .field("known_topics", &self.known_topics().len())
            .finish_non_exhaustive()
    }
}

type Stores = (Arc<dyn ContainerStore>, Arc<dyn Store<WorkOrder>>);

async fn stores(config: &DepotConfig) -> Result<Stores, WiringError> {
    match config.database_url.as_deref() {
        None => {
            let db = InMemoryDatabase::new();
            let containers: Arc<dyn ContainerStore> = Arc::new(db.containers());
            let work_orders: Arc<dyn Store<WorkOrder>> = Arc::new(db.work_orders());
            Ok((containers, work_orders))
        }
        #[cfg(feature = "postgres")]
        Some(url) => {
            use crate::store::{PostgresContainerStore, PostgresWorkOrderStore, postgres};

            let pool = sqlx::PgPool::connect(url)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            postgres::migrate(&pool).await?;
            tracing::info!("stores wired to postgres");
            let containers: Arc<dyn ContainerStore> =
                Arc::new(PostgresContainerStore::new(pool.clone()));
            let work_orders: Arc<dyn Store<WorkOrder>> = Arc::new(PostgresWorkOrderStore::new(pool));
            Ok((containers, work_orders))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => Err(WiringError::FeatureDisabled {
            var: crate::config::DATABASE_URL_VAR,
            feature: "postgres",
        }),
    }
}

type Messaging = (Arc<dyn Cache>, Arc<dyn MessageBroker>);

async fn messaging(config: &DepotConfig) -> Result<Messaging, WiringError> {
    match config.redis_url.as_deref() {
        None => {
            let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
            let broker: Arc<dyn MessageBroker> = Arc::new(InMemoryBroker::new());
            Ok((cache, broker))
        }
        #[cfg(feature = "redis")]
        Some(url) => {
            use crate::cache::RedisCache;
            use crate::event_bus::RedisBroker;

            let cache: Arc<dyn Cache> = Arc::new(RedisCache::connect(url).await?);
            let broker: Arc<dyn MessageBroker> =
                Arc::new(RedisBroker::connect(url, config.topic_prefix.clone()).await?);
            tracing::info!(prefix = %config.topic_prefix, "cache and broker wired to redis");
            Ok((cache, broker))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(WiringError::FeatureDisabled {
            var: crate::config::REDIS_URL_VAR,
            feature: "redis",
        }),
    }
}
