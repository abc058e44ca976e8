//! In-memory store for tests/dev.
//!
//! One [`InMemoryDatabase`] holds every table; the per-type stores are cheap
//! handles onto it, the way per-type repositories share one database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use depot_core::{ContainerId, ContainerItemId, Entity, ItemId, WorkOrderId};
use depot_inventory::{Container, ContainerItem, Item, WorkOrder};

use super::{ChangeSet, Committed, ContainerStore, Store, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    /// Containers are stored without their links; links live in `links`.
    containers: BTreeMap<ContainerId, Container>,
    links: BTreeMap<ContainerItemId, ContainerItem>,
    items: BTreeMap<ItemId, Item>,
    work_orders: HashMap<WorkOrderId, WorkOrder>,
    container_seq: i64,
    link_seq: i64,
    item_seq: i64,
}

impl Tables {
    fn items_of(&self, id: ContainerId) -> Vec<ContainerItem> {
        self.links
            .values()
            .filter(|l| l.container_id == id)
            .copied()
            .collect()
    }
}

/// Shared in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn containers(&self) -> InMemoryContainerStore {
        InMemoryContainerStore { db: self.clone() }
    }

    pub fn work_orders(&self) -> InMemoryWorkOrderStore {
        InMemoryWorkOrderStore { db: self.clone() }
    }

    /// Add a catalog item (the catalog is maintained outside the mutation pipeline).
    pub fn add_item(
        &self,
        sku: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> StoreResult<Item> {
        let mut tables = self.write()?;
        tables.item_seq += 1;
        let item = Item {
            id: ItemId::new(tables.item_seq),
            sku: sku.into(),
            name: name.into(),
            description: description.into(),
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    /// Put `item_id` into `container_id`.
    pub fn link_item(&self, container_id: ContainerId, item_id: ItemId) -> StoreResult<ContainerItem> {
        let mut tables = self.write()?;
        if !tables.containers.contains_key(&container_id) {
            return Err(StoreError::MissingReference {
                entity_type: Container::TYPE_NAME,
                id: container_id.to_string(),
            });
        }
        if !tables.items.contains_key(&item_id) {
            return Err(StoreError::MissingReference {
                entity_type: Item::TYPE_NAME,
                id: item_id.to_string(),
            });
        }
        tables.link_seq += 1;
        let link = ContainerItem::new(ContainerItemId::new(tables.link_seq), container_id, item_id);
        tables.links.insert(link.id, link);
        Ok(link)
    }

    pub fn item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

/// Container store over an [`InMemoryDatabase`].
///
/// Ids come from a per-database sequence starting at 1. Name uniqueness is not
/// enforced here; callers check it before committing.
#[derive(Debug, Clone)]
pub struct InMemoryContainerStore {
    db: InMemoryDatabase,
}

#[async_trait]
impl Store<Container> for InMemoryContainerStore {
    async fn find(&self, id: &ContainerId) -> StoreResult<Option<Container>> {
        Ok(self.db.read()?.containers.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Container>> {
        Ok(self.db.read()?.containers.values().cloned().collect())
    }

    async fn commit(&self, changes: ChangeSet<Container>) -> StoreResult<Committed<Container>> {
        let (added, modified, removed) = changes.into_parts();
        let mut tables = self.db.write()?;

        // Check everything before touching anything.
        for c in modified.iter().chain(removed.iter()) {
            if !tables.containers.contains_key(&c.id_typed()) {
                return Err(StoreError::Stale {
                    entity_type: Container::TYPE_NAME,
                    id: c.id_typed().to_string(),
                });
            }
        }

        let affected = added.len() + modified.len() + removed.len();

        let mut committed = Vec::with_capacity(added.len());
        for mut c in added {
            tables.container_seq += 1;
            c.assign_id(ContainerId::new(tables.container_seq));
            c.set_items(Vec::new());
            tables.containers.insert(c.id_typed(), c.clone());
            committed.push(c);
        }

        for mut c in modified {
            c.set_items(Vec::new());
            tables.containers.insert(c.id_typed(), c);
        }

        for c in removed {
            let id = c.id_typed();
            tables.containers.remove(&id);
            tables.links.retain(|_, l| l.container_id != id);
        }

        Ok(Committed {
            added: committed,
            affected,
        })
    }
}

#[async_trait]
impl ContainerStore for InMemoryContainerStore {
    async fn find_with_items(&self, id: ContainerId) -> StoreResult<Option<Container>> {
        let tables = self.db.read()?;
        Ok(tables.containers.get(&id).cloned().map(|mut c| {
            c.set_items(tables.items_of(id));
            c
        }))
    }

    async fn exists_by_name_excluding(
        &self,
        name: &str,
        exclude: Option<ContainerId>,
    ) -> StoreResult<bool> {
        Ok(self
            .db
            .read()?
            .containers
            .values()
            .any(|c| c.name() == name && Some(c.id_typed()) != exclude))
    }
}

/// Work order store over an [`InMemoryDatabase`]. Ids are chosen by the caller.
#[derive(Debug, Clone)]
pub struct InMemoryWorkOrderStore {
    db: InMemoryDatabase,
}

#[async_trait]
impl Store<WorkOrder> for InMemoryWorkOrderStore {
    async fn find(&self, id: &WorkOrderId) -> StoreResult<Option<WorkOrder>> {
        Ok(self.db.read()?.work_orders.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<WorkOrder>> {
        Ok(self.db.read()?.work_orders.values().cloned().collect())
    }

    async fn commit(&self, changes: ChangeSet<WorkOrder>) -> StoreResult<Committed<WorkOrder>> {
        let (added, modified, removed) = changes.into_parts();
        let mut tables = self.db.write()?;

        for w in modified.iter().chain(removed.iter()) {
            if !tables.work_orders.contains_key(&w.id_typed()) {
                return Err(StoreError::Stale {
                    entity_type: WorkOrder::TYPE_NAME,
                    id: w.id_typed().to_string(),
                });
            }
        }

        let affected = added.len() + modified.len() + removed.len();

        for w in added.iter().chain(modified.iter()) {
            tables.work_orders.insert(w.id_typed(), w.clone());
        }
        for w in &removed {
            tables.work_orders.remove(&w.id_typed());
        }

        Ok(Committed { added, affected })
    }
}
