use serde::{Deserialize, Serialize};

use depot_core::{ContainerId, ContainerItemId, Entity, ItemId};

/// Catalog item. Read-only for the mutation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub sku: String,
    pub name: String,
    pub description: String,
}

impl Entity for Item {
    type Id = ItemId;

    const TYPE_NAME: &'static str = "Item";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Link between a container and a catalog item.
///
/// Lives and dies with its parent container.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerItem {
    pub id: ContainerItemId,
    pub container_id: ContainerId,
    pub item_id: ItemId,
}

impl ContainerItem {
    pub fn new(id: ContainerItemId, container_id: ContainerId, item_id: ItemId) -> Self {
        Self {
            id,
            container_id,
            item_id,
        }
    }
}
