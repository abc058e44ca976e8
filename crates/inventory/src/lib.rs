//! Inventory domain module.
//!
//! This crate contains the business rules for containers and work orders,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod container;
pub mod events;
pub mod item;
pub mod work_order;

pub use container::{
    Container, ContainerView, CreateContainer, DeleteContainer, UpdateContainer, fields, messages,
};
pub use events::{
    ContainerCreated, ContainerDeleted, ContainerUpdated, WorkOrderCreated, WorkOrderDeleted,
    WorkOrderUpdated,
};
pub use item::{ContainerItem, Item};
pub use work_order::{CreateWorkOrder, DeleteWorkOrder, WorkOrder, WorkOrderView};
