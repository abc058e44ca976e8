use serde::{Deserialize, Serialize};

use depot_core::{Entity, ValidationError, WorkOrderId};

use crate::container::{fields, messages};

/// Entity: WorkOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    id: WorkOrderId,
    title: String,
}

impl WorkOrder {
    pub fn new(id: WorkOrderId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    pub fn id_typed(&self) -> WorkOrderId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn view(&self) -> WorkOrderView {
        WorkOrderView {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

impl Entity for WorkOrder {
    type Id = WorkOrderId;

    const TYPE_NAME: &'static str = "WorkOrder";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Caller-facing projection of a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderView {
    pub id: WorkOrderId,
    pub title: String,
}

/// Command: CreateWorkOrder.
///
/// The title is taken as given; work orders carry no field rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkOrder {
    pub title: String,
}

impl CreateWorkOrder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn into_work_order(self) -> WorkOrder {
        WorkOrder::new(WorkOrderId::new(), self.title)
    }
}

/// Command: DeleteWorkOrder.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteWorkOrder {
    pub id: WorkOrderId,
}

pub fn work_order_not_found() -> ValidationError {
    ValidationError::not_found(fields::WORK_ORDER_ID, messages::WORK_ORDER_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_title_is_accepted() {
        let a = CreateWorkOrder::new("").into_work_order();
        let b = CreateWorkOrder::new("Restock aisle 4").into_work_order();
        assert_eq!(a.title(), "");
        assert_eq!(b.title(), "Restock aisle 4");
        assert_ne!(a.id_typed(), b.id_typed());
    }

    #[test]
    fn not_found_is_keyed_by_id_field() {
        let err = work_order_not_found();
        assert_eq!(err.kind(), depot_core::ValidationKind::NotFound);
        assert_eq!(err.messages("WorkOrderId"), ["WorkOrder not found"]);
    }
}
