//! Lifecycle events.
//!
//! Each event carries only the identifier of the entity it describes. The event
//! kind (`event_type`) is also the topic it is published to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{ContainerId, WorkOrderId};
use depot_events::Event;

macro_rules! lifecycle_event {
    ($name:ident, $id:ty) => {
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub id: $id,
            pub occurred_at: DateTime<Utc>,
        }

        impl $name {
            pub fn new(id: $id) -> Self {
                Self {
                    id,
                    occurred_at: Utc::now(),
                }
            }
        }

        impl Event for $name {
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }

            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
        }
    };
}

lifecycle_event!(ContainerCreated, ContainerId);
lifecycle_event!(ContainerUpdated, ContainerId);
lifecycle_event!(ContainerDeleted, ContainerId);
lifecycle_event!(WorkOrderCreated, WorkOrderId);
// No command updates work orders; the kind exists so the event family is complete.
lifecycle_event!(WorkOrderUpdated, WorkOrderId);
lifecycle_event!(WorkOrderDeleted, WorkOrderId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_is_the_type_name() {
        let id = ContainerId::new(3);
        assert_eq!(ContainerCreated::new(id).event_type(), "ContainerCreated");
        assert_eq!(ContainerUpdated::new(id).event_type(), "ContainerUpdated");
        assert_eq!(ContainerDeleted::new(id).event_type(), "ContainerDeleted");
        assert_eq!(
            WorkOrderDeleted::new(WorkOrderId::new()).event_type(),
            "WorkOrderDeleted"
        );
    }

    #[test]
    fn payload_carries_only_identifiers() {
        let json = serde_json::to_value(ContainerCreated::new(ContainerId::new(3))).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj["id"], 3);
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("occurred_at"));
    }
}
