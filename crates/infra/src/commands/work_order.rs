use tracing::{info, instrument, warn};

use depot_core::WorkOrderId;
use depot_events::EventPublisher;
use depot_inventory::work_order::work_order_not_found;
use depot_inventory::{
    CreateWorkOrder, DeleteWorkOrder, WorkOrder, WorkOrderCreated, WorkOrderDeleted,
    WorkOrderView,
};

use super::CommandResult;
use crate::cache::{Cache, EntityCache};
use crate::store::{ChangeSet, Store};

/// Create/delete handlers for work orders.
#[derive(Debug, Clone)]
pub struct WorkOrderCommands<S, C, P> {
    store: S,
    cache: EntityCache<C>,
    publisher: P,
}

impl<S, C, P> WorkOrderCommands<S, C, P> {
    pub fn new(store: S, cache: EntityCache<C>, publisher: P) -> Self {
        Self {
            store,
            cache,
            publisher,
        }
    }
}

impl<S, C, P> WorkOrderCommands<S, C, P>
where
    S: Store<WorkOrder>,
    C: Cache,
    P: EventPublisher,
{
    #[instrument(skip_all)]
    pub async fn create(&self, cmd: CreateWorkOrder) -> CommandResult<WorkOrderView> {
        let work_order = cmd.into_work_order();

        let mut changes = ChangeSet::new();
        changes.add(work_order.clone());
        self.store.commit(changes).await?;

        self.cache.put(&work_order).await?;
        self.publisher
            .publish(&WorkOrderCreated::new(work_order.id_typed()))
            .await?;

        info!(work_order_id = %work_order.id_typed(), "work order created");
        Ok(work_order.view())
    }

    #[instrument(skip_all, fields(work_order_id = %cmd.id))]
    pub async fn delete(&self, cmd: DeleteWorkOrder) -> CommandResult<()> {
        let Some(work_order) = self.store.find(&cmd.id).await? else {
            warn!("delete of unknown work order");
            return Err(work_order_not_found().into());
        };

        let mut changes = ChangeSet::new();
        changes.remove(work_order);
        self.store.commit(changes).await?;

        self.cache.evict::<WorkOrder>(&cmd.id).await?;
        self.publisher
            .publish(&WorkOrderDeleted::new(cmd.id))
            .await?;

        info!("work order deleted");
        Ok(())
    }

    pub async fn get(&self, id: WorkOrderId) -> CommandResult<Option<WorkOrderView>> {
        Ok(self.store.find(&id).await?.map(|w| w.view()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use depot_core::ValidationKind;
    use depot_events::{InMemoryBroker, ProvisioningPublisher};

    use super::*;
    use crate::cache::{InMemoryCache, entity_key};
    use crate::commands::CommandError;
    use crate::store::InMemoryDatabase;

    fn commands(
        cache: &InMemoryCache,
        broker: &Arc<InMemoryBroker>,
    ) -> WorkOrderCommands<
        crate::store::InMemoryWorkOrderStore,
        InMemoryCache,
        ProvisioningPublisher<Arc<InMemoryBroker>>,
    > {
        WorkOrderCommands::new(
            InMemoryDatabase::new().work_orders(),
            EntityCache::new(cache.clone(), None),
            ProvisioningPublisher::new(broker.clone()),
        )
    }

    #[tokio::test]
    async fn create_then_delete_round_trips_through_every_port() {
        let cache = InMemoryCache::new();
        let broker = Arc::new(InMemoryBroker::new());
        let created = broker.subscribe("WorkOrderCreated");
        let deleted = broker.subscribe("WorkOrderDeleted");
        let commands = commands(&cache, &broker);

        let view = commands
            .create(CreateWorkOrder::new("Cycle count"))
            .await
            .unwrap();
        let key = entity_key::<WorkOrder>(&view.id);
        assert_eq!(view.title, "Cycle count");
        assert!(cache.contains_key(&key).await);
        assert!(created.try_recv().is_ok());

        commands.delete(DeleteWorkOrder { id: view.id }).await.unwrap();
        assert!(commands.get(view.id).await.unwrap().is_none());
        assert!(!cache.contains_key(&key).await);
        assert!(deleted.try_recv().is_ok());
    }

    #[tokio::test]
    async fn deleting_unknown_work_order_is_not_found() {
        let cache = InMemoryCache::new();
        let broker = Arc::new(InMemoryBroker::new());
        let commands = commands(&cache, &broker);

        let err = commands
            .delete(DeleteWorkOrder {
                id: WorkOrderId::new(),
            })
            .await
            .unwrap_err();

        let CommandError::Validation(err) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(err.kind(), ValidationKind::NotFound);
        assert_eq!(broker.declarations("WorkOrderDeleted"), 0);
    }
}
