use tracing::{info, instrument, warn};

use depot_core::{ContainerId, ValidationError};
use depot_events::EventPublisher;
use depot_inventory::container::{check_name_shape, container_not_found, normalize_description};
use depot_inventory::{
    Container, ContainerCreated, ContainerDeleted, ContainerUpdated, ContainerView,
    CreateContainer, DeleteContainer, UpdateContainer, fields, messages,
};

use super::CommandResult;
use crate::cache::{Cache, EntityCache};
use crate::store::{ChangeSet, ContainerStore, StoreError};

/// Create/update/delete handlers for containers, plus store-backed reads.
#[derive(Debug, Clone)]
pub struct ContainerCommands<S, C, P> {
    store: S,
    cache: EntityCache<C>,
    publisher: P,
}

impl<S, C, P> ContainerCommands<S, C, P> {
    pub fn new(store: S, cache: EntityCache<C>, publisher: P) -> Self {
        Self {
            store,
            cache,
            publisher,
        }
    }
}

impl<S, C, P> ContainerCommands<S, C, P>
where
    S: ContainerStore,
    C: Cache,
    P: EventPublisher,
{
    /// Create a container.
    ///
    /// All field failures are reported together. Name length and uniqueness are
    /// not checked here.
    #[instrument(skip_all, fields(name = %cmd.name))]
    pub async fn create(&self, cmd: CreateContainer) -> CommandResult<ContainerView> {
        let container = cmd
            .into_container()
            .inspect_err(|e| warn!(errors = ?e.errors(), "create container rejected"))?;

        let mut changes = ChangeSet::new();
        changes.add(container);
        let container = self
            .store
            .commit(changes)
            .await?
            .added
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("commit returned no container".to_string()))?;

        self.cache.put(&container).await?;
        self.publisher
            .publish(&ContainerCreated::new(container.id_typed()))
            .await?;

        info!(container_id = %container.id_typed(), "container created");
        Ok(container.view())
    }

    /// Rename / re-describe an existing container.
    ///
    /// The name rules stop at the first failure (required, length, uniqueness
    /// among the other containers); the description is checked independently.
    #[instrument(skip_all, fields(container_id = %cmd.id, name = %cmd.name))]
    pub async fn update(&self, cmd: UpdateContainer) -> CommandResult<ContainerView> {
        let Some(mut container) = self.store.find(&cmd.id).await? else {
            warn!("update of unknown container");
            return Err(container_not_found().into());
        };

        let mut errors = ValidationError::new();
        match check_name_shape(&cmd.name) {
            Err(msg) => errors.add(fields::NAME, msg),
            Ok(()) => {
                if self
                    .store
                    .exists_by_name_excluding(&cmd.name, Some(cmd.id))
                    .await?
                {
                    errors.add(fields::NAME, messages::NAME_TAKEN);
                }
            }
        }
        let description = match normalize_description(cmd.description.as_deref()) {
            Ok(d) => d,
            Err(msg) => {
                errors.add(fields::DESCRIPTION, msg);
                String::new()
            }
        };
        errors
            .into_result()
            .inspect_err(|e| warn!(errors = ?e.errors(), "update container rejected"))?;

        container.rename(cmd.name, description);

        let mut changes = ChangeSet::new();
        changes.update(container.clone());
        self.store.commit(changes).await?;

        self.cache.put(&container).await?;
        self.publisher
            .publish(&ContainerUpdated::new(container.id_typed()))
            .await?;

        info!("container updated");
        Ok(container.view())
    }

    /// Delete an empty container.
    #[instrument(skip_all, fields(container_id = %cmd.id))]
    pub async fn delete(&self, cmd: DeleteContainer) -> CommandResult<()> {
        let Some(container) = self.store.find_with_items(cmd.id).await? else {
            warn!("delete of unknown container");
            return Err(container_not_found().into());
        };

        container.ensure_deletable().inspect_err(|_| {
            warn!(items = container.items().len(), "delete of non-empty container rejected")
        })?;

        let mut changes = ChangeSet::new();
        changes.remove(container);
        self.store.commit(changes).await?;

        self.cache.evict::<Container>(&cmd.id).await?;
        self.publisher
            .publish(&ContainerDeleted::new(cmd.id))
            .await?;

        info!("container deleted");
        Ok(())
    }

    /// Read a container from the store. The cache is not consulted.
    pub async fn get(&self, id: ContainerId) -> CommandResult<Option<ContainerView>> {
        Ok(self.store.find(&id).await?.map(|c| c.view()))
    }

    /// All containers, ordered by id.
    pub async fn list(&self) -> CommandResult<Vec<ContainerView>> {
        let mut views: Vec<_> = self
            .store
            .list()
            .await?
            .iter()
            .map(Container::view)
            .collect();
        views.sort_by_key(|v| v.id);
        Ok(views)
    }
}
