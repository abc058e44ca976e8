use serde::{Deserialize, Serialize};

use depot_core::{ContainerId, Entity, ValidationError, ValidationResult};

use crate::item::ContainerItem;

pub const NAME_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 250;

/// Field keys used in validation errors.
pub mod fields {
    pub const NAME: &str = "Name";
    pub const DESCRIPTION: &str = "Description";
    pub const CONTAINER_ID: &str = "ContainerId";
    pub const WORK_ORDER_ID: &str = "WorkOrderId";
}

/// Validation messages surfaced to callers.
pub mod messages {
    pub const NAME_REQUIRED: &str = "Name is required";
    pub const NAME_TOO_LONG: &str = "Name cannot exceed 200 characters";
    pub const NAME_TAKEN: &str = "A container with this name already exists";
    pub const DESCRIPTION_TOO_LONG: &str = "Description cannot exceed 250 characters";
    pub const CONTAINER_NOT_FOUND: &str = "Container not found";
    pub const CONTAINER_HAS_ITEMS: &str = "Cannot delete a container that has items";
    pub const WORK_ORDER_NOT_FOUND: &str = "WorkOrder not found";
}

/// Entity: Container.
///
/// `items` holds the container's item links only when the store loaded them
/// (see `ContainerStore::find_with_items`); otherwise it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    id: ContainerId,
    name: String,
    description: String,
    #[serde(default)]
    items: Vec<ContainerItem>,
}

impl Container {
    /// A container that has not been committed yet (its id is unassigned).
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ContainerId::UNASSIGNED,
            name: name.into(),
            description: description.into(),
            items: Vec::new(),
        }
    }

    /// Rebuild a persisted container.
    pub fn restore(
        id: ContainerId,
        name: impl Into<String>,
        description: impl Into<String>,
        items: Vec<ContainerItem>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            items,
        }
    }

    pub fn id_typed(&self) -> ContainerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn items(&self) -> &[ContainerItem] {
        &self.items
    }

    /// Called by the store when it commits a new container.
    pub fn assign_id(&mut self, id: ContainerId) {
        self.id = id;
    }

    pub fn set_items(&mut self, items: Vec<ContainerItem>) {
        self.items = items;
    }

    /// Replace name and description with already validated values.
    pub fn rename(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.name = name.into();
        self.description = description.into();
    }

    pub fn ensure_deletable(&self) -> ValidationResult<()> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::conflict(
                fields::CONTAINER_ID,
                messages::CONTAINER_HAS_ITEMS,
            ))
        }
    }

    pub fn view(&self) -> ContainerView {
        ContainerView::from(self)
    }
}

impl Entity for Container {
    type Id = ContainerId;

    const TYPE_NAME: &'static str = "Container";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Caller-facing projection of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerView {
    pub id: ContainerId,
    pub name: String,
    pub description: String,
}

impl From<&Container> for ContainerView {
    fn from(c: &Container) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone(),
        }
    }
}

/// Command: CreateContainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContainer {
    pub name: String,
    pub description: Option<String>,
}

impl CreateContainer {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }

    /// Check every field rule, collecting all failures, and build the new container.
    ///
    /// Only presence of the name is checked here; its length and uniqueness are
    /// enforced on update.
    pub fn into_container(self) -> ValidationResult<Container> {
        let mut errors = ValidationError::new();

        if is_blank(&self.name) {
            errors.add(fields::NAME, messages::NAME_REQUIRED);
        }

        let description = match normalize_description(self.description.as_deref()) {
            Ok(d) => d,
            Err(msg) => {
                errors.add(fields::DESCRIPTION, msg);
                String::new()
            }
        };

        errors.into_result()?;
        Ok(Container::new(self.name, description))
    }
}

/// Command: UpdateContainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateContainer {
    pub id: ContainerId,
    pub name: String,
    pub description: Option<String>,
}

impl UpdateContainer {
    pub fn new(id: ContainerId, name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.map(str::to_string),
        }
    }
}

/// Command: DeleteContainer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteContainer {
    pub id: ContainerId,
}

/// Name rules that need no store access, in order: required, then length.
pub fn check_name_shape(name: &str) -> Result<(), &'static str> {
    if is_blank(name) {
        return Err(messages::NAME_REQUIRED);
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(messages::NAME_TOO_LONG);
    }
    Ok(())
}

/// Trim a description (absent → empty) and check its length.
pub fn normalize_description(description: Option<&str>) -> Result<String, &'static str> {
    let trimmed = description.unwrap_or_default().trim();
    if trimmed.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(messages::DESCRIPTION_TOO_LONG);
    }
    Ok(trimmed.to_string())
}

pub fn container_not_found() -> ValidationError {
    ValidationError::not_found(fields::CONTAINER_ID, messages::CONTAINER_NOT_FOUND)
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
