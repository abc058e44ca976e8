//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Identifier of a container (store-assigned integer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(i64);

/// Identifier of a catalog item (store-assigned integer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

/// Identifier of a container ↔ item link.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerItemId(i64);

/// Identifier of a work order (client-opaque token).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkOrderId(Uuid);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Placeholder carried by an entity until its store assigns the real id.
            pub const UNASSIGNED: Self = Self(0);

            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn get(&self) -> i64 {
                self.0
            }

            /// Store-assigned ids are strictly positive.
            pub fn is_assigned(&self) -> bool {
                self.0 > 0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = i64::from_str(s)
                    .map_err(|e| ValidationError::invalid($name, e.to_string()))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(ContainerId, "ContainerId");
impl_int_newtype!(ItemId, "ItemId");
impl_int_newtype!(ContainerItemId, "ContainerItemId");

impl WorkOrderId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WorkOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for WorkOrderId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<WorkOrderId> for Uuid {
    fn from(value: WorkOrderId) -> Self {
        value.0
    }
}

impl FromStr for WorkOrderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| ValidationError::invalid("WorkOrderId", e.to_string()))?;
        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_is_not_assigned() {
        assert!(!ContainerId::UNASSIGNED.is_assigned());
        assert!(ContainerId::new(1).is_assigned());
    }

    #[test]
    fn parse_failure_names_the_field() {
        let err = "abc".parse::<ContainerId>().unwrap_err();
        assert_eq!(err.messages("ContainerId").len(), 1);

        let err = "not-a-uuid".parse::<WorkOrderId>().unwrap_err();
        assert_eq!(err.messages("WorkOrderId").len(), 1);
    }

    #[test]
    fn display_matches_inner_value() {
        assert_eq!(ContainerId::new(42).to_string(), "42");
        let uuid = Uuid::nil();
        assert_eq!(WorkOrderId::from_uuid(uuid).to_string(), uuid.to_string());
    }
}
