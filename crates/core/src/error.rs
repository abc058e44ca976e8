//! Domain error model.
//!
//! The command boundary speaks exactly one error shape: a map from a field-like key
//! to the human-readable messages recorded against it. Input errors, missing
//! entities and business-rule conflicts all travel in this shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Classification of a [`ValidationError`].
///
/// Callers that need to distinguish "not found" from "invalid" (e.g. to pick a
/// status code) read this tag; it is not part of the serialized shape.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// One or more field values failed their rules.
    #[default]
    Invalid,
    /// The addressed entity does not exist.
    NotFound,
    /// The request is well-formed but conflicts with current state.
    Conflict,
}

/// Field → messages validation failure.
#[derive(Debug, Error, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[error("validation failed: {errors:?}")]
pub struct ValidationError {
    #[serde(skip)]
    kind: ValidationKind,
    #[serde(flatten)]
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Empty error of kind [`ValidationKind::Invalid`]; fill it with [`add`](Self::add).
    pub fn new() -> Self {
        Self::default()
    }

    /// A single field failure of kind [`ValidationKind::Invalid`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::single(ValidationKind::Invalid, field, message)
    }

    pub fn not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::single(ValidationKind::NotFound, field, message)
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::single(ValidationKind::Conflict, field, message)
    }

    fn single(kind: ValidationKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self {
            kind,
            errors: BTreeMap::new(),
        };
        err.add(field, message);
        err
    }

    /// Record another message against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn kind(&self) -> ValidationKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// Messages recorded against `field` (empty if none).
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_messages_per_field() {
        let mut err = ValidationError::new();
        err.add("Name", "Name is required");
        err.add("Description", "too long");
        err.add("Name", "second");

        assert_eq!(err.kind(), ValidationKind::Invalid);
        assert_eq!(err.messages("Name"), ["Name is required", "second"]);
        assert_eq!(err.messages("Description"), ["too long"]);
        assert!(err.messages("Other").is_empty());
    }

    #[test]
    fn empty_error_is_ok() {
        assert!(ValidationError::new().into_result().is_ok());
        assert!(ValidationError::invalid("Name", "x").into_result().is_err());
    }

    #[test]
    fn serializes_as_bare_field_map() {
        let err = ValidationError::not_found("ContainerId", "Container not found");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({ "ContainerId": ["Container not found"] }));
    }
}
