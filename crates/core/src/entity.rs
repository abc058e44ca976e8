//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// `TYPE_NAME` is the stable, human-readable type name used wherever an entity is
/// addressed outside its store (cache keys, not-found messages, logs).
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Clone
        + Eq
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + Send
        + Sync
        + 'static;

    const TYPE_NAME: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
