use chrono::{DateTime, Utc};
use serde::Serialize;

/// A domain-agnostic lifecycle notification.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **small** (identifiers only, never a full entity snapshot)
pub trait Event: Serialize + Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event kind (e.g. "ContainerCreated").
    ///
    /// The kind doubles as the name of the topic the event is published to.
    fn event_type(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
