//! Integration event trait.

use serde::Serialize;

/// Trait for events published when an order changes state.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync {
    /// Returns the topic the event is published under.
    fn topic(&self) -> &'static str;

    /// Returns the event type name.
    fn event_type(&self) -> &'static str;
}
