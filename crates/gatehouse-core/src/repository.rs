//! Event repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::unique::UniqueConstraint;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: String,
    /// Kind of aggregate the stream holds.
    pub aggregate_type: String,
    /// Organization owning the aggregate.
    pub resource_owner: String,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Actor that issued the causing command.
    pub creator: String,
    /// Timestamp of event creation.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// Repository trait for loading and appending domain events.
///
/// This is the only shared mutable resource of the command engine. No lock is
/// held between `load_events` and `append_events`; the expected-version check
/// at append time is the sole guard against concurrent writers.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for one aggregate owned by `resource_owner`, ordered by
    /// sequence number. An empty result means the aggregate does not exist.
    async fn load_events(
        &self,
        aggregate_id: &str,
        resource_owner: &str,
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Atomically append `events` to an aggregate stream and apply
    /// `constraints`, in order, with optimistic concurrency.
    ///
    /// `expected_version` is the last sequence number the caller observed.
    /// Either everything is applied and the new version is returned, or
    /// nothing is: `ConcurrencyConflict` if the stream advanced,
    /// `AlreadyExists` if a constraint is held by another aggregate.
    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
        constraints: &[UniqueConstraint],
    ) -> Result<i64, DomainError>;
}
