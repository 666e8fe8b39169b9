//! Aggregate root abstraction.

use crate::event::DomainEvent;

/// Trait for aggregate roots that reconstitute from event history.
///
/// `apply` is the only state transition an aggregate has: it consumes the
/// current state and returns the next one. Command handlers never mutate an
/// aggregate directly; they emit events and the state follows on replay.
pub trait AggregateRoot: Sized + Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> &str;

    /// Returns the tenant (organization) that owns the aggregate.
    fn resource_owner(&self) -> &str;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Apply an event, producing the next state.
    #[must_use]
    fn apply(self, event: &Self::Event) -> Self;
}

/// Folds an ordered event history onto `initial`, oldest event first.
///
/// Replaying the same history twice yields identical state.
pub fn reduce<'a, A, I>(initial: A, events: I) -> A
where
    A: AggregateRoot,
    A::Event: 'a,
    I: IntoIterator<Item = &'a A::Event>,
{
    events
        .into_iter()
        .fold(initial, |state, event| state.apply(event))
}
