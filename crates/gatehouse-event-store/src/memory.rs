//! In-memory event log.
//!
//! Same append semantics as the PostgreSQL store, with every append
//! serialized under one write lock. Used by tests and by the API when it is
//! started without a database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use gatehouse_core::error::DomainError;
use gatehouse_core::repository::{EventRepository, StoredEvent};
use gatehouse_core::unique::{UniqueConstraint, UniqueConstraintAction};

type ConstraintKey = (String, String, String);

#[derive(Debug, Default)]
struct Log {
    streams: HashMap<String, Vec<StoredEvent>>,
    constraints: HashMap<ConstraintKey, String>,
}

/// Event log held in process memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRepository {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventRepository {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The aggregate currently holding a constraint value, if any.
    pub async fn constraint_owner(
        &self,
        unique_type: &str,
        scope: &str,
        value: &str,
    ) -> Option<String> {
        let key = (
            unique_type.to_owned(),
            scope.to_owned(),
            gatehouse_core::unique::normalize(value),
        );
        self.log.read().await.constraints.get(&key).cloned()
    }
}

fn key_of(constraint: &UniqueConstraint) -> ConstraintKey {
    let (unique_type, scope, value) = constraint.key();
    (unique_type.to_owned(), scope.to_owned(), value.to_owned())
}

/// Applies `ops` in order to a copy of `current`; the copy is only kept if
/// every operation succeeds.
fn stage_constraints(
    current: &HashMap<ConstraintKey, String>,
    aggregate_id: &str,
    ops: &[UniqueConstraint],
) -> Result<HashMap<ConstraintKey, String>, DomainError> {
    let mut staged = current.clone();
    for op in ops {
        let key = key_of(op);
        match op.action {
            UniqueConstraintAction::Remove => {
                if staged.get(&key).is_some_and(|owner| owner == aggregate_id) {
                    staged.remove(&key);
                }
            }
            UniqueConstraintAction::Add => match staged.get(&key) {
                Some(owner) if owner != aggregate_id => {
                    return Err(DomainError::AlreadyExists(op.error_message.clone()));
                }
                Some(_) => {}
                None => {
                    staged.insert(key, aggregate_id.to_owned());
                }
            },
        }
    }
    Ok(staged)
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(
        &self,
        aggregate_id: &str,
        resource_owner: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let log = self.log.read().await;
        Ok(log
            .streams
            .get(aggregate_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|event| event.resource_owner == resource_owner)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    #[instrument(skip(self, events, constraints), fields(events = events.len()))]
    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
        constraints: &[UniqueConstraint],
    ) -> Result<i64, DomainError> {
        if events.is_empty() {
            return Ok(expected_version);
        }

        let mut log = self.log.write().await;

        let actual = log
            .streams
            .get(aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |event| event.sequence_number);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: aggregate_id.to_owned(),
                expected: expected_version,
                actual,
            });
        }

        let staged = stage_constraints(&log.constraints, aggregate_id, constraints)?;
        log.constraints = staged;
        log.streams
            .entry(aggregate_id.to_owned())
            .or_default()
            .extend_from_slice(events);

        let version = events
            .last()
            .map_or(expected_version, |event| event.sequence_number);
        debug!(version, "appended events");
        Ok(version)
    }
}
