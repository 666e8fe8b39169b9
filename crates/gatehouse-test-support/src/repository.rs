//! Mock `EventRepository` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use gatehouse_core::error::DomainError;
use gatehouse_core::repository::{EventRepository, StoredEvent};
use gatehouse_core::unique::UniqueConstraint;

/// One recorded `append_events` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendCall {
    /// Target stream.
    pub aggregate_id: String,
    /// Version the caller observed.
    pub expected_version: i64,
    /// Events submitted.
    pub events: Vec<StoredEvent>,
    /// Constraint operations submitted.
    pub constraints: Vec<UniqueConstraint>,
}

/// An event repository that records all `load_events` and `append_events`
/// calls. Returns the configured history from `load_events` on every call.
///
/// Appends succeed with `expected_version + events.len()` unless the
/// repository was built with [`rejecting`](Self::rejecting), in which case
/// the call is recorded and then fails.
#[derive(Debug)]
pub struct RecordingEventRepository {
    history: Vec<StoredEvent>,
    append_error: Option<fn() -> DomainError>,
    loads: Mutex<Vec<(String, String)>>,
    appended: Mutex<Vec<AppendCall>>,
}

impl RecordingEventRepository {
    /// Create a recording repository that returns `history` from every
    /// `load_events` call.
    #[must_use]
    pub fn new(history: Vec<StoredEvent>) -> Self {
        Self {
            history,
            append_error: None,
            loads: Mutex::new(Vec::new()),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Like [`new`](Self::new), but every append fails with `error()`.
    #[must_use]
    pub fn rejecting(history: Vec<StoredEvent>, error: fn() -> DomainError) -> Self {
        Self {
            append_error: Some(error),
            ..Self::new(history)
        }
    }

    /// Returns a snapshot of all append calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended(&self) -> Vec<AppendCall> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns the `(aggregate_id, resource_owner)` of every load.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn loads(&self) -> Vec<(String, String)> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(
        &self,
        aggregate_id: &str,
        resource_owner: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        self.loads
            .lock()
            .unwrap()
            .push((aggregate_id.to_owned(), resource_owner.to_owned()));
        Ok(self.history.clone())
    }

    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
        constraints: &[UniqueConstraint],
    ) -> Result<i64, DomainError> {
        self.appended.lock().unwrap().push(AppendCall {
            aggregate_id: aggregate_id.to_owned(),
            expected_version,
            events: events.to_vec(),
            constraints: constraints.to_vec(),
        });
        match self.append_error {
            Some(error) => Err(error()),
            None => Ok(expected_version + i64::try_from(events.len()).unwrap()),
        }
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(
        &self,
        _aggregate_id: &str,
        _resource_owner: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
        _constraints: &[UniqueConstraint],
    ) -> Result<i64, DomainError> {
        Ok(expected_version + i64::try_from(events.len()).unwrap())
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(
        &self,
        _aggregate_id: &str,
        _resource_owner: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: &str,
        _expected_version: i64,
        _events: &[StoredEvent],
        _constraints: &[UniqueConstraint],
    ) -> Result<i64, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
