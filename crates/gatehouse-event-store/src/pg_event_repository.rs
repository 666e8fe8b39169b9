//! `PostgreSQL` implementation of the `EventRepository` trait.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use gatehouse_core::error::DomainError;
use gatehouse_core::repository::{EventRepository, StoredEvent};
use gatehouse_core::unique::{UniqueConstraint, UniqueConstraintAction};

/// Default bound on one append transaction.
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL-backed event repository.
///
/// Appends run in one transaction that holds a transaction-scoped advisory
/// lock on the stream, so writers to the same aggregate serialize at the
/// database and never inside the process.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
    push_timeout: Duration,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    aggregate_id: String,
    aggregate_type: String,
    resource_owner: String,
    event_type: String,
    payload: serde_json::Value,
    sequence_number: i64,
    correlation_id: Uuid,
    causation_id: Uuid,
    creator: String,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            aggregate_id: row.aggregate_id,
            aggregate_type: row.aggregate_type,
            resource_owner: row.resource_owner,
            event_type: row.event_type,
            payload: row.payload,
            sequence_number: row.sequence_number,
            correlation_id: row.correlation_id,
            causation_id: row.causation_id,
            creator: row.creator,
            occurred_at: row.occurred_at,
        }
    }
}

fn db_error(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {e}"))
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository` with the default push timeout.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            push_timeout: DEFAULT_PUSH_TIMEOUT,
        }
    }

    /// Bounds every append by `timeout`. An append that exceeds it fails
    /// with `DomainError::OutcomeUnknown`.
    #[must_use]
    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    /// Applies the workspace migrations.
    ///
    /// # Errors
    ///
    /// Returns the migrator's error if a migration fails.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn push(
        &self,
        aggregate_id: &str,
        expected_version: i64,
        events: &[StoredEvent],
        constraints: &[UniqueConstraint],
    ) -> Result<i64, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(aggregate_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: aggregate_id.to_owned(),
                expected: expected_version,
                actual,
            });
        }

        for constraint in constraints {
            apply_constraint(&mut tx, aggregate_id, constraint).await?;
        }

        for event in events {
            insert_event(&mut tx, event, expected_version).await?;
        }

        tx.commit().await.map_err(db_error)?;

        Ok(events
            .last()
            .map_or(expected_version, |event| event.sequence_number))
    }
}

/// Inserts attempted for one claimed value before giving up.
const CLAIM_ATTEMPTS: usize = 2;

/// State of a unique value after an insert found it already present.
#[derive(Debug, PartialEq, Eq)]
enum ClaimOutcome {
    /// This aggregate already holds the value.
    Held,
    /// Another aggregate holds the value.
    Taken,
    /// The holder released the value between the insert and the lookup.
    Released,
}

fn claim_outcome(owner: Option<&str>, aggregate_id: &str) -> ClaimOutcome {
    match owner {
        Some(owner) if owner == aggregate_id => ClaimOutcome::Held,
        Some(_) => ClaimOutcome::Taken,
        None => ClaimOutcome::Released,
    }
}

async fn apply_constraint(
    tx: &mut Transaction<'_, Postgres>,
    aggregate_id: &str,
    constraint: &UniqueConstraint,
) -> Result<(), DomainError> {
    let (unique_type, scope, value) = constraint.key();
    match constraint.action {
        UniqueConstraintAction::Remove => {
            sqlx::query(
                "DELETE FROM unique_constraints \
                 WHERE unique_type = $1 AND scope = $2 AND unique_value = $3 AND aggregate_id = $4",
            )
            .bind(unique_type)
            .bind(scope)
            .bind(value)
            .bind(aggregate_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
        }
        UniqueConstraintAction::Add => {
            for _ in 0..CLAIM_ATTEMPTS {
                let inserted = sqlx::query(
                    "INSERT INTO unique_constraints (unique_type, scope, unique_value, aggregate_id) \
                     VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (unique_type, scope, unique_value) DO NOTHING",
                )
                .bind(unique_type)
                .bind(scope)
                .bind(value)
                .bind(aggregate_id)
                .execute(&mut **tx)
                .await
                .map_err(db_error)?
                .rows_affected();

                if inserted == 1 {
                    return Ok(());
                }

                let owner: Option<String> = sqlx::query_scalar(
                    "SELECT aggregate_id FROM unique_constraints \
                     WHERE unique_type = $1 AND scope = $2 AND unique_value = $3",
                )
                .bind(unique_type)
                .bind(scope)
                .bind(value)
                .fetch_optional(&mut **tx)
                .await
                .map_err(db_error)?;

                match claim_outcome(owner.as_deref(), aggregate_id) {
                    ClaimOutcome::Held => return Ok(()),
                    ClaimOutcome::Taken => {
                        return Err(DomainError::AlreadyExists(constraint.error_message.clone()));
                    }
                    ClaimOutcome::Released => {
                        debug!(unique_type, "unique value released concurrently; retrying claim");
                    }
                }
            }
            return Err(DomainError::Infrastructure(format!(
                "unique value of type {unique_type} changed concurrently"
            )));
        }
    }
    Ok(())
}

async fn insert_event(
    tx: &mut Transaction<'_, Postgres>,
    event: &StoredEvent,
    expected_version: i64,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO domain_events \
         (event_id, aggregate_id, aggregate_type, resource_owner, event_type, payload, \
          sequence_number, correlation_id, causation_id, creator, occurred_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(event.event_id)
    .bind(&event.aggregate_id)
    .bind(&event.aggregate_type)
    .bind(&event.resource_owner)
    .bind(&event.event_type)
    .bind(&event.payload)
    .bind(event.sequence_number)
    .bind(event.correlation_id)
    .bind(event.causation_id)
    .bind(&event.creator)
    .bind(event.occurred_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return DomainError::ConcurrencyConflict {
                    aggregate_id: event.aggregate_id.clone(),
                    expected: expected_version,
                    actual: event.sequence_number,
                };
            }
        }
        db_error(e)
    })?;
    Ok(())
}

#[async_trait]
impl EventRepository for PgEventRepository {
    #[instrument(skip(self))]
    async fn load_events(
        &self,
        aggregate_id: &str,
        resource_owner: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT event_id, aggregate_id, aggregate_type, resource_owner, event_type, payload, \
                    sequence_number, correlation_id, causation_id, creator, occurred_at \
             FROM domain_events \
             WHERE aggregate_id = $1 AND resource_owner = $2 \
             ORDER BY sequence_number ASC",
        )
        .bind(aggregate_id)
        .bind(resource_owner)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(count = rows.len(), "loaded events");
        Ok(rows.into_iter().map(StoredEvent::from).collect())
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

        let version = tokio::time::timeout(
            self.push_timeout,
            self.push(aggregate_id, expected_version, events, constraints),
        )
        .await
        .map_err(|_| {
            DomainError::OutcomeUnknown(format!(
                "append to {aggregate_id} did not complete within {:?}",
                self.push_timeout
            ))
        })??;

        debug!(version, "appended events");
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_by_another_aggregate_is_taken() {
        assert_eq!(claim_outcome(Some("idp2"), "idp1"), ClaimOutcome::Taken);
    }

    #[test]
    fn test_claim_by_same_aggregate_is_held() {
        assert_eq!(claim_outcome(Some("idp1"), "idp1"), ClaimOutcome::Held);
    }

    #[test]
    fn test_vanished_claim_is_released() {
        assert_eq!(claim_outcome(None, "idp1"), ClaimOutcome::Released);
    }
}
