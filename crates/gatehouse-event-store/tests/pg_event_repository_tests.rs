//! Integration tests for `PgEventRepository`.
//!
//! These need a PostgreSQL server reachable through `DATABASE_URL`; run them
//! with `cargo test -- --ignored`.

use std::time::Duration;

use chrono::{SubsecRound, Utc};
use gatehouse_core::error::DomainError;
use gatehouse_core::repository::{EventRepository, StoredEvent};
use gatehouse_core::unique::UniqueConstraint;
use gatehouse_event_store::pg_event_repository::PgEventRepository;
use sqlx::PgPool;
use uuid::Uuid;

/// Helper to build a `StoredEvent` with sensible defaults.
fn make_stored_event(aggregate_id: &str, sequence_number: i64) -> StoredEvent {
    StoredEvent {
        event_id: Uuid::new_v4(),
        aggregate_id: aggregate_id.to_owned(),
        aggregate_type: "org.idp".to_owned(),
        resource_owner: "org1".to_owned(),
        event_type: "TestEvent".to_owned(),
        payload: serde_json::json!({"key": "value"}),
        sequence_number,
        correlation_id: Uuid::new_v4(),
        causation_id: Uuid::new_v4(),
        creator: "tester".to_owned(),
        occurred_at: Utc::now().trunc_subsecs(6),
    }
}

fn claim(value: &str) -> UniqueConstraint {
    UniqueConstraint::add("idp_config_names", "org1", value, "name taken")
}

// --- load_events ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_load_events_returns_empty_vec_for_nonexistent_aggregate(pool: PgPool) {
    let repo = PgEventRepository::new(pool);

    let events = repo.load_events("missing", "org1").await.unwrap();

    assert!(events.is_empty());
}

// --- append_events + load_events round-trip ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_append_and_load_single_event(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let event = make_stored_event("idp1", 1);

    let version = repo
        .append_events("idp1", 0, &[event.clone()], &[])
        .await
        .unwrap();

    assert_eq!(version, 1);
    let loaded = repo.load_events("idp1", "org1").await.unwrap();
    assert_eq!(loaded, vec![event]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_load_events_is_scoped_to_resource_owner(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    repo.append_events("idp1", 0, &[make_stored_event("idp1", 1)], &[])
        .await
        .unwrap();

    let loaded = repo.load_events("idp1", "org2").await.unwrap();

    assert!(loaded.is_empty());
}

// --- concurrency ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_stale_expected_version_is_rejected(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    repo.append_events(
        "idp1",
        0,
        &[make_stored_event("idp1", 1), make_stored_event("idp1", 2)],
        &[],
    )
    .await
    .unwrap();

    // Sequence numbers don't collide, but the version check must still reject.
    let result = repo
        .append_events("idp1", 0, &[make_stored_event("idp1", 3)], &[])
        .await;

    match result {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id,
            expected,
            actual,
        }) => {
            assert_eq!(aggregate_id, "idp1");
            assert_eq!(expected, 0);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_appends_at_same_version_admit_one_writer(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    repo.append_events("idp1", 0, &[make_stored_event("idp1", 1)], &[])
        .await
        .unwrap();

    let first_event = [make_stored_event("idp1", 2)];
    let second_event = [make_stored_event("idp1", 2)];
    let (first, second) = tokio::join!(
        repo.append_events("idp1", 1, &first_event, &[]),
        repo.append_events("idp1", 1, &second_event, &[]),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(DomainError::ConcurrencyConflict { .. })))
    );
}

// --- unique constraints ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_constraint_collision_rolls_back_events(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    repo.append_events("idp1", 0, &[make_stored_event("idp1", 1)], &[claim("Corp")])
        .await
        .unwrap();

    let result = repo
        .append_events("idp2", 0, &[make_stored_event("idp2", 1)], &[claim("corp")])
        .await;

    match result {
        Err(DomainError::AlreadyExists(message)) => assert_eq!(message, "name taken"),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
    assert!(repo.load_events("idp2", "org1").await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_rename_releases_old_name_atomically(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    repo.append_events("idp1", 0, &[make_stored_event("idp1", 1)], &[claim("old")])
        .await
        .unwrap();

    let rename = UniqueConstraint::rename("idp_config_names", "org1", "old", "new", "name taken");
    repo.append_events("idp1", 1, &[make_stored_event("idp1", 2)], &rename)
        .await
        .unwrap();

    // The old name is free for another aggregate, the new one is not.
    repo.append_events("idp2", 0, &[make_stored_event("idp2", 1)], &[claim("old")])
        .await
        .unwrap();
    let result = repo
        .append_events("idp3", 0, &[make_stored_event("idp3", 1)], &[claim("NEW")])
        .await;
    assert!(matches!(result, Err(DomainError::AlreadyExists(_))));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_reclaiming_own_name_is_idempotent(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    repo.append_events("idp1", 0, &[make_stored_event("idp1", 1)], &[claim("corp")])
        .await
        .unwrap();

    let result = repo
        .append_events("idp1", 1, &[make_stored_event("idp1", 2)], &[claim("corp")])
        .await;

    assert_eq!(result.unwrap(), 2);
}

// --- edge cases ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_append_empty_events_is_noop(pool: PgPool) {
    let repo = PgEventRepository::new(pool);

    let version = repo.append_events("idp1", 0, &[], &[]).await.unwrap();

    assert_eq!(version, 0);
    assert!(repo.load_events("idp1", "org1").await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires PostgreSQL"]
async fn test_push_exceeding_timeout_has_unknown_outcome(pool: PgPool) {
    let repo = PgEventRepository::new(pool).with_push_timeout(Duration::ZERO);

    let result = repo
        .append_events("idp1", 0, &[make_stored_event("idp1", 1)], &[])
        .await;

    assert!(matches!(result, Err(DomainError::OutcomeUnknown(_))));
}
