//! Command handlers for the Identity Provider context.
//!
//! Each handler validates its command, replays the provider's history where
//! it needs current state, turns the difference between desired and current
//! state into events, and pushes those events together with their name
//! constraints in one append guarded by the version it observed.

use gatehouse_core::aggregate::{AggregateRoot, reduce};
use gatehouse_core::changes::{self, FieldChange, FieldValue};
use gatehouse_core::clock::Clock;
use gatehouse_core::crypto::SecretCipher;
use gatehouse_core::details::ObjectDetails;
use gatehouse_core::error::DomainError;
use gatehouse_core::event::DomainEvent;
use gatehouse_core::id::IdGenerator;
use gatehouse_core::repository::{EventRepository, StoredEvent};
use gatehouse_core::unique::UniqueConstraint;
use tracing::{debug, info, instrument, warn};

use crate::domain::aggregates::{IdentityProvider, ProviderConfig};
use crate::domain::commands::{
    AddLdapProvider, AddOidcProvider, RemoveProvider, UpdateLdapProvider, UpdateOidcProvider,
};
use crate::domain::constraints;
use crate::domain::events::{
    IdpEvent, IdpEventKind, LdapProviderAdded, LdapProviderChanged, OidcProviderAdded,
    OidcProviderChanged, ProviderRemoved,
};
use crate::domain::ldap::{LDAP_FIELDS, PASSWORD_FIELD};
use crate::domain::oidc::{CLIENT_SECRET_FIELD, OIDC_FIELDS};
use crate::domain::require;

/// Outcome of a provider command.
#[derive(Debug)]
pub struct IdpCommandResult {
    /// The provider the command addressed.
    pub aggregate_id: String,
    /// Object metadata after the command.
    pub details: ObjectDetails,
    /// Events appended; empty when nothing changed.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes an `IdentityProvider` from stored events. Event types this
/// context does not know are skipped but still count towards the version.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    aggregate_id: &str,
    resource_owner: &str,
    existing_events: &[StoredEvent],
) -> Result<IdentityProvider, DomainError> {
    let mut events = Vec::with_capacity(existing_events.len());
    for stored in existing_events {
        if let Some(event) = IdpEvent::from_stored(stored)? {
            events.push(event);
        }
    }
    let last_sequence = existing_events
        .last()
        .map_or(0, |stored| stored.sequence_number);
    Ok(reduce(
        IdentityProvider::new(aggregate_id, resource_owner),
        &events,
    )
    .observed_through(last_sequence))
}

/// Loads and replays a provider that exists and has not been removed.
pub(crate) async fn load_active(
    aggregate_id: &str,
    resource_owner: &str,
    repo: &dyn EventRepository,
) -> Result<IdentityProvider, DomainError> {
    let existing_events = repo.load_events(aggregate_id, resource_owner).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(aggregate_id.to_owned()));
    }
    let provider = reconstitute(aggregate_id, resource_owner, &existing_events)?;
    if !provider.is_active() {
        return Err(DomainError::AggregateNotFound(aggregate_id.to_owned()));
    }
    Ok(provider)
}

async fn persist(
    aggregate_id: &str,
    resource_owner: &str,
    expected_version: i64,
    event: &IdpEvent,
    constraints: &[UniqueConstraint],
    repo: &dyn EventRepository,
) -> Result<IdpCommandResult, DomainError> {
    let stored_events = vec![event.to_stored()?];

    let version = repo
        .append_events(aggregate_id, expected_version, &stored_events, constraints)
        .await
        .inspect_err(|e| match e {
            DomainError::ConcurrencyConflict { .. } | DomainError::AlreadyExists(_) => {
                warn!(error = %e, retryable = e.is_retryable(), "push rejected");
            }
            DomainError::OutcomeUnknown(_) => {
                warn!(error = %e, "push outcome unknown");
            }
            _ => {}
        })?;

    info!(
        event_type = event.event_type(),
        version, "provider events appended"
    );

    Ok(IdpCommandResult {
        aggregate_id: aggregate_id.to_owned(),
        details: ObjectDetails {
            resource_owner: resource_owner.to_owned(),
            sequence: version,
            change_date: Some(event.metadata.occurred_at),
        },
        stored_events,
    })
}

fn unchanged(provider: &IdentityProvider) -> IdpCommandResult {
    debug!(version = provider.version(), "no changes; nothing pushed");
    IdpCommandResult {
        aggregate_id: provider.aggregate_id().to_owned(),
        details: provider.details(),
        stored_events: Vec::new(),
    }
}

fn seal(
    cipher: &dyn SecretCipher,
    field: &str,
    plaintext: &str,
) -> Result<FieldChange, DomainError> {
    let sealed = cipher.encrypt(plaintext.as_bytes())?;
    Ok(FieldChange::new(field, FieldValue::Secret(sealed)))
}

/// Handles the `AddLdapProvider` command: validates the configuration, seals
/// the bind password and pushes one added event that claims the name.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` before any ID is generated if a
/// required field is blank, `DomainError::AlreadyExists` if the name is taken
/// in the organization, or the ID generator's, cipher's or log's error.
#[instrument(skip_all, fields(resource_owner = %command.resource_owner, aggregate_id = tracing::field::Empty))]
pub async fn handle_add_ldap_provider(
    command: &AddLdapProvider,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
    cipher: &dyn SecretCipher,
    repo: &dyn EventRepository,
) -> Result<IdpCommandResult, DomainError> {
    let provider = &command.provider;
    provider.validate_for_add()?;

    let aggregate_id = ids.next_id()?;
    tracing::Span::current().record("aggregate_id", aggregate_id.as_str());

    let password = cipher.encrypt(provider.password.as_deref().unwrap_or_default().as_bytes())?;
    let event = IdpEvent::new(
        command,
        &aggregate_id,
        1,
        clock,
        IdpEventKind::LdapProviderAdded(LdapProviderAdded {
            id: aggregate_id.clone(),
            config: changes::build(LDAP_FIELDS, provider),
            password,
        }),
    );
    let claim = constraints::claim_name(&command.resource_owner, &provider.name);

    persist(
        &aggregate_id,
        &command.resource_owner,
        0,
        &event,
        &[claim],
        repo,
    )
    .await
}

/// Handles the `UpdateLdapProvider` command: replays the provider, diffs the
/// desired configuration against it and pushes one changed event carrying
/// only the differing fields. Nothing is pushed when nothing differs.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for a blank id or required field,
/// `DomainError::AggregateNotFound` if no active LDAP provider has the id,
/// `DomainError::AlreadyExists` if the new name is taken,
/// `DomainError::ConcurrencyConflict` if the provider changed meanwhile, or
/// the cipher's or log's error.
#[instrument(skip_all, fields(resource_owner = %command.resource_owner, aggregate_id = %command.id))]
pub async fn handle_update_ldap_provider(
    command: &UpdateLdapProvider,
    clock: &dyn Clock,
    cipher: &dyn SecretCipher,
    repo: &dyn EventRepository,
) -> Result<IdpCommandResult, DomainError> {
    require("id", &command.id)?;
    command.provider.validate_for_update()?;

    let provider = load_active(&command.id, &command.resource_owner, repo).await?;
    let Some(ProviderConfig::Ldap(current)) = provider.config() else {
        return Err(DomainError::AggregateNotFound(command.id.clone()));
    };

    let mut change_set = changes::diff(LDAP_FIELDS, &current.config, &command.provider);
    if let Some(password) = command.provider.new_password() {
        change_set.push(seal(cipher, PASSWORD_FIELD, password)?);
    }
    if change_set.is_empty() {
        return Ok(unchanged(&provider));
    }

    let renames = constraints::rename(
        &command.resource_owner,
        &current.config.name,
        &command.provider.name,
    );
    let event = IdpEvent::new(
        command,
        &command.id,
        provider.version() + 1,
        clock,
        IdpEventKind::LdapProviderChanged(LdapProviderChanged {
            id: command.id.clone(),
            changes: change_set,
        }),
    );

    persist(
        &command.id,
        &command.resource_owner,
        provider.version(),
        &event,
        &renames,
        repo,
    )
    .await
}

/// Handles the `AddOidcProvider` command.
///
/// # Errors
///
/// Same as [`handle_add_ldap_provider`], with the client secret in place of
/// the bind password.
#[instrument(skip_all, fields(resource_owner = %command.resource_owner, aggregate_id = tracing::field::Empty))]
pub async fn handle_add_oidc_provider(
    command: &AddOidcProvider,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
    cipher: &dyn SecretCipher,
    repo: &dyn EventRepository,
) -> Result<IdpCommandResult, DomainError> {
    let provider = &command.provider;
    provider.validate_for_add()?;

    let aggregate_id = ids.next_id()?;
    tracing::Span::current().record("aggregate_id", aggregate_id.as_str());

    let client_secret = cipher.encrypt(
        provider
            .client_secret
            .as_deref()
            .unwrap_or_default()
            .as_bytes(),
    )?;
    let event = IdpEvent::new(
        command,
        &aggregate_id,
        1,
        clock,
        IdpEventKind::OidcProviderAdded(OidcProviderAdded {
            id: aggregate_id.clone(),
            config: changes::build(OIDC_FIELDS, provider),
            client_secret,
        }),
    );
    let claim = constraints::claim_name(&command.resource_owner, &provider.name);

    persist(
        &aggregate_id,
        &command.resource_owner,
        0,
        &event,
        &[claim],
        repo,
    )
    .await
}

/// Handles the `UpdateOidcProvider` command.
///
/// # Errors
///
/// Same as [`handle_update_ldap_provider`].
#[instrument(skip_all, fields(resource_owner = %command.resource_owner, aggregate_id = %command.id))]
pub async fn handle_update_oidc_provider(
    command: &UpdateOidcProvider,
    clock: &dyn Clock,
    cipher: &dyn SecretCipher,
    repo: &dyn EventRepository,
) -> Result<IdpCommandResult, DomainError> {
    require("id", &command.id)?;
    command.provider.validate_for_update()?;

    let provider = load_active(&command.id, &command.resource_owner, repo).await?;
    let Some(ProviderConfig::Oidc(current)) = provider.config() else {
        return Err(DomainError::AggregateNotFound(command.id.clone()));
    };

    let mut change_set = changes::diff(OIDC_FIELDS, &current.config, &command.provider);
    if let Some(secret) = command.provider.new_client_secret() {
        change_set.push(seal(cipher, CLIENT_SECRET_FIELD, secret)?);
    }
    if change_set.is_empty() {
        return Ok(unchanged(&provider));
    }

    let renames = constraints::rename(
        &command.resource_owner,
        &current.config.name,
        &command.provider.name,
    );
    let event = IdpEvent::new(
        command,
        &command.id,
        provider.version() + 1,
        clock,
        IdpEventKind::OidcProviderChanged(OidcProviderChanged {
            id: command.id.clone(),
            changes: change_set,
        }),
    );

    persist(
        &command.id,
        &command.resource_owner,
        provider.version(),
        &event,
        &renames,
        repo,
    )
    .await
}

/// Handles the `RemoveProvider` command: pushes a removed event and releases
/// the provider's name.
///
/// # Errors
///
/// Returns `DomainError::InvalidArgument` for a blank id,
/// `DomainError::AggregateNotFound` if no active provider has the id,
/// `DomainError::ConcurrencyConflict` if the provider changed meanwhile, or
/// the log's error.
#[instrument(skip_all, fields(resource_owner = %command.resource_owner, aggregate_id = %command.id))]
pub async fn handle_remove_provider(
    command: &RemoveProvider,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<IdpCommandResult, DomainError> {
    require("id", &command.id)?;

    let provider = load_active(&command.id, &command.resource_owner, repo).await?;
    let name = provider
        .config()
        .map(ProviderConfig::name)
        .unwrap_or_default()
        .to_owned();

    let release = constraints::release_name(&command.resource_owner, &name);
    let event = IdpEvent::new(
        command,
        &command.id,
        provider.version() + 1,
        clock,
        IdpEventKind::ProviderRemoved(ProviderRemoved {
            id: command.id.clone(),
            name,
        }),
    );

    persist(
        &command.id,
        &command.resource_owner,
        provider.version(),
        &event,
        &[release],
        repo,
    )
    .await
}
