//! Query handlers for the Identity Provider context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use chrono::{DateTime, Utc};
use gatehouse_core::aggregate::AggregateRoot;
use gatehouse_core::crypto::CryptoValue;
use gatehouse_core::error::DomainError;
use gatehouse_core::repository::EventRepository;
use serde::Serialize;

use crate::application::command_handlers;
use crate::domain::aggregates::ProviderConfig;
use crate::domain::ldap::LdapConfig;
use crate::domain::oidc::OidcConfig;

/// How a secret was sealed. The ciphertext itself is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretView {
    /// Sealing algorithm.
    pub algorithm: String,
    /// Key the secret was sealed under.
    pub key_id: String,
}

impl From<&CryptoValue> for SecretView {
    fn from(value: &CryptoValue) -> Self {
        Self {
            algorithm: value.algorithm.clone(),
            key_id: value.key_id.clone(),
        }
    }
}

/// Type-specific part of a provider view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProviderConfigView {
    /// An LDAP directory.
    #[serde(rename_all = "camelCase")]
    Ldap {
        /// Non-secret configuration.
        #[serde(flatten)]
        config: LdapConfig,
        /// Bind password envelope metadata.
        password: Option<SecretView>,
    },
    /// An OIDC issuer.
    #[serde(rename_all = "camelCase")]
    Oidc {
        /// Non-secret configuration.
        #[serde(flatten)]
        config: OidcConfig,
        /// Client secret envelope metadata.
        client_secret: Option<SecretView>,
    },
}

/// Read-only view of an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    /// The provider identifier.
    pub id: String,
    /// The owning organization.
    pub resource_owner: String,
    /// Current version (event count).
    pub sequence: i64,
    /// Timestamp of the newest event.
    pub change_date: Option<DateTime<Utc>>,
    /// Type-specific configuration.
    #[serde(flatten)]
    pub config: ProviderConfigView,
}

/// Retrieves an active provider by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID or
/// the provider was removed.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_provider_by_id(
    aggregate_id: &str,
    resource_owner: &str,
    repo: &dyn EventRepository,
) -> Result<ProviderView, DomainError> {
    let provider = command_handlers::load_active(aggregate_id, resource_owner, repo).await?;
    let config = match provider.config() {
        Some(ProviderConfig::Ldap(ldap)) => ProviderConfigView::Ldap {
            config: ldap.config.clone(),
            password: ldap.password.as_ref().map(SecretView::from),
        },
        Some(ProviderConfig::Oidc(oidc)) => ProviderConfigView::Oidc {
            config: oidc.config.clone(),
            client_secret: oidc.client_secret.as_ref().map(SecretView::from),
        },
        None => return Err(DomainError::AggregateNotFound(aggregate_id.to_owned())),
    };
    Ok(ProviderView {
        id: provider.aggregate_id().to_owned(),
        resource_owner: provider.resource_owner().to_owned(),
        sequence: provider.version(),
        change_date: provider.changed_at(),
        config,
    })
}
