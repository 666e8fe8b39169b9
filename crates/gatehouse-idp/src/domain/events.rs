//! Domain events for the Identity Provider context.

use gatehouse_core::changes::FieldChange;
use gatehouse_core::clock::Clock;
use gatehouse_core::command::Command;
use gatehouse_core::crypto::CryptoValue;
use gatehouse_core::error::DomainError;
use gatehouse_core::event::{DomainEvent, EventMetadata};
use gatehouse_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::ldap::LdapConfig;
use super::oidc::OidcConfig;

/// Aggregate type recorded on every identity-provider event.
pub const AGGREGATE_TYPE: &str = "org.idp";

/// Event type for `LdapProviderAdded`.
pub const LDAP_PROVIDER_ADDED_EVENT_TYPE: &str = "org.idp.ldap.added";
/// Event type for `LdapProviderChanged`.
pub const LDAP_PROVIDER_CHANGED_EVENT_TYPE: &str = "org.idp.ldap.changed";
/// Event type for `OidcProviderAdded`.
pub const OIDC_PROVIDER_ADDED_EVENT_TYPE: &str = "org.idp.oidc.added";
/// Event type for `OidcProviderChanged`.
pub const OIDC_PROVIDER_CHANGED_EVENT_TYPE: &str = "org.idp.oidc.changed";
/// Event type for `ProviderRemoved`.
pub const PROVIDER_REMOVED_EVENT_TYPE: &str = "org.idp.removed";

/// Emitted when an LDAP provider is configured. Carries the full
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapProviderAdded {
    /// The provider identifier.
    pub id: String,
    /// Every non-secret field, defaults included.
    #[serde(flatten)]
    pub config: LdapConfig,
    /// The sealed bind password.
    pub password: CryptoValue,
}

/// Emitted when fields of an LDAP provider change. Carries only the
/// changed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapProviderChanged {
    /// The provider identifier.
    pub id: String,
    /// One directive per changed field.
    pub changes: Vec<FieldChange>,
}

/// Emitted when an OIDC provider is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcProviderAdded {
    /// The provider identifier.
    pub id: String,
    /// Every non-secret field, defaults included.
    #[serde(flatten)]
    pub config: OidcConfig,
    /// The sealed client secret.
    pub client_secret: CryptoValue,
}

/// Emitted when fields of an OIDC provider change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcProviderChanged {
    /// The provider identifier.
    pub id: String,
    /// One directive per changed field.
    pub changes: Vec<FieldChange>,
}

/// Emitted when a provider is removed. Its name is released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRemoved {
    /// The provider identifier.
    pub id: String,
    /// The name the provider held.
    pub name: String,
}

/// Event payload variants for the Identity Provider context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdpEventKind {
    /// An LDAP provider has been added.
    LdapProviderAdded(LdapProviderAdded),
    /// An LDAP provider has changed.
    LdapProviderChanged(LdapProviderChanged),
    /// An OIDC provider has been added.
    OidcProviderAdded(OidcProviderAdded),
    /// An OIDC provider has changed.
    OidcProviderChanged(OidcProviderChanged),
    /// A provider has been removed.
    ProviderRemoved(ProviderRemoved),
}

/// Domain event envelope for the Identity Provider context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: IdpEventKind,
}

impl IdpEvent {
    /// Builds the event `command` causes at `sequence_number` of the stream.
    pub fn new<C: Command>(
        command: &C,
        aggregate_id: &str,
        sequence_number: i64,
        clock: &dyn Clock,
        kind: IdpEventKind,
    ) -> Self {
        Self {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: event_type_of(&kind).to_owned(),
                aggregate_id: aggregate_id.to_owned(),
                aggregate_type: AGGREGATE_TYPE.to_owned(),
                resource_owner: command.resource_owner().to_owned(),
                sequence_number,
                correlation_id: command.correlation_id(),
                causation_id: command.correlation_id(),
                creator: command.actor().to_owned(),
                occurred_at: clock.now(),
            },
            kind,
        }
    }

    /// Decodes a stored event, routing on its event type.
    ///
    /// Returns `Ok(None)` for event types this context does not know.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a known payload is malformed.
    pub fn from_stored(stored: &StoredEvent) -> Result<Option<Self>, DomainError> {
        let kind = match stored.event_type.as_str() {
            LDAP_PROVIDER_ADDED_EVENT_TYPE => IdpEventKind::LdapProviderAdded(decode(stored)?),
            LDAP_PROVIDER_CHANGED_EVENT_TYPE => {
                IdpEventKind::LdapProviderChanged(decode(stored)?)
            }
            OIDC_PROVIDER_ADDED_EVENT_TYPE => IdpEventKind::OidcProviderAdded(decode(stored)?),
            OIDC_PROVIDER_CHANGED_EVENT_TYPE => {
                IdpEventKind::OidcProviderChanged(decode(stored)?)
            }
            PROVIDER_REMOVED_EVENT_TYPE => IdpEventKind::ProviderRemoved(decode(stored)?),
            _ => return Ok(None),
        };
        Ok(Some(Self {
            metadata: EventMetadata::from_stored(stored),
            kind,
        }))
    }
}

fn decode<T: DeserializeOwned>(stored: &StoredEvent) -> Result<T, DomainError> {
    serde_json::from_value(stored.payload.clone()).map_err(|e| {
        DomainError::Infrastructure(format!(
            "event deserialization failed for {} #{}: {e}",
            stored.aggregate_id, stored.sequence_number
        ))
    })
}

fn event_type_of(kind: &IdpEventKind) -> &'static str {
    match kind {
        IdpEventKind::LdapProviderAdded(_) => LDAP_PROVIDER_ADDED_EVENT_TYPE,
        IdpEventKind::LdapProviderChanged(_) => LDAP_PROVIDER_CHANGED_EVENT_TYPE,
        IdpEventKind::OidcProviderAdded(_) => OIDC_PROVIDER_ADDED_EVENT_TYPE,
        IdpEventKind::OidcProviderChanged(_) => OIDC_PROVIDER_CHANGED_EVENT_TYPE,
        IdpEventKind::ProviderRemoved(_) => PROVIDER_REMOVED_EVENT_TYPE,
    }
}

impl DomainEvent for IdpEvent {
    fn event_type(&self) -> &'static str {
        event_type_of(&self.kind)
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        let encoded = match &self.kind {
            IdpEventKind::LdapProviderAdded(e) => serde_json::to_value(e),
            IdpEventKind::LdapProviderChanged(e) => serde_json::to_value(e),
            IdpEventKind::OidcProviderAdded(e) => serde_json::to_value(e),
            IdpEventKind::OidcProviderChanged(e) => serde_json::to_value(e),
            IdpEventKind::ProviderRemoved(e) => serde_json::to_value(e),
        };
        encoded.map_err(|e| DomainError::Infrastructure(format!("event serialization failed: {e}")))
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use gatehouse_core::changes::FieldValue;

    use super::*;

    fn envelope(kind: IdpEventKind) -> IdpEvent {
        IdpEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: event_type_of(&kind).to_owned(),
                aggregate_id: "idp1".into(),
                aggregate_type: AGGREGATE_TYPE.into(),
                resource_owner: "org1".into(),
                sequence_number: 2,
                correlation_id: Uuid::new_v4(),
                causation_id: Uuid::new_v4(),
                creator: "admin".into(),
                occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            },
            kind,
        }
    }

    #[test]
    fn test_changed_event_payload_carries_only_directives() {
        // Arrange
        let event = envelope(IdpEventKind::LdapProviderChanged(LdapProviderChanged {
            id: "idp1".into(),
            changes: vec![FieldChange::new("tls", FieldValue::Flag(true))],
        }));

        // Act
        let stored = event.to_stored().unwrap();

        // Assert
        assert_eq!(stored.event_type, LDAP_PROVIDER_CHANGED_EVENT_TYPE);
        assert_eq!(stored.aggregate_type, AGGREGATE_TYPE);
        assert_eq!(stored.creator, "admin");
        assert_eq!(
            stored.payload,
            serde_json::json!({
                "id": "idp1",
                "changes": [{ "field": "tls", "value": { "kind": "flag", "value": true } }]
            })
        );
    }

    #[test]
    fn test_from_stored_decodes_what_to_stored_wrote() {
        let event = envelope(IdpEventKind::ProviderRemoved(ProviderRemoved {
            id: "idp1".into(),
            name: "corp".into(),
        }));

        let decoded = IdpEvent::from_stored(&event.to_stored().unwrap()).unwrap();

        assert_eq!(decoded, Some(event));
    }

    #[test]
    fn test_from_stored_skips_unknown_event_types() {
        let mut stored = envelope(IdpEventKind::ProviderRemoved(ProviderRemoved {
            id: "idp1".into(),
            name: "corp".into(),
        }))
        .to_stored()
        .unwrap();
        stored.event_type = "org.idp.saml.added".into();

        assert_eq!(IdpEvent::from_stored(&stored).unwrap(), None);
    }

    #[test]
    fn test_from_stored_rejects_malformed_payload() {
        let mut stored = envelope(IdpEventKind::ProviderRemoved(ProviderRemoved {
            id: "idp1".into(),
            name: "corp".into(),
        }))
        .to_stored()
        .unwrap();
        stored.payload = serde_json::json!({ "id": 7 });

        assert!(matches!(
            IdpEvent::from_stored(&stored),
            Err(DomainError::Infrastructure(_))
        ));
    }
}
