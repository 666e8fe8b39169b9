//! Aggregate roots for the Identity Provider context.

use chrono::{DateTime, Utc};
use gatehouse_core::aggregate::AggregateRoot;
use gatehouse_core::changes::{self, FieldChange, FieldValue};
use gatehouse_core::crypto::CryptoValue;
use gatehouse_core::details::ObjectDetails;

use super::events::{IdpEvent, IdpEventKind};
use super::ldap::{LDAP_FIELDS, LdapConfig, PASSWORD_FIELD};
use super::oidc::{CLIENT_SECRET_FIELD, OIDC_FIELDS, OidcConfig};

/// Lifecycle of a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderState {
    /// No event has been applied.
    #[default]
    Unspecified,
    /// Added and not removed.
    Active,
    /// Removed; the stream stays but the provider no longer exists.
    Removed,
}

/// Reduced LDAP provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapProviderState {
    /// Non-secret configuration.
    pub config: LdapConfig,
    /// Sealed bind password.
    pub password: Option<CryptoValue>,
}

/// Reduced OIDC provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OidcProviderState {
    /// Non-secret configuration.
    pub config: OidcConfig,
    /// Sealed client secret.
    pub client_secret: Option<CryptoValue>,
}

impl LdapProviderState {
    fn apply_change(&mut self, change: &FieldChange) {
        match (change.field.as_str(), &change.value) {
            (PASSWORD_FIELD, FieldValue::Secret(sealed)) => self.password = Some(sealed.clone()),
            _ => {
                changes::apply(LDAP_FIELDS, &mut self.config, change);
            }
        }
    }
}

impl OidcProviderState {
    fn apply_change(&mut self, change: &FieldChange) {
        match (change.field.as_str(), &change.value) {
            (CLIENT_SECRET_FIELD, FieldValue::Secret(sealed)) => {
                self.client_secret = Some(sealed.clone());
            }
            _ => {
                changes::apply(OIDC_FIELDS, &mut self.config, change);
            }
        }
    }
}

/// Type-specific configuration of a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// An LDAP directory.
    Ldap(LdapProviderState),
    /// An OIDC issuer.
    Oidc(OidcProviderState),
}

impl ProviderConfig {
    /// The provider's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ldap(ldap) => &ldap.config.name,
            Self::Oidc(oidc) => &oidc.config.name,
        }
    }

    /// Short type tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ldap(_) => "ldap",
            Self::Oidc(_) => "oidc",
        }
    }
}

/// The aggregate root for one configured identity provider.
///
/// Only [`AggregateRoot::apply`] produces new state; handlers read it and
/// emit events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProvider {
    id: String,
    resource_owner: String,
    version: i64,
    state: ProviderState,
    config: Option<ProviderConfig>,
    changed_at: Option<DateTime<Utc>>,
}

impl IdentityProvider {
    /// An empty provider with no history.
    #[must_use]
    pub fn new(id: &str, resource_owner: &str) -> Self {
        Self {
            id: id.to_owned(),
            resource_owner: resource_owner.to_owned(),
            version: 0,
            state: ProviderState::Unspecified,
            config: None,
            changed_at: None,
        }
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> ProviderState {
        self.state
    }

    /// Whether the provider exists and has not been removed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ProviderState::Active
    }

    /// Type-specific configuration, once added.
    #[must_use]
    pub fn config(&self) -> Option<&ProviderConfig> {
        self.config.as_ref()
    }

    /// Timestamp of the newest applied event.
    #[must_use]
    pub fn changed_at(&self) -> Option<DateTime<Utc>> {
        self.changed_at
    }

    /// Raises the version to `sequence_number` when the stream holds events
    /// that were not applied.
    #[must_use]
    pub(crate) fn observed_through(mut self, sequence_number: i64) -> Self {
        self.version = self.version.max(sequence_number);
        self
    }

    /// Object metadata at the current version.
    #[must_use]
    pub fn details(&self) -> ObjectDetails {
        ObjectDetails {
            resource_owner: self.resource_owner.clone(),
            sequence: self.version,
            change_date: self.changed_at,
        }
    }
}

impl AggregateRoot for IdentityProvider {
    type Event = IdpEvent;

    fn aggregate_id(&self) -> &str {
        &self.id
    }

    fn resource_owner(&self) -> &str {
        &self.resource_owner
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(mut self, event: &IdpEvent) -> Self {
        self.version = event.metadata.sequence_number;
        self.changed_at = Some(event.metadata.occurred_at);

        match &event.kind {
            IdpEventKind::LdapProviderAdded(added) => {
                self.config = Some(ProviderConfig::Ldap(LdapProviderState {
                    config: added.config.clone(),
                    password: Some(added.password.clone()),
                }));
                self.state = ProviderState::Active;
            }
            IdpEventKind::OidcProviderAdded(added) => {
                self.config = Some(ProviderConfig::Oidc(OidcProviderState {
                    config: added.config.clone(),
                    client_secret: Some(added.client_secret.clone()),
                }));
                self.state = ProviderState::Active;
            }
            // Skipped when the stream holds another provider type.
            IdpEventKind::LdapProviderChanged(changed) => {
                if let Some(ProviderConfig::Ldap(ldap)) = &mut self.config {
                    for change in &changed.changes {
                        ldap.apply_change(change);
                    }
                }
            }
            IdpEventKind::OidcProviderChanged(changed) => {
                if let Some(ProviderConfig::Oidc(oidc)) = &mut self.config {
                    for change in &changed.changes {
                        oidc.apply_change(change);
                    }
                }
            }
            IdpEventKind::ProviderRemoved(_) => {
                self.state = ProviderState::Removed;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use gatehouse_core::aggregate::reduce;
    use gatehouse_core::event::EventMetadata;
    use uuid::Uuid;

    use super::*;
    use crate::domain::events::{
        AGGREGATE_TYPE, LdapProviderAdded, LdapProviderChanged, OidcProviderChanged,
        ProviderRemoved,
    };
    use crate::domain::ldap::{LdapAttributesInput, LdapProvider};
    use crate::domain::options::IdpOptionsInput;

    fn event(sequence_number: i64, kind: IdpEventKind) -> IdpEvent {
        IdpEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: String::new(),
                aggregate_id: "idp1".into(),
                aggregate_type: AGGREGATE_TYPE.into(),
                resource_owner: "org1".into(),
                sequence_number,
                correlation_id: Uuid::nil(),
                causation_id: Uuid::nil(),
                creator: "admin".into(),
                occurred_at: Utc
                    .with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
                    .unwrap()
                    + chrono::Duration::seconds(sequence_number),
            },
            kind,
        }
    }

    fn sealed(tag: &str) -> CryptoValue {
        CryptoValue {
            algorithm: "enc".into(),
            key_id: "id".into(),
            crypted: tag.as_bytes().to_vec(),
        }
    }

    fn config_a() -> LdapConfig {
        LdapConfig {
            name: "corp".into(),
            host: "ldap.example.com".into(),
            port: "389".into(),
            base_dn: "dc=example,dc=com".into(),
            user_object_class: "person".into(),
            user_unique_attribute: "uid".into(),
            admin: "cn=admin".into(),
            ..LdapConfig::default()
        }
    }

    fn added(config: LdapConfig) -> IdpEvent {
        event(
            1,
            IdpEventKind::LdapProviderAdded(LdapProviderAdded {
                id: "idp1".into(),
                config,
                password: sealed("pw1"),
            }),
        )
    }

    #[test]
    fn test_added_event_initializes_every_field() {
        // Act
        let provider = reduce(IdentityProvider::new("idp1", "org1"), &[added(config_a())]);

        // Assert
        assert!(provider.is_active());
        assert_eq!(provider.version(), 1);
        assert_eq!(
            provider.config(),
            Some(&ProviderConfig::Ldap(LdapProviderState {
                config: config_a(),
                password: Some(sealed("pw1")),
            }))
        );
        assert_eq!(provider.details().sequence, 1);
        assert_eq!(provider.details().resource_owner, "org1");
    }

    #[test]
    fn test_reducing_added_then_diff_equals_target_config() {
        // Arrange
        let desired = LdapProvider {
            name: "corp2".into(),
            host: "ldap2.example.com".into(),
            port: None,
            tls: Some(true),
            base_dn: "dc=example,dc=com".into(),
            user_object_class: "person".into(),
            user_unique_attribute: "uid".into(),
            admin: "cn=admin".into(),
            password: None,
            attributes: LdapAttributesInput {
                email_attribute: Some("mail".into()),
                ..LdapAttributesInput::default()
            },
            options: IdpOptionsInput {
                is_linking_allowed: Some(true),
                ..IdpOptionsInput::default()
            },
        };
        let diff = changes::diff(LDAP_FIELDS, &config_a(), &desired);
        let history = [
            added(config_a()),
            event(
                2,
                IdpEventKind::LdapProviderChanged(LdapProviderChanged {
                    id: "idp1".into(),
                    changes: diff,
                }),
            ),
        ];

        // Act
        let provider = reduce(IdentityProvider::new("idp1", "org1"), &history);

        // Assert
        let mut expected = config_a();
        expected.name = "corp2".into();
        expected.host = "ldap2.example.com".into();
        expected.tls = true;
        expected.attributes.email_attribute = "mail".into();
        expected.options.is_linking_allowed = true;
        match provider.config() {
            Some(ProviderConfig::Ldap(ldap)) => {
                assert_eq!(ldap.config, expected);
                assert_eq!(ldap.password, Some(sealed("pw1")));
            }
            other => panic!("expected ldap config, got {other:?}"),
        }
        assert_eq!(provider.version(), 2);
    }

    #[test]
    fn test_replaying_history_twice_yields_identical_state() {
        let history = [
            added(config_a()),
            event(
                2,
                IdpEventKind::LdapProviderChanged(LdapProviderChanged {
                    id: "idp1".into(),
                    changes: vec![FieldChange::new(
                        PASSWORD_FIELD,
                        FieldValue::Secret(sealed("pw2")),
                    )],
                }),
            ),
        ];

        let first = reduce(IdentityProvider::new("idp1", "org1"), &history);
        let second = reduce(IdentityProvider::new("idp1", "org1"), &history);

        assert_eq!(first, second);
        match first.config() {
            Some(ProviderConfig::Ldap(ldap)) => assert_eq!(ldap.password, Some(sealed("pw2"))),
            other => panic!("expected ldap config, got {other:?}"),
        }
    }

    #[test]
    fn test_change_for_another_provider_type_is_ignored() {
        let history = [
            added(config_a()),
            event(
                2,
                IdpEventKind::OidcProviderChanged(OidcProviderChanged {
                    id: "idp1".into(),
                    changes: vec![FieldChange::new("name", FieldValue::Text("x".into()))],
                }),
            ),
        ];

        let provider = reduce(IdentityProvider::new("idp1", "org1"), &history);

        assert_eq!(provider.config().map(ProviderConfig::name), Some("corp"));
        assert_eq!(provider.version(), 2);
    }

    #[test]
    fn test_removed_event_deactivates_provider() {
        let history = [
            added(config_a()),
            event(
                2,
                IdpEventKind::ProviderRemoved(ProviderRemoved {
                    id: "idp1".into(),
                    name: "corp".into(),
                }),
            ),
        ];

        let provider = reduce(IdentityProvider::new("idp1", "org1"), &history);

        assert_eq!(provider.state(), ProviderState::Removed);
        assert!(!provider.is_active());
        assert_eq!(provider.changed_at(), Some(history[1].metadata.occurred_at));
    }
}
