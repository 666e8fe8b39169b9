//! OIDC provider configuration.

use std::fmt;

use gatehouse_core::changes::FieldSpec;
use gatehouse_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::options::{IdpOptions, IdpOptionsInput};
use super::{optional_flag, optional_list, require, required_text, supplied};

/// Payload name of the encrypted client secret.
pub const CLIENT_SECRET_FIELD: &str = "clientSecret";

/// The non-secret part of a reduced OIDC provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OidcConfig {
    pub name: String,
    pub issuer: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    /// Read user claims from the ID token instead of the userinfo endpoint.
    pub is_id_token_mapping: bool,
    #[serde(flatten)]
    pub options: IdpOptions,
}

/// Desired OIDC configuration with the client secret in plaintext.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OidcProvider {
    pub name: String,
    pub issuer: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub is_id_token_mapping: Option<bool>,
    #[serde(flatten)]
    pub options: IdpOptionsInput,
}

impl fmt::Debug for OidcProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OidcProvider")
            .field("name", &self.name)
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("scopes", &self.scopes)
            .field("is_id_token_mapping", &self.is_id_token_mapping)
            .field("options", &self.options)
            .finish()
    }
}

impl OidcProvider {
    /// Checks name, issuer, client id and client secret, in that order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` naming the first blank field.
    pub fn validate_for_add(&self) -> Result<(), DomainError> {
        self.validate_required()?;
        require(
            "clientSecret",
            self.client_secret.as_deref().unwrap_or_default(),
        )
    }

    /// Checks name, issuer and client id. An omitted secret is kept.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` naming the first blank field.
    pub fn validate_for_update(&self) -> Result<(), DomainError> {
        self.validate_required()
    }

    /// The plaintext client secret, if the caller supplied a non-blank one.
    #[must_use]
    pub fn new_client_secret(&self) -> Option<&str> {
        supplied(self.client_secret.as_deref())
    }

    fn validate_required(&self) -> Result<(), DomainError> {
        require("name", &self.name)?;
        require("issuer", &self.issuer)?;
        require("clientId", &self.client_id)
    }
}

/// Mutable OIDC fields in payload order.
pub static OIDC_FIELDS: &[FieldSpec<OidcConfig, OidcProvider>] = &[
    required_text!("name", name),
    required_text!("issuer", issuer),
    required_text!("clientId", client_id),
    optional_list!("scopes", scopes),
    optional_flag!("isIdTokenMapping", is_id_token_mapping),
    optional_flag!("isCreationAllowed", options.is_creation_allowed),
    optional_flag!("isLinkingAllowed", options.is_linking_allowed),
    optional_flag!("isAutoCreation", options.is_auto_creation),
    optional_flag!("isAutoUpdate", options.is_auto_update),
];

#[cfg(test)]
mod tests {
    use gatehouse_core::changes::{self, FieldChange, FieldValue};

    use super::*;

    fn provider() -> OidcProvider {
        OidcProvider {
            name: "google".into(),
            issuer: "https://accounts.google.com".into(),
            client_id: "client".into(),
            client_secret: Some("shh".into()),
            ..OidcProvider::default()
        }
    }

    #[test]
    fn test_validate_for_add_requires_client_secret() {
        let provider = OidcProvider {
            client_secret: None,
            ..provider()
        };

        match provider.validate_for_add() {
            Err(DomainError::InvalidArgument { field, .. }) => assert_eq!(field, "clientSecret"),
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
        assert!(provider.validate_for_update().is_ok());
    }

    #[test]
    fn test_validate_reports_issuer_before_client_id() {
        let provider = OidcProvider {
            issuer: String::new(),
            client_id: String::new(),
            ..provider()
        };

        match provider.validate_for_update() {
            Err(DomainError::InvalidArgument { field, .. }) => assert_eq!(field, "issuer"),
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_scopes_compare_as_ordered_lists() {
        // Arrange
        let mut current = changes::build(OIDC_FIELDS, &provider());
        current.scopes = vec!["openid".into(), "email".into()];
        let desired = OidcProvider {
            scopes: Some(vec!["email".into(), "openid".into()]),
            ..provider()
        };

        // Act
        let diff = changes::diff(OIDC_FIELDS, &current, &desired);

        // Assert
        assert_eq!(
            diff,
            vec![FieldChange::new(
                "scopes",
                FieldValue::List(vec!["email".into(), "openid".into()])
            )]
        );
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let rendered = format!("{:?}", provider());

        assert!(!rendered.contains("shh"));
    }
}
