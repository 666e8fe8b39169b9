//! LDAP provider configuration.

use std::fmt;

use gatehouse_core::changes::FieldSpec;
use gatehouse_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::options::{IdpOptions, IdpOptionsInput};
use super::{optional_flag, optional_text, require, required_text, supplied};

/// Payload name of the encrypted bind password.
pub const PASSWORD_FIELD: &str = "password";

/// Maps identity claims to directory attribute names. Empty means unmapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapAttributes {
    pub id_attribute: String,
    pub first_name_attribute: String,
    pub last_name_attribute: String,
    pub display_name_attribute: String,
    pub nick_name_attribute: String,
    pub preferred_username_attribute: String,
    pub email_attribute: String,
    pub email_verified_attribute: String,
    pub phone_attribute: String,
    pub phone_verified_attribute: String,
    pub preferred_language_attribute: String,
    #[serde(rename = "avatarURLAttribute")]
    pub avatar_url_attribute: String,
    pub profile_attribute: String,
}

/// Requested attribute mappings; `None` leaves a mapping as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapAttributesInput {
    pub id_attribute: Option<String>,
    pub first_name_attribute: Option<String>,
    pub last_name_attribute: Option<String>,
    pub display_name_attribute: Option<String>,
    pub nick_name_attribute: Option<String>,
    pub preferred_username_attribute: Option<String>,
    pub email_attribute: Option<String>,
    pub email_verified_attribute: Option<String>,
    pub phone_attribute: Option<String>,
    pub phone_verified_attribute: Option<String>,
    pub preferred_language_attribute: Option<String>,
    #[serde(rename = "avatarURLAttribute")]
    pub avatar_url_attribute: Option<String>,
    pub profile_attribute: Option<String>,
}

impl LdapAttributesInput {
    /// Requests every mapping explicitly.
    #[must_use]
    pub fn all(attributes: &LdapAttributes) -> Self {
        Self {
            id_attribute: Some(attributes.id_attribute.clone()),
            first_name_attribute: Some(attributes.first_name_attribute.clone()),
            last_name_attribute: Some(attributes.last_name_attribute.clone()),
            display_name_attribute: Some(attributes.display_name_attribute.clone()),
            nick_name_attribute: Some(attributes.nick_name_attribute.clone()),
            preferred_username_attribute: Some(attributes.preferred_username_attribute.clone()),
            email_attribute: Some(attributes.email_attribute.clone()),
            email_verified_attribute: Some(attributes.email_verified_attribute.clone()),
            phone_attribute: Some(attributes.phone_attribute.clone()),
            phone_verified_attribute: Some(attributes.phone_verified_attribute.clone()),
            preferred_language_attribute: Some(attributes.preferred_language_attribute.clone()),
            avatar_url_attribute: Some(attributes.avatar_url_attribute.clone()),
            profile_attribute: Some(attributes.profile_attribute.clone()),
        }
    }
}

/// The non-secret part of a reduced LDAP provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapConfig {
    pub name: String,
    pub host: String,
    pub port: String,
    pub tls: bool,
    #[serde(rename = "baseDN")]
    pub base_dn: String,
    pub user_object_class: String,
    pub user_unique_attribute: String,
    pub admin: String,
    #[serde(flatten)]
    pub attributes: LdapAttributes,
    #[serde(flatten)]
    pub options: IdpOptions,
}

/// Desired LDAP configuration as supplied by a caller, with the bind password
/// in plaintext.
///
/// Required text fields are always compared. Optional fields set to `None`
/// are left out of the comparison on update and take their defaults on add.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LdapProvider {
    pub name: String,
    pub host: String,
    pub port: Option<String>,
    pub tls: Option<bool>,
    #[serde(rename = "baseDN")]
    pub base_dn: String,
    pub user_object_class: String,
    pub user_unique_attribute: String,
    pub admin: String,
    pub password: Option<String>,
    #[serde(flatten)]
    pub attributes: LdapAttributesInput,
    #[serde(flatten)]
    pub options: IdpOptionsInput,
}

impl fmt::Debug for LdapProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapProvider")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("base_dn", &self.base_dn)
            .field("user_object_class", &self.user_object_class)
            .field("user_unique_attribute", &self.user_unique_attribute)
            .field("admin", &self.admin)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("attributes", &self.attributes)
            .field("options", &self.options)
            .finish()
    }
}

impl LdapProvider {
    /// Checks the fields every LDAP provider needs, in a fixed order, and
    /// requires a bind password.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` naming the first blank field.
    pub fn validate_for_add(&self) -> Result<(), DomainError> {
        self.validate_required()?;
        require("password", self.password.as_deref().unwrap_or_default())
    }

    /// Same checks as [`validate_for_add`](Self::validate_for_add) without the
    /// password, which is kept when omitted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidArgument` naming the first blank field.
    pub fn validate_for_update(&self) -> Result<(), DomainError> {
        self.validate_required()
    }

    /// The plaintext password, if the caller supplied a non-blank one.
    #[must_use]
    pub fn new_password(&self) -> Option<&str> {
        supplied(self.password.as_deref())
    }

    fn validate_required(&self) -> Result<(), DomainError> {
        require("name", &self.name)?;
        require("host", &self.host)?;
        require("baseDN", &self.base_dn)?;
        require("userObjectClass", &self.user_object_class)?;
        require("userUniqueAttribute", &self.user_unique_attribute)?;
        require("admin", &self.admin)
    }
}

/// Mutable LDAP fields in payload order. The password is sealed separately.
pub static LDAP_FIELDS: &[FieldSpec<LdapConfig, LdapProvider>] = &[
    required_text!("name", name),
    required_text!("host", host),
    optional_text!("port", port),
    optional_flag!("tls", tls),
    required_text!("baseDN", base_dn),
    required_text!("userObjectClass", user_object_class),
    required_text!("userUniqueAttribute", user_unique_attribute),
    required_text!("admin", admin),
    optional_text!("idAttribute", attributes.id_attribute),
    optional_text!("firstNameAttribute", attributes.first_name_attribute),
    optional_text!("lastNameAttribute", attributes.last_name_attribute),
    optional_text!("displayNameAttribute", attributes.display_name_attribute),
    optional_text!("nickNameAttribute", attributes.nick_name_attribute),
    optional_text!("preferredUsernameAttribute", attributes.preferred_username_attribute),
    optional_text!("emailAttribute", attributes.email_attribute),
    optional_text!("emailVerifiedAttribute", attributes.email_verified_attribute),
    optional_text!("phoneAttribute", attributes.phone_attribute),
    optional_text!("phoneVerifiedAttribute", attributes.phone_verified_attribute),
    optional_text!("preferredLanguageAttribute", attributes.preferred_language_attribute),
    optional_text!("avatarURLAttribute", attributes.avatar_url_attribute),
    optional_text!("profileAttribute", attributes.profile_attribute),
    optional_flag!("isCreationAllowed", options.is_creation_allowed),
    optional_flag!("isLinkingAllowed", options.is_linking_allowed),
    optional_flag!("isAutoCreation", options.is_auto_creation),
    optional_flag!("isAutoUpdate", options.is_auto_update),
];
