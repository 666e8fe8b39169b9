//! Behavioral options shared by every provider type.

use serde::{Deserialize, Serialize};

/// How users authenticated through a provider are handled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdpOptions {
    /// Users may create an account through the provider.
    pub is_creation_allowed: bool,
    /// Users may link the provider to an existing account.
    pub is_linking_allowed: bool,
    /// Accounts are created automatically on first login.
    pub is_auto_creation: bool,
    /// Account data is refreshed from the provider on every login.
    pub is_auto_update: bool,
}

/// Requested option values; `None` leaves the option as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdpOptionsInput {
    /// See [`IdpOptions::is_creation_allowed`].
    pub is_creation_allowed: Option<bool>,
    /// See [`IdpOptions::is_linking_allowed`].
    pub is_linking_allowed: Option<bool>,
    /// See [`IdpOptions::is_auto_creation`].
    pub is_auto_creation: Option<bool>,
    /// See [`IdpOptions::is_auto_update`].
    pub is_auto_update: Option<bool>,
}

impl IdpOptionsInput {
    /// Requests every option explicitly.
    #[must_use]
    pub fn all(options: &IdpOptions) -> Self {
        Self {
            is_creation_allowed: Some(options.is_creation_allowed),
            is_linking_allowed: Some(options.is_linking_allowed),
            is_auto_creation: Some(options.is_auto_creation),
            is_auto_update: Some(options.is_auto_update),
        }
    }
}
