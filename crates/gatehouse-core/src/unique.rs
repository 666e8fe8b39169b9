//! Cross-aggregate unique constraints.
//!
//! A constraint claims a value within a scope (e.g. an identity-provider name
//! within an organization) for exactly one aggregate. Constraint operations
//! are submitted with the events that cause them and the event log applies
//! both in one atomic append.

use serde::{Deserialize, Serialize};

/// Whether a constraint operation claims or releases a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueConstraintAction {
    /// Claim the value for the pushing aggregate.
    Add,
    /// Release the value held by the pushing aggregate.
    Remove,
}

/// One constraint operation within an append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueConstraint {
    /// Kind of unique value, e.g. `idp_config_names`.
    pub unique_type: String,
    /// Scope the value must be unique in, usually the resource owner.
    pub scope: String,
    /// The normalized value.
    pub value: String,
    /// Claim or release.
    pub action: UniqueConstraintAction,
    /// Message surfaced when an add collides with another owner.
    pub error_message: String,
}

impl UniqueConstraint {
    /// Builds a claim for `value` within `scope`.
    #[must_use]
    pub fn add(unique_type: &str, scope: &str, value: &str, error_message: &str) -> Self {
        Self {
            unique_type: unique_type.to_owned(),
            scope: scope.to_owned(),
            value: normalize(value),
            action: UniqueConstraintAction::Add,
            error_message: error_message.to_owned(),
        }
    }

    /// Builds a release of `value` within `scope`.
    #[must_use]
    pub fn remove(unique_type: &str, scope: &str, value: &str) -> Self {
        Self {
            unique_type: unique_type.to_owned(),
            scope: scope.to_owned(),
            value: normalize(value),
            action: UniqueConstraintAction::Remove,
            error_message: String::new(),
        }
    }

    /// Release of `old` followed by a claim of `new`, for a rename.
    #[must_use]
    pub fn rename(
        unique_type: &str,
        scope: &str,
        old: &str,
        new: &str,
        error_message: &str,
    ) -> [Self; 2] {
        [
            Self::remove(unique_type, scope, old),
            Self::add(unique_type, scope, new, error_message),
        ]
    }

    /// The storage key: type, scope and normalized value.
    #[must_use]
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.unique_type, &self.scope, &self.value)
    }
}

/// Normalizes a value so that keys compare case-insensitively and ignore
/// surrounding whitespace.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_differing_only_by_case_share_a_key() {
        let upper = UniqueConstraint::add("idp_config_names", "org1", "Corp LDAP", "exists");
        let lower = UniqueConstraint::remove("idp_config_names", "org1", "corp ldap");

        assert_eq!(upper.key(), lower.key());
    }

    #[test]
    fn test_surrounding_whitespace_does_not_change_the_key() {
        let padded = UniqueConstraint::add("idp_config_names", "org1", "  Corp\t", "exists");
        let plain = UniqueConstraint::add("idp_config_names", "org1", "corp", "exists");

        assert_eq!(padded.key(), plain.key());
    }

    #[test]
    fn test_rename_releases_old_before_claiming_new() {
        let [release, claim] =
            UniqueConstraint::rename("idp_config_names", "org1", "old", "New", "exists");

        assert_eq!(release.action, UniqueConstraintAction::Remove);
        assert_eq!(release.value, "old");
        assert_eq!(claim.action, UniqueConstraintAction::Add);
        assert_eq!(claim.value, "new");
        assert_eq!(claim.error_message, "exists");
    }
}
