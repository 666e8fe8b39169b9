//! Name uniqueness for identity providers.
//!
//! One provider name per organization, across provider types, compared
//! case-insensitively.

use gatehouse_core::unique::UniqueConstraint;

/// Constraint type holding provider names.
pub const IDP_NAME_UNIQUE_TYPE: &str = "idp_config_names";

/// Message surfaced when a name is already taken.
pub const IDP_NAME_TAKEN: &str = "identity provider name already exists";

/// Claims `name` within the organization.
#[must_use]
pub fn claim_name(resource_owner: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::add(IDP_NAME_UNIQUE_TYPE, resource_owner, name, IDP_NAME_TAKEN)
}

/// Releases `name` within the organization.
#[must_use]
pub fn release_name(resource_owner: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::remove(IDP_NAME_UNIQUE_TYPE, resource_owner, name)
}

/// Constraint operations for moving from `current` to `desired`; empty when
/// the name is unchanged.
#[must_use]
pub fn rename(resource_owner: &str, current: &str, desired: &str) -> Vec<UniqueConstraint> {
    if current == desired {
        return Vec::new();
    }
    UniqueConstraint::rename(
        IDP_NAME_UNIQUE_TYPE,
        resource_owner,
        current,
        desired,
        IDP_NAME_TAKEN,
    )
    .to_vec()
}
