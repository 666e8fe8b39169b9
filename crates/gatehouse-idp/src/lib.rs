//! Gatehouse: Identity Provider bounded context.
//!
//! Responsible for the identity providers an organization configures (LDAP
//! directories and OIDC issuers): validating desired configurations,
//! computing minimal change events against recorded history, sealing bind
//! credentials and client secrets, and keeping provider names unique per
//! organization.

pub mod application;
pub mod domain;
