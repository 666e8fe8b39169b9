//! Commands for the Identity Provider context.

use gatehouse_core::command::Command;
use uuid::Uuid;

use super::ldap::LdapProvider;
use super::oidc::OidcProvider;

/// Command to configure a new LDAP provider.
#[derive(Debug, Clone)]
pub struct AddLdapProvider {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who issued the command.
    pub actor: String,
    /// The owning organization.
    pub resource_owner: String,
    /// The desired configuration.
    pub provider: LdapProvider,
}

/// Command to change an existing LDAP provider.
#[derive(Debug, Clone)]
pub struct UpdateLdapProvider {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who issued the command.
    pub actor: String,
    /// The owning organization.
    pub resource_owner: String,
    /// The provider identifier.
    pub id: String,
    /// The desired configuration.
    pub provider: LdapProvider,
}

/// Command to configure a new OIDC provider.
#[derive(Debug, Clone)]
pub struct AddOidcProvider {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who issued the command.
    pub actor: String,
    /// The owning organization.
    pub resource_owner: String,
    /// The desired configuration.
    pub provider: OidcProvider,
}

/// Command to change an existing OIDC provider.
#[derive(Debug, Clone)]
pub struct UpdateOidcProvider {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who issued the command.
    pub actor: String,
    /// The owning organization.
    pub resource_owner: String,
    /// The provider identifier.
    pub id: String,
    /// The desired configuration.
    pub provider: OidcProvider,
}

/// Command to remove a provider of any type.
#[derive(Debug, Clone)]
pub struct RemoveProvider {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Who issued the command.
    pub actor: String,
    /// The owning organization.
    pub resource_owner: String,
    /// The provider identifier.
    pub id: String,
}

macro_rules! impl_command {
    ($($command:ty => $name:literal),+ $(,)?) => {
        $(
            impl Command for $command {
                fn command_type(&self) -> &'static str {
                    $name
                }

                fn correlation_id(&self) -> Uuid {
                    self.correlation_id
                }

                fn actor(&self) -> &str {
                    &self.actor
                }

                fn resource_owner(&self) -> &str {
                    &self.resource_owner
                }
            }
        )+
    };
}

impl_command! {
    AddLdapProvider => "idp.add_ldap_provider",
    UpdateLdapProvider => "idp.update_ldap_provider",
    AddOidcProvider => "idp.add_oidc_provider",
    UpdateOidcProvider => "idp.update_oidc_provider",
    RemoveProvider => "idp.remove_provider",
}
