//! Domain model for the Identity Provider context.

pub mod aggregates;
pub mod commands;
pub mod constraints;
pub mod events;
pub mod ldap;
pub mod oidc;
pub mod options;

/// Builds a `FieldSpec` for a text field that callers must always supply.
macro_rules! required_text {
    ($key:literal, $($path:ident).+) => {
        ::gatehouse_core::changes::FieldSpec {
            key: $key,
            access: ::gatehouse_core::changes::FieldAccess::Text {
                current: |s| s.$($path).+.as_str(),
                desired: |d| Some(d.$($path).+.as_str()),
                set: |s, v| s.$($path).+ = v,
            },
        }
    };
}

/// Builds a `FieldSpec` for an optional text field.
macro_rules! optional_text {
    ($key:literal, $($path:ident).+) => {
        ::gatehouse_core::changes::FieldSpec {
            key: $key,
            access: ::gatehouse_core::changes::FieldAccess::Text {
                current: |s| s.$($path).+.as_str(),
                desired: |d| d.$($path).+.as_deref(),
                set: |s, v| s.$($path).+ = v,
            },
        }
    };
}

/// Builds a `FieldSpec` for an optional boolean flag.
macro_rules! optional_flag {
    ($key:literal, $($path:ident).+) => {
        ::gatehouse_core::changes::FieldSpec {
            key: $key,
            access: ::gatehouse_core::changes::FieldAccess::Flag {
                current: |s| s.$($path).+,
                desired: |d| d.$($path).+,
                set: |s, v| s.$($path).+ = v,
            },
        }
    };
}

/// Builds a `FieldSpec` for an optional list of strings.
macro_rules! optional_list {
    ($key:literal, $($path:ident).+) => {
        ::gatehouse_core::changes::FieldSpec {
            key: $key,
            access: ::gatehouse_core::changes::FieldAccess::List {
                current: |s| s.$($path).+.as_slice(),
                desired: |d| d.$($path).+.as_deref(),
                set: |s, v| s.$($path).+ = v,
            },
        }
    };
}

pub(crate) use {optional_flag, optional_list, optional_text, required_text};

/// Rejects blank required input.
pub(crate) fn require(
    field: &'static str,
    value: &str,
) -> Result<(), gatehouse_core::error::DomainError> {
    if value.trim().is_empty() {
        return Err(gatehouse_core::error::DomainError::empty(field));
    }
    Ok(())
}

/// A supplied secret, or `None` when the caller left it out or sent it blank.
pub(crate) fn supplied(secret: Option<&str>) -> Option<&str> {
    secret.filter(|value| !value.trim().is_empty())
}
