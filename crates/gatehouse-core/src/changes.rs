//! Field-level change sets.
//!
//! A configuration type describes its mutable fields once, as a table of
//! [`FieldSpec`] entries. The same table drives three operations:
//!
//! - [`build`]: create a full configuration from a desired input, using the
//!   default for every field the input leaves out;
//! - [`diff`]: compare a desired input against current state, producing one
//!   [`FieldChange`] per differing leaf field, in table order;
//! - [`apply`]: fold a recorded [`FieldChange`] back onto state during replay.
//!
//! Adding a mutable field means adding one table entry.

use serde::{Deserialize, Serialize};

use crate::crypto::CryptoValue;

/// New value carried by a change directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    /// A string field.
    Text(String),
    /// A boolean flag.
    Flag(bool),
    /// An ordered list of strings.
    List(Vec<String>),
    /// An encrypted secret.
    Secret(CryptoValue),
}

/// One field-level change directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Stable payload name of the field.
    pub field: String,
    /// The field's new value.
    pub value: FieldValue,
}

impl FieldChange {
    /// Builds a directive for `field`.
    #[must_use]
    pub fn new(field: &str, value: FieldValue) -> Self {
        Self {
            field: field.to_owned(),
            value,
        }
    }
}

/// How a field is read from state `S`, read from desired input `D`, and
/// written back onto `S`.
///
/// `desired` returns `None` when the caller did not ask for the field.
pub enum FieldAccess<S, D> {
    /// A string field.
    Text {
        /// Reads the current value.
        current: fn(&S) -> &str,
        /// Reads the requested value.
        desired: fn(&D) -> Option<&str>,
        /// Writes a value.
        set: fn(&mut S, String),
    },
    /// A boolean flag.
    Flag {
        /// Reads the current value.
        current: fn(&S) -> bool,
        /// Reads the requested value.
        desired: fn(&D) -> Option<bool>,
        /// Writes a value.
        set: fn(&mut S, bool),
    },
    /// An ordered list of strings.
    List {
        /// Reads the current value.
        current: fn(&S) -> &[String],
        /// Reads the requested value.
        desired: fn(&D) -> Option<&[String]>,
        /// Writes a value.
        set: fn(&mut S, Vec<String>),
    },
}

/// A mutable field: its stable payload name and accessors.
pub struct FieldSpec<S, D> {
    /// Stable payload name.
    pub key: &'static str,
    /// Accessors.
    pub access: FieldAccess<S, D>,
}

/// Builds a configuration from `desired`, taking `S::default()` values for
/// every field the input leaves out.
pub fn build<S: Default, D>(fields: &[FieldSpec<S, D>], desired: &D) -> S {
    let mut state = S::default();
    for spec in fields {
        match &spec.access {
            FieldAccess::Text { desired: get, set, .. } => {
                if let Some(value) = get(desired) {
                    set(&mut state, value.to_owned());
                }
            }
            FieldAccess::Flag { desired: get, set, .. } => {
                if let Some(value) = get(desired) {
                    set(&mut state, value);
                }
            }
            FieldAccess::List { desired: get, set, .. } => {
                if let Some(value) = get(desired) {
                    set(&mut state, value.to_vec());
                }
            }
        }
    }
    state
}

/// Compares `desired` with `current` by value and returns one directive per
/// requested field whose value differs, in table order.
pub fn diff<S, D>(fields: &[FieldSpec<S, D>], current: &S, desired: &D) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    for spec in fields {
        let value = match &spec.access {
            FieldAccess::Text {
                current: get_current,
                desired: get_desired,
                ..
            } => get_desired(desired)
                .filter(|value| *value != get_current(current))
                .map(|value| FieldValue::Text(value.to_owned())),
            FieldAccess::Flag {
                current: get_current,
                desired: get_desired,
                ..
            } => get_desired(desired)
                .filter(|value| *value != get_current(current))
                .map(FieldValue::Flag),
            FieldAccess::List {
                current: get_current,
                desired: get_desired,
                ..
            } => get_desired(desired)
                .filter(|value| *value != get_current(current))
                .map(|value| FieldValue::List(value.to_vec())),
        };
        if let Some(value) = value {
            changes.push(FieldChange::new(spec.key, value));
        }
    }
    changes
}

/// Writes a recorded directive onto `state`.
///
/// Returns `false`, leaving `state` untouched, when the table has no such
/// field or the value kind does not match; unknown directives from newer
/// writers are skipped rather than failing the replay.
pub fn apply<S, D>(fields: &[FieldSpec<S, D>], state: &mut S, change: &FieldChange) -> bool {
    let Some(spec) = fields.iter().find(|spec| spec.key == change.field) else {
        return false;
    };
    match (&spec.access, &change.value) {
        (FieldAccess::Text { set, .. }, FieldValue::Text(value)) => set(state, value.clone()),
        (FieldAccess::Flag { set, .. }, FieldValue::Flag(value)) => set(state, *value),
        (FieldAccess::List { set, .. }, FieldValue::List(value)) => set(state, value.clone()),
        _ => return false,
    }
    true
}
