//! Object metadata returned by command handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata describing the state of an aggregate after a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDetails {
    /// The organization that owns the aggregate.
    pub resource_owner: String,
    /// The aggregate's version after the command.
    pub sequence: i64,
    /// Creation date of the newest event, if any.
    pub change_date: Option<DateTime<Utc>>,
}
