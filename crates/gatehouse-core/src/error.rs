//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Caller-supplied input failed validation before any I/O happened.
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument {
        /// The offending input field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// A uniquely scoped value is already claimed by another aggregate.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A write did not complete in time; it may or may not have been applied.
    #[error("outcome unknown: {0}")]
    OutcomeUnknown(String),

    /// The secret cipher failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Shorthand for an `InvalidArgument` on an empty required field.
    #[must_use]
    pub fn empty(field: &'static str) -> Self {
        Self::InvalidArgument {
            field,
            reason: "must not be empty",
        }
    }

    /// Returns `true` for conditions the caller may resolve by re-issuing the
    /// command against fresh state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}
