//! Aggregate identifier generation.

use uuid::Uuid;

use crate::error::DomainError;

/// Produces identifiers for new aggregates.
///
/// In tests, a generator handing out a predetermined sequence is injected.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if no identifier can be issued.
    fn next_id(&self) -> Result<String, DomainError>;
}

/// Production generator issuing time-ordered UUIDv7 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> Result<String, DomainError> {
        Ok(Uuid::now_v7().simple().to_string())
    }
}
