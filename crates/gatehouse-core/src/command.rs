//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The actor that issued the command; recorded as the event creator.
    fn actor(&self) -> &str;

    /// The organization the command operates in.
    fn resource_owner(&self) -> &str;
}
