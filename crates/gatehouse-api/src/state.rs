//! Shared application state.

use std::sync::Arc;

use gatehouse_core::clock::Clock;
use gatehouse_core::crypto::SecretCipher;
use gatehouse_core::id::IdGenerator;
use gatehouse_core::repository::EventRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Time source for event timestamps.
    pub clock: Arc<dyn Clock>,
    /// Issues aggregate ids for new providers.
    pub id_generator: Arc<dyn IdGenerator>,
    /// Seals provider secrets.
    pub cipher: Arc<dyn SecretCipher>,
    /// The event log.
    pub event_repository: Arc<dyn EventRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        id_generator: Arc<dyn IdGenerator>,
        cipher: Arc<dyn SecretCipher>,
        event_repository: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            clock,
            id_generator,
            cipher,
            event_repository,
        }
    }
}
