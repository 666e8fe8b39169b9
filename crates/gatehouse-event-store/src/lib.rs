//! Event log implementations for the Gatehouse command engine.
//!
//! Both stores append a batch of events and its unique-constraint operations
//! atomically, guarded by the stream's expected version.

pub mod memory;
pub mod pg_event_repository;

pub use memory::InMemoryEventRepository;
pub use pg_event_repository::PgEventRepository;
