//! Shared test mocks and utilities for the Gatehouse command engine.

mod cipher;
mod clock;
mod ids;
mod repository;

pub use cipher::{FailingCipher, MockCipher};
pub use clock::FixedClock;
pub use ids::{FailingIdGenerator, SequenceIdGenerator};
pub use repository::{
    AppendCall, EmptyEventRepository, FailingEventRepository, RecordingEventRepository,
};
