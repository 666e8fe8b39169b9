//! Test ID generators.

use std::sync::atomic::{AtomicUsize, Ordering};

use gatehouse_core::error::DomainError;
use gatehouse_core::id::IdGenerator;

/// Issues `prefix1`, `prefix2`, … and counts how many IDs were taken.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: &'static str,
    issued: AtomicUsize,
}

impl SequenceIdGenerator {
    /// Create a generator whose IDs start with `prefix`.
    #[must_use]
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            issued: AtomicUsize::new(0),
        }
    }

    /// Number of IDs handed out so far.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn next_id(&self) -> Result<String, DomainError> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{}{n}", self.prefix))
    }
}

/// An ID generator that always fails.
#[derive(Debug)]
pub struct FailingIdGenerator;

impl IdGenerator for FailingIdGenerator {
    fn next_id(&self) -> Result<String, DomainError> {
        Err(DomainError::Infrastructure("id generator unavailable".into()))
    }
}
