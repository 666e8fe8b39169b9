//! Gatehouse Core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that all bounded
//! contexts depend on: the event reducer, the event log contract, unique
//! constraints, the field-diff engine and the secret envelope. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod changes;
pub mod clock;
pub mod command;
pub mod crypto;
pub mod details;
pub mod error;
pub mod event;
pub mod id;
pub mod repository;
pub mod unique;
