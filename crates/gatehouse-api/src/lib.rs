//! Gatehouse API: the HTTP shell around the identity-provider command engine.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
