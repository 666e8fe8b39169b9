//! Application layer for the Identity Provider context.

pub mod command_handlers;
pub mod query_handlers;
