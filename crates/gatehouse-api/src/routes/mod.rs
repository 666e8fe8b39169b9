//! Route modules and the assembled application router.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod idp;

/// Builds the full router. Middleware layers are added by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1", idp::router())
        .with_state(state)
}
