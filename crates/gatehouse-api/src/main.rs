//! Gatehouse API server entry point.

use std::sync::Arc;

use gatehouse_api::config::{ServerConfig, StoreBackend};
use gatehouse_api::error::AppError;
use gatehouse_api::state::AppState;
use gatehouse_api::{routes, telemetry};
use gatehouse_core::clock::SystemClock;
use gatehouse_core::id::UuidV7Generator;
use gatehouse_core::repository::EventRepository;
use gatehouse_crypto::AesGcmCipher;
use gatehouse_event_store::{InMemoryEventRepository, PgEventRepository};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ServerConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    let result = run(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "server exited with an error");
    }
    telemetry.shutdown();
    result
}

async fn run(config: ServerConfig) -> Result<(), AppError> {
    tracing::info!("Starting Gatehouse API server");

    let addr = config.bind_address()?;
    let event_repository: Arc<dyn EventRepository> = match &config.store {
        StoreBackend::Postgres(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await?;
            let repository = PgEventRepository::new(pool).with_push_timeout(config.push_timeout);
            repository.migrate().await?;
            Arc::new(repository)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory event store; events are lost on restart");
            Arc::new(InMemoryEventRepository::new())
        }
    };

    for (key_id, fingerprint) in config.keyring.fingerprints() {
        tracing::info!(key_id = %key_id, fingerprint = %fingerprint, "encryption key loaded");
    }
    tracing::info!(active_key = config.keyring.active_key_id(), "encryption keyring loaded");
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(UuidV7Generator),
        Arc::new(AesGcmCipher::new(config.keyring)),
        event_repository,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
