//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatehouse_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the event-store schema failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Whether re-issuing the same request may succeed.
    pub retryable: bool,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::InvalidArgument { .. } => (StatusCode::BAD_REQUEST, "invalid_argument"),
            DomainError::AggregateNotFound(_) => (StatusCode::NOT_FOUND, "aggregate_not_found"),
            DomainError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            DomainError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            DomainError::OutcomeUnknown(_) => (StatusCode::GATEWAY_TIMEOUT, "outcome_unknown"),
            DomainError::Encryption(_) => (StatusCode::INTERNAL_SERVER_ERROR, "encryption_error"),
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_invalid_argument_maps_to_400() {
        assert_eq!(
            status_of(DomainError::empty("name")),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_aggregate_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::AggregateNotFound("idp1".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_already_exists_maps_to_409() {
        assert_eq!(
            status_of(DomainError::AlreadyExists("name taken".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_concurrency_conflict_maps_to_409() {
        assert_eq!(
            status_of(DomainError::ConcurrencyConflict {
                aggregate_id: "idp1".into(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    async fn body_of(err: DomainError) -> serde_json::Value {
        let response = ApiError(err).into_response();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_only_concurrency_conflicts_are_marked_retryable() {
        // Act
        let conflict = body_of(DomainError::ConcurrencyConflict {
            aggregate_id: "idp1".into(),
            expected: 1,
            actual: 2,
        })
        .await;
        let taken = body_of(DomainError::AlreadyExists("name taken".into())).await;

        // Assert
        assert_eq!(conflict["error"], "concurrency_conflict");
        assert_eq!(conflict["retryable"], true);
        assert_eq!(taken["error"], "already_exists");
        assert_eq!(taken["message"], "already exists: name taken");
        assert_eq!(taken["retryable"], false);
    }

    #[test]
    fn test_outcome_unknown_maps_to_504() {
        assert_eq!(
            status_of(DomainError::OutcomeUnknown("push timed out".into())),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_encryption_and_infrastructure_map_to_500() {
        assert_eq!(
            status_of(DomainError::Encryption("no key".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
