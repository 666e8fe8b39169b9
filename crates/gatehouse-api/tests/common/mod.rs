//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gatehouse_event_store::InMemoryEventRepository;
use gatehouse_test_support::{FixedClock, MockCipher, SequenceIdGenerator};
use http_body_util::BodyExt;
use tower::ServiceExt;

use gatehouse_api::routes;
use gatehouse_api::state::AppState;

/// Build the full app router over `log` with a fixed clock, ids `idp1`,
/// `idp2`, ... and the transparent test cipher. Uses the same route
/// structure as `main.rs`.
pub fn build_test_app(log: InMemoryEventRepository) -> Router {
    let app_state = AppState::new(
        Arc::new(FixedClock::default()),
        Arc::new(SequenceIdGenerator::new("idp")),
        Arc::new(MockCipher),
        Arc::new(log),
    );
    routes::router(app_state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-gatehouse-actor", "admin")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, json_request("POST", uri, body)).await
}

/// Send a PUT request with a JSON body and return the response.
pub async fn put_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, json_request("PUT", uri, body)).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a DELETE request and return the response.
pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("x-gatehouse-actor", "admin")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
