//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use json_cache::{
    api::create_router,
    backend::{BackendResult, CacheBackend, MemoryBackend, Revision, Stored},
    error::BackendError,
    AppState, CacheService,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::in_memory())
}

/// Backend that refuses every call, with driver-looking error text.
struct DownBackend;

fn auth_failure() -> BackendError {
    BackendError::Connection("FATAL: password authentication failed for user \"cache\"".to_string())
}

#[async_trait]
impl CacheBackend for DownBackend {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn upsert(&self, _key: &str, _payload: &str) -> BackendResult<Revision> {
        Err(auth_failure())
    }

    async fn fetch(&self, _key: &str) -> BackendResult<Option<Stored>> {
        Err(auth_failure())
    }

    async fn fill(&self, _key: &str, _payload: &str, _revision: Revision) -> BackendResult<bool> {
        Err(auth_failure())
    }

    async fn evict(&self, _key: &str) -> BackendResult<()> {
        Err(auth_failure())
    }

    async fn ping(&self) -> BackendResult<()> {
        Err(BackendError::Connection("connection refused".to_string()))
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn store(app: &Router, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/store")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

// == Store Endpoint Tests ==

#[tokio::test]
async fn test_store_endpoint_echoes_key() {
    let app = create_test_app();

    let response = store(&app, r#"{"key":"user:42","value":{"name":"Ada"}}"#).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, json!({"key": "user:42"}));
}

#[tokio::test]
async fn test_store_endpoint_accepts_null_value() {
    let app = create_test_app();

    let response = store(&app, r#"{"key":"nothing","value":null}"#).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/api/v1/retrieve/nothing").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, json!({"value": null}));
}

// == Retrieve Endpoint Tests ==

#[tokio::test]
async fn test_store_then_retrieve() {
    let app = create_test_app();

    let response = store(&app, r#"{"key":"user:42","value":{"name":"Ada"}}"#).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/api/v1/retrieve/user:42").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], json!({"name": "Ada"}));
}

#[tokio::test]
async fn test_overwrite_returns_latest_value() {
    let app = create_test_app();

    store(&app, r#"{"key":"user:42","value":{"name":"Ada"}}"#).await;
    store(&app, r#"{"key":"user:42","value":{"name":"Grace"}}"#).await;

    let response = get(&app, "/api/v1/retrieve/user:42").await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], json!({"name": "Grace"}));
}

#[tokio::test]
async fn test_retrieve_endpoint_not_found() {
    let app = create_test_app();

    let response = get(&app, "/api/v1/retrieve/user:99").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Cache item with key 'user:99' not found");
}

#[tokio::test]
async fn test_retrieve_whitespace_key() {
    let app = create_test_app();

    let response = get(&app, "/api/v1/retrieve/%20%20").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Opaque String Endpoint Tests ==

#[tokio::test]
async fn test_raw_store_and_retrieve() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cache/greeting?value=hello")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/cache/greeting").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json, json!({"key": "greeting", "value": "hello"}));
}

#[tokio::test]
async fn test_raw_store_without_value() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cache/greeting")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["components"], json!({"memory": true}));
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_health_endpoint_one_backend_down() {
    let service = CacheService::new(Arc::new(DownBackend))
        .with_front_cache(Arc::new(MemoryBackend::new()));
    let app = create_router(AppState::new(service));

    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["components"], json!({"memory": true, "postgres": false}));
}

#[tokio::test]
async fn test_front_cache_down_still_serves_from_primary() {
    let service = CacheService::new(Arc::new(MemoryBackend::new()))
        .with_front_cache(Arc::new(DownBackend));
    let app = create_router(AppState::new(service));

    let response = store(&app, r#"{"key":"user:42","value":{"name":"Grace"}}"#).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&app, "/api/v1/retrieve/user:42").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"], json!({"name": "Grace"}));

    // The outage still shows up in health
    let response = get(&app, "/health").await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "unhealthy");
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = store(&app, r#"{"invalid json"#).await;

    // Axum returns 422 for JSON parsing errors by default
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    for body in [
        r#"{"key":"","value":"test"}"#,
        r#"{"key":"   ","value":"test"}"#,
    ] {
        let response = store(&app, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_to_json(response.into_body()).await;
        assert!(json.get("error").is_some());
    }
}

#[tokio::test]
async fn test_missing_value_request() {
    let app = create_test_app();

    let response = store(&app, r#"{"key":"user:42"}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_backend_failure_hides_driver_details() {
    let app = create_router(AppState::new(CacheService::new(Arc::new(DownBackend))));

    let response = store(&app, r#"{"key":"user:42","value":1}"#).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "Internal server error while storing cache item");

    let response = get(&app, "/api/v1/retrieve/user:42").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    let message = json["error"].as_str().unwrap();
    assert_eq!(message, "Internal server error while retrieving cache item");
    assert!(!message.contains("password"));
}
