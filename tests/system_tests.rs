//! Integration tests for the system endpoints and the JSON file backend.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use glom_auth::config::{Config, StorageBackend};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.storage.database_url = "sqlite::memory:".to_string();
    config.storage.max_connections = 1;
    config.storage.min_connections = 1;

    let state = glom_auth::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    glom_auth::api::router(state)
}

async fn spawn_json_app(path: &Path) -> Router {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Json;
    config.storage.json_path = path.display().to_string();

    let state = glom_auth::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    glom_auth::api::router(state)
}

fn temp_json_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("glom-auth-test-{}", uuid::Uuid::new_v4()))
        .join("users.json")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let (status, bytes) = send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let app = spawn_app().await;

    let (status, bytes) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "running");
    let endpoints = json["endpoints"].as_array().unwrap();
    assert!(endpoints.iter().any(|e| e == "/login"));
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let (status, bytes) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = spawn_app().await;

    let (status, bytes) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(bytes).unwrap().contains("not enabled"));
}

#[tokio::test]
async fn test_login_is_post_only() {
    let app = spawn_app().await;

    let (status, _) = get(&app, "/login").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_json_backend_persists_across_restarts() {
    let path = temp_json_path();

    {
        let app = spawn_json_app(&path).await;

        let (status, body) = post(
            &app,
            "/admin/save_user",
            json!({
                "admin_user": "admin",
                "admin_pass": "GLOM-ADMIN",
                "username": "alice",
                "password": "pw",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");

        let (_, body) = post(
            &app,
            "/login",
            json!({ "username": "alice", "password": "pw", "hwid": "DEV-1" }),
        )
        .await;
        assert_eq!(body["code"], "BOUND");
    }

    let raw = std::fs::read_to_string(&path).unwrap();
    let file: Value = serde_json::from_str(&raw).unwrap();
    let users = file["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);

    let app = spawn_json_app(&path).await;
    let (_, body) = post(
        &app,
        "/login",
        json!({ "username": "alice", "password": "pw", "hwid": "DEV-2" }),
    )
    .await;
    assert_eq!(body["code"], "HWID_MISMATCH");

    let (_, body) = post(
        &app,
        "/login",
        json!({ "username": "alice", "password": "pw", "hwid": "DEV-1" }),
    )
    .await;
    assert_eq!(body["code"], "OK");

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[tokio::test]
async fn test_json_backend_rejects_corrupt_file() {
    let path = temp_json_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ this is not json").unwrap();

    let mut config = Config::default();
    config.storage.backend = StorageBackend::Json;
    config.storage.json_path = path.display().to_string();

    let result = glom_auth::api::create_app_state_from_config(config, None).await;
    assert!(result.is_err());

    // The corrupt file is left for the operator to inspect.
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ this is not json");

    if let Some(dir) = path.parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}
