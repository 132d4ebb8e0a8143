use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        name: "GLOM Auth API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        endpoints: vec![
            "/health",
            "/login",
            "/admin/users",
            "/admin/save_user",
            "/admin/delete_user",
            "/admin/reset_hwid",
        ],
    })
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "GLOM Auth API is running",
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
