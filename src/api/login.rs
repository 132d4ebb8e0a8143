use axum::{Json, extract::State, extract::rejection::JsonRejection};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LoginData, LoginRequest, OutcomeCode};
use crate::services::LoginOutcome;

/// POST /login
/// Checks credentials and device, binding the device on first use
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginData>, ApiError> {
    let result = attempt(&state, payload).await;

    let code = match &result {
        Ok(response) => response.code,
        Err(e) => e.code(),
    };
    metrics::counter!("login_attempts_total", "outcome" => code.as_str()).increment(1);

    result
}

async fn attempt(
    state: &AppState,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginData>, ApiError> {
    let Json(payload) = payload.map_err(|e| {
        tracing::debug!("Rejected login body: {e}");
        ApiError::MissingFields("username and password are required".to_string())
    })?;

    let outcome = state
        .login_service()
        .attempt_login(
            payload.username.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
            payload.hwid.as_deref().unwrap_or_default(),
        )
        .await?;

    let data = LoginData {
        is_admin: outcome.is_admin(),
    };

    Ok(match outcome {
        LoginOutcome::Bound { .. } => ApiResponse::success(
            OutcomeCode::Bound,
            "First login on this account, HWID registered",
            data,
        ),
        LoginOutcome::Accepted { .. } => {
            ApiResponse::success(OutcomeCode::Ok, "Login successful", data)
        }
    })
}
