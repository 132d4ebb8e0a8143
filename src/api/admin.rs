use axum::{Json, extract::State, extract::rejection::JsonRejection};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, AppState, ListUsersRequest, OutcomeCode, SaveUserData,
    SaveUserRequest, TargetUserRequest, UserDto,
};
use crate::services::UserUpsert;

type AdminResult<T> = Result<ApiResponse<T>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::invalid_data(format!("malformed request body: {e}")))
}

/// Counts every admin call by operation and outcome.
fn record<T>(operation: &'static str, result: AdminResult<T>) -> AdminResult<T> {
    let code = match &result {
        Ok(response) => response.code,
        Err(e) => e.code(),
    };
    metrics::counter!(
        "admin_operations_total",
        "operation" => operation,
        "outcome" => code.as_str()
    )
    .increment(1);
    result
}

/// POST /admin/users
/// Every account, in store order
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ListUsersRequest>, JsonRejection>,
) -> AdminResult<Vec<UserDto>> {
    record("list_users", list(&state, payload).await)
}

async fn list(
    state: &AppState,
    payload: Result<Json<ListUsersRequest>, JsonRejection>,
) -> AdminResult<Vec<UserDto>> {
    let request = body(payload)?;
    let users = state
        .admin_service()
        .list_users(&request.auth.credentials())
        .await?;

    let users: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
    let message = format!("{} users", users.len());
    Ok(ApiResponse::success(OutcomeCode::Ok, message, users))
}

/// POST /admin/save_user
/// Add a new account or update an existing one
pub async fn save_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveUserRequest>, JsonRejection>,
) -> AdminResult<SaveUserData> {
    record("save_user", save(&state, payload).await)
}

async fn save(
    state: &AppState,
    payload: Result<Json<SaveUserRequest>, JsonRejection>,
) -> AdminResult<SaveUserData> {
    let request = body(payload)?;
    let upsert = UserUpsert {
        username: request.username.unwrap_or_default(),
        password: request.password.unwrap_or_default(),
        hwid: request.hwid,
        admin: request.is_admin,
    };
    let username = upsert.username.clone();

    let result = state
        .admin_service()
        .upsert_user(&request.auth.credentials(), upsert)
        .await?;

    Ok(ApiResponse::success(
        OutcomeCode::Ok,
        "User saved",
        SaveUserData { username, result },
    ))
}

/// POST /admin/delete_user
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TargetUserRequest>, JsonRejection>,
) -> AdminResult<()> {
    record("delete_user", delete(&state, payload).await)
}

async fn delete(
    state: &AppState,
    payload: Result<Json<TargetUserRequest>, JsonRejection>,
) -> AdminResult<()> {
    let request = body(payload)?;
    let username = request.username.unwrap_or_default();

    state
        .admin_service()
        .delete_user(&request.auth.credentials(), &username)
        .await?;

    Ok(ApiResponse::success(OutcomeCode::Ok, "User deleted", ()))
}

/// POST /admin/reset_hwid
/// Unbind an account so its next login registers a new device
pub async fn reset_hwid(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TargetUserRequest>, JsonRejection>,
) -> AdminResult<()> {
    record("reset_hwid", reset(&state, payload).await)
}

async fn reset(
    state: &AppState,
    payload: Result<Json<TargetUserRequest>, JsonRejection>,
) -> AdminResult<()> {
    let request = body(payload)?;
    let username = request.username.unwrap_or_default();

    state
        .admin_service()
        .reset_hwid(&request.auth.credentials(), &username)
        .await?;

    Ok(ApiResponse::success(OutcomeCode::Ok, "HWID reset", ()))
}
