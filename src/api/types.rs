use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::services::AdminCredentials;

/// Outcome codes shared by every transport. The wire spelling is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeCode {
    MissingFields,
    HwidRequired,
    InvalidCredentials,
    HwidMismatch,
    Bound,
    Ok,
    UnauthorizedAdmin,
    InvalidData,
    NotFound,
    CannotDeleteMainAdmin,
    ServerError,
}

impl OutcomeCode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingFields => "MISSING_FIELDS",
            Self::HwidRequired => "HWID_REQUIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::HwidMismatch => "HWID_MISMATCH",
            Self::Bound => "BOUND",
            Self::Ok => "OK",
            Self::UnauthorizedAdmin => "UNAUTHORIZED_ADMIN",
            Self::InvalidData => "INVALID_DATA",
            Self::NotFound => "NOT_FOUND",
            Self::CannotDeleteMainAdmin => "CANNOT_DELETE_MAIN_ADMIN",
            Self::ServerError => "SERVER_ERROR",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Bound | Self::Ok => StatusCode::OK,
            Self::MissingFields | Self::HwidRequired | Self::InvalidData => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials | Self::UnauthorizedAdmin => StatusCode::UNAUTHORIZED,
            Self::HwidMismatch | Self::CannotDeleteMainAdmin => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Bound | Self::Ok)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: OutcomeCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(code: OutcomeCode, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(code: OutcomeCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Tags the response with its [`OutcomeCode`] so the request logger can
/// report it without reading the body.
impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let code = self.code;
        let mut response = (code.status(), Json(self)).into_response();
        response.extensions_mut().insert(code);
        response
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Missing fields deserialize to `None`; the services decide what is required.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub hwid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminAuth {
    pub admin_user: Option<String>,
    pub admin_pass: Option<String>,
}

impl AdminAuth {
    #[must_use]
    pub fn credentials(&self) -> AdminCredentials {
        AdminCredentials::new(
            self.admin_user.clone().unwrap_or_default(),
            self.admin_pass.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListUsersRequest {
    #[serde(flatten)]
    pub auth: AdminAuth,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveUserRequest {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub username: Option<String>,
    pub password: Option<String>,
    pub hwid: Option<String>,
    #[serde(deserialize_with = "deserialize_flag")]
    pub is_admin: bool,
}

/// Body of `/admin/delete_user` and `/admin/reset_hwid`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TargetUserRequest {
    #[serde(flatten)]
    pub auth: AdminAuth,
    pub username: Option<String>,
}

/// Accepts `true`, `1`, `1.0`, `"1"` and `"true"` as set. Any other JSON
/// value, including arrays and objects, is false and never fails the body.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Integer(i64),
        Float(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Integer(n) => n == 1,
        Flag::Float(f) => (f - 1.0).abs() < f64::EPSILON,
        Flag::Text(s) => matches!(s.trim(), "1" | "true"),
        Flag::Other(_) => false,
    })
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub username: String,
    pub password: String,
    pub hwid: String,
    pub admin: bool,
}

impl From<crate::domain::UserRecord> for UserDto {
    fn from(record: crate::domain::UserRecord) -> Self {
        Self {
            username: record.username,
            password: record.password,
            hwid: record.hwid,
            admin: record.admin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveUserData {
    pub username: String,
    pub result: crate::services::UpsertResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_codes_serialize_verbatim() {
        for code in [
            OutcomeCode::MissingFields,
            OutcomeCode::HwidRequired,
            OutcomeCode::InvalidCredentials,
            OutcomeCode::HwidMismatch,
            OutcomeCode::Bound,
            OutcomeCode::Ok,
            OutcomeCode::UnauthorizedAdmin,
            OutcomeCode::InvalidData,
            OutcomeCode::NotFound,
            OutcomeCode::CannotDeleteMainAdmin,
            OutcomeCode::ServerError,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn is_admin_accepts_legacy_spellings() {
        for (raw, expected) in [
            (r#"{"is_admin":"1"}"#, true),
            (r#"{"is_admin":"0"}"#, false),
            (r#"{"is_admin":true}"#, true),
            (r#"{"is_admin":1}"#, true),
            (r#"{"is_admin":"yes"}"#, false),
            (r#"{"is_admin":null}"#, false),
            (r#"{"is_admin":1.0}"#, true),
            (r#"{"is_admin":0.5}"#, false),
            (r#"{"is_admin":[1]}"#, false),
            (r#"{"is_admin":{"on":true}}"#, false),
            (r#"{}"#, false),
        ] {
            let req: SaveUserRequest = serde_json::from_str(raw).unwrap();
            assert_eq!(req.is_admin, expected, "{raw}");
        }
    }

    #[test]
    fn envelope_carries_its_code_to_the_response() {
        let response =
            ApiResponse::success(OutcomeCode::Bound, "bound", LoginData { is_admin: false })
                .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.extensions().get::<OutcomeCode>(),
            Some(&OutcomeCode::Bound)
        );

        let response = ApiResponse::<()>::error(OutcomeCode::HwidMismatch, "no").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.extensions().get::<OutcomeCode>(),
            Some(&OutcomeCode::HwidMismatch)
        );
    }

    #[test]
    fn admin_auth_is_read_from_the_flat_body() {
        let req: TargetUserRequest = serde_json::from_str(
            r#"{"admin_user":"admin","admin_pass":"pw","username":"alice"}"#,
        )
        .unwrap();
        let creds = req.auth.credentials();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "pw");
        assert_eq!(req.username.as_deref(), Some("alice"));
    }
}
