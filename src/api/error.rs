use axum::response::{IntoResponse, Response};
use std::fmt;

use super::{ApiResponse, OutcomeCode};
use crate::services::{AdminError, LoginError};

#[derive(Debug)]
pub enum ApiError {
    MissingFields(String),

    HwidRequired,

    InvalidCredentials,

    HwidMismatch,

    UnauthorizedAdmin,

    InvalidData(String),

    NotFound(String),

    CannotDeleteMainAdmin,

    InternalError(String),
}

impl ApiError {
    #[must_use]
    pub const fn code(&self) -> OutcomeCode {
        match self {
            ApiError::MissingFields(_) => OutcomeCode::MissingFields,
            ApiError::HwidRequired => OutcomeCode::HwidRequired,
            ApiError::InvalidCredentials => OutcomeCode::InvalidCredentials,
            ApiError::HwidMismatch => OutcomeCode::HwidMismatch,
            ApiError::UnauthorizedAdmin => OutcomeCode::UnauthorizedAdmin,
            ApiError::InvalidData(_) => OutcomeCode::InvalidData,
            ApiError::NotFound(_) => OutcomeCode::NotFound,
            ApiError::CannotDeleteMainAdmin => OutcomeCode::CannotDeleteMainAdmin,
            ApiError::InternalError(_) => OutcomeCode::ServerError,
        }
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        ApiError::InvalidData(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingFields(msg) => write!(f, "Missing fields: {}", msg),
            ApiError::HwidRequired => write!(f, "HWID is required"),
            ApiError::InvalidCredentials => write!(f, "Invalid username or password"),
            ApiError::HwidMismatch => {
                write!(f, "This account is already bound to another device")
            }
            ApiError::UnauthorizedAdmin => write!(f, "Invalid admin credentials"),
            ApiError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::CannotDeleteMainAdmin => {
                write!(f, "The main admin account cannot be deleted")
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            ApiError::MissingFields(msg) | ApiError::InvalidData(msg) => msg.clone(),
            ApiError::NotFound(_) => "User not found".to_string(),
            other => other.to_string(),
        };

        ApiResponse::<()>::error(code, message).into_response()
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::MissingFields => {
                ApiError::MissingFields("username and password are required".to_string())
            }
            LoginError::HwidRequired => ApiError::HwidRequired,
            LoginError::InvalidCredentials => ApiError::InvalidCredentials,
            LoginError::HwidMismatch => ApiError::HwidMismatch,
            LoginError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Unauthorized => ApiError::UnauthorizedAdmin,
            AdminError::InvalidData(msg) => ApiError::InvalidData(msg),
            AdminError::NotFound(username) => ApiError::NotFound(username),
            AdminError::CannotDeleteMainAdmin => ApiError::CannotDeleteMainAdmin,
            AdminError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}
