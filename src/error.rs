use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Authentication failed: {0}")]
    AuthError(String),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::AuthError(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AuthError(_) | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal server error".to_string()
            }
            Self::AuthError(msg) => {
                tracing::debug!(message = %msg, "Authentication failed");
                msg
            }
            Self::InvalidToken => {
                tracing::debug!("Invalid token");
                "Invalid token".to_string()
            }
            Self::Forbidden(msg) => {
                tracing::debug!(message = %msg, "Forbidden");
                msg
            }
            Self::NotFound(msg) => {
                tracing::debug!(message = %msg, "Resource not found");
                msg
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                msg
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                msg
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "status": "error",
            "code": status.as_u16(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
