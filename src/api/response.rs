use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{ message, status, metadata }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub status: u16,
    pub metadata: T,
}

impl<T: Serialize> Envelope<T> {
    #[must_use]
    pub fn ok(message: impl Into<String>, metadata: T) -> Self {
        Self { message: message.into(), status: StatusCode::OK.as_u16(), metadata }
    }

    #[must_use]
    pub fn created(message: impl Into<String>, metadata: T) -> Self {
        Self { message: message.into(), status: StatusCode::CREATED.as_u16(), metadata }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}
