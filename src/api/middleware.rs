use crate::api::AppState;
use crate::domain::api_key::Permission;
use crate::error::{AppError, Result};
use crate::services::session_service::{Credentials, Session};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

pub const API_KEY: &str = "x-api-key";
pub const CLIENT_ID: &str = "x-client-id";
pub const REFRESH_TOKEN: &str = "x-rtoken-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Rejects requests without an active API key granting the basic permission.
///
/// # Errors
/// `Forbidden` when the key is missing, unknown or lacks the permission.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    let api_key = state.api_key_service.authorize(header_str(request.headers(), API_KEY), Permission::Basic).await?;
    tracing::trace!(permissions = ?api_key.permissions, "API key accepted");
    Ok(next.run(request).await)
}

/// The authenticated shop behind a request.
#[derive(Debug)]
pub struct AuthSession(pub Session);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let headers = &parts.headers;
        let credentials = Credentials {
            client_id: header_str(headers, CLIENT_ID),
            access_token: header_str(headers, header::AUTHORIZATION.as_str()),
            refresh_token: header_str(headers, REFRESH_TOKEN),
        };
        let session = state.session_service.authenticate(credentials).await?;
        tracing::Span::current().record("user_id", tracing::field::display(session.claims.user_id));
        Ok(Self(session))
    }
}
