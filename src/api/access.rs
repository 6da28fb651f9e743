use crate::api::AppState;
use crate::api::middleware::AuthSession;
use crate::api::response::Envelope;
use crate::api::schemas::access::{Login, SignUp};
use crate::error::{AppError, Result};
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

pub async fn sign_up(State(state): State<AppState>, Json(payload): Json<SignUp>) -> Result<impl IntoResponse> {
    let signed_up = state.access_service.sign_up(payload.name, payload.email, payload.password).await?;
    Ok(Envelope::created("Registered OK!", signed_up))
}

pub async fn login(State(state): State<AppState>, Json(payload): Json<Login>) -> Result<impl IntoResponse> {
    let logged_in = state.access_service.login(payload.email, payload.password).await?;
    Ok(Envelope::ok("Login success!", logged_in))
}

pub async fn logout(State(state): State<AppState>, AuthSession(session): AuthSession) -> Result<impl IntoResponse> {
    let deleted = state.access_service.logout(&session.record).await?;
    Ok(Envelope::ok("Logout success!", json!({ "deleted": deleted })))
}

/// Requires the caller to authenticate with `x-rtoken-id`.
pub async fn refresh_token(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<impl IntoResponse> {
    let refresh_token = session.refresh_token.ok_or_else(|| AppError::auth("Invalid Request"))?;
    let rotated = state.session_service.validate_and_rotate(&refresh_token, &session.claims, &session.record).await?;
    Ok(Envelope::ok("Get token success!", rotated))
}
