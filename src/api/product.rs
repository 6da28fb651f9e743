use crate::api::AppState;
use crate::api::middleware::AuthSession;
use crate::api::response::Envelope;
use crate::api::schemas::product::{CreateProduct, ListProducts, UpdateProduct};
use crate::domain::Page;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::Value;
use uuid::Uuid;

pub async fn search(State(state): State<AppState>, Path(key): Path<String>) -> Result<impl IntoResponse> {
    let products = state.product_service.search(&key).await?;
    Ok(Envelope::ok("Get list search product success!", products))
}

pub async fn find_all(State(state): State<AppState>, Query(query): Query<ListProducts>) -> Result<impl IntoResponse> {
    let products = state.product_service.find_all_products(query.sort, query.page()).await?;
    Ok(Envelope::ok("Get list products success!", products))
}

pub async fn find_one(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse> {
    let product = state.product_service.find_product(id).await?;
    Ok(Envelope::ok("Get product success!", product))
}

pub async fn create(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<CreateProduct>,
) -> Result<impl IntoResponse> {
    let product = state.product_service.create_product(payload.into_new(session.claims.user_id)?).await?;
    Ok(Envelope::created("Create new product success!", product))
}

pub async fn update(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProduct>,
) -> Result<impl IntoResponse> {
    let product = state.product_service.update_product(session.claims.user_id, id, payload.into()).await?;
    Ok(Envelope::ok("Update product success!", product))
}

pub async fn publish(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.product_service.publish(session.claims.user_id, id).await?;
    Ok(Envelope::ok("Publish product success!", Value::Null))
}

pub async fn unpublish(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.product_service.unpublish(session.claims.user_id, id).await?;
    Ok(Envelope::ok("Unpublish product success!", Value::Null))
}

pub async fn drafts(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(page): Query<Page>,
) -> Result<impl IntoResponse> {
    let products = state.product_service.find_all_drafts_for_shop(session.claims.user_id, page.clamped()).await?;
    Ok(Envelope::ok("Get list drafts success!", products))
}

pub async fn published(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(page): Query<Page>,
) -> Result<impl IntoResponse> {
    let products = state.product_service.find_all_published_for_shop(session.claims.user_id, page.clamped()).await?;
    Ok(Envelope::ok("Get list published success!", products))
}
