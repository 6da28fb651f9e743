use crate::api::AppState;
use crate::api::middleware::AuthSession;
use crate::api::response::Envelope;
use crate::api::schemas::discount::{CodeRef, CreateDiscount, DiscountAmount, ProductsForCode, UpdateDiscount};
use crate::domain::Page;
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn get_discount_amount(
    State(state): State<AppState>,
    Json(payload): Json<DiscountAmount>,
) -> Result<impl IntoResponse> {
    let adjustment = state
        .discount_service
        .get_discount_amount(&payload.code_id, payload.shop_id, payload.user_id, &payload.products)
        .await?;
    Ok(Envelope::ok("Get discount amount success!", adjustment))
}

pub async fn list_products_for_code(
    State(state): State<AppState>,
    Query(query): Query<ProductsForCode>,
) -> Result<impl IntoResponse> {
    let products = state.discount_service.list_products_for_code(&query.code, query.shop_id, query.page()).await?;
    Ok(Envelope::ok("Get products by discount code success!", products))
}

pub async fn redeem(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<CodeRef>,
) -> Result<impl IntoResponse> {
    let discount = state.discount_service.redeem(&payload.code_id, payload.shop_id, session.claims.user_id).await?;
    Ok(Envelope::ok("Redeem discount code success!", discount))
}

pub async fn cancel(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<CodeRef>,
) -> Result<impl IntoResponse> {
    let discount = state.discount_service.cancel(&payload.code_id, payload.shop_id, session.claims.user_id).await?;
    Ok(Envelope::ok("Cancel discount code success!", discount))
}

pub async fn create(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<CreateDiscount>,
) -> Result<impl IntoResponse> {
    let discount = state.discount_service.create(payload.into_new(session.claims.user_id)).await?;
    Ok(Envelope::created("Create discount code success!", discount))
}

pub async fn update(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDiscount>,
) -> Result<impl IntoResponse> {
    let discount = state.discount_service.update(session.claims.user_id, id, payload.into()).await?;
    Ok(Envelope::ok("Update discount code success!", discount))
}

pub async fn list_for_shop(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(page): Query<Page>,
) -> Result<impl IntoResponse> {
    let discounts = state.discount_service.list_codes_for_shop(session.claims.user_id, page.clamped()).await?;
    Ok(Envelope::ok("Get discount codes success!", discounts))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let discount = state.discount_service.delete(session.claims.user_id, &code).await?;
    Ok(Envelope::ok("Delete discount code success!", discount))
}
