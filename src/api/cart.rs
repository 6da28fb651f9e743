use crate::api::AppState;
use crate::api::response::Envelope;
use crate::api::schemas::cart::{AddToCart, CartQuery, DeleteCartItem, UpdateCart};
use crate::error::Result;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

pub async fn add(State(state): State<AppState>, Json(payload): Json<AddToCart>) -> Result<impl IntoResponse> {
    let cart = state.cart_service.add_to_cart(payload.user_id, payload.product).await?;
    Ok(Envelope::created("Add to cart success!", cart))
}

pub async fn update(State(state): State<AppState>, Json(payload): Json<UpdateCart>) -> Result<impl IntoResponse> {
    let change = payload.first_change()?;
    let cart = state.cart_service.update(payload.user_id, change).await?;
    Ok(Envelope::ok("Update cart success!", cart))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Json(payload): Json<DeleteCartItem>,
) -> Result<impl IntoResponse> {
    let deleted = state.cart_service.delete_item(payload.user_id, payload.product_id).await?;
    Ok(Envelope::ok("Delete cart item success!", json!({ "deleted": deleted })))
}

pub async fn get(State(state): State<AppState>, Query(query): Query<CartQuery>) -> Result<impl IntoResponse> {
    let cart = state.cart_service.get_cart(query.user_id).await?;
    Ok(Envelope::ok("Get cart success!", cart))
}
