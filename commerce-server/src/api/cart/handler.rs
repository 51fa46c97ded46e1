//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::CartLine;
use crate::utils::{AppError, AppResult};

/// Cart view with per-line and overall totals in minor units
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(length(min = 1))]
    pub variant_id: String,
    #[validate(range(min = 1, max = 999))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(min = 1, max = 999))]
    pub quantity: i64,
}

/// Get the caller's cart
pub async fn get_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<CartView>> {
    let items = state.carts().lines(&user.user_id).await?;
    let subtotal = items.iter().map(CartLine::line_total).sum();
    Ok(Json(CartView { items, subtotal }))
}

/// Add a variant to the cart (merges with an existing line)
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<(StatusCode, Json<CartView>)> {
    payload.validate()?;

    // Only active catalog entries are sellable
    state
        .catalog()
        .find_active_variant(&payload.variant_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Variant {}", payload.variant_id)))?;

    let carts = state.carts();
    carts
        .add_item(&user.user_id, &payload.variant_id, payload.quantity)
        .await?;
    let items = carts.lines(&user.user_id).await?;
    let subtotal = items.iter().map(CartLine::line_total).sum();
    Ok((StatusCode::CREATED, Json(CartView { items, subtotal })))
}

/// Set the quantity of a cart line
pub async fn update_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> AppResult<Json<CartView>> {
    payload.validate()?;
    let carts = state.carts();
    carts
        .update_item(&user.user_id, &item_id, payload.quantity)
        .await?;
    let items = carts.lines(&user.user_id).await?;
    let subtotal = items.iter().map(CartLine::line_total).sum();
    Ok(Json(CartView { items, subtotal }))
}

/// Remove a cart line
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(item_id): Path<String>,
) -> AppResult<StatusCode> {
    state.carts().remove_item(&user.user_id, &item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the cart
pub async fn clear_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<StatusCode> {
    state.carts().clear(&user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
