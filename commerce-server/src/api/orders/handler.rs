//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderDetail};
use crate::orders::{CheckoutReceipt, CheckoutRequest};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutPayload {
    pub shipping_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub coupon_code: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Convert the caller's cart into an order
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CheckoutPayload>,
) -> AppResult<(StatusCode, Json<CheckoutReceipt>)> {
    payload.validate()?;
    let receipt = state
        .checkout_orchestrator()
        .checkout(
            &user.user_id,
            CheckoutRequest {
                shipping_address_id: payload.shipping_address_id,
                billing_address_id: payload.billing_address_id,
                coupon_code: payload.coupon_code,
                notes: payload.notes,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// List the caller's orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders().list_for_user(&user.user_id).await?;
    Ok(Json(orders))
}

/// Get one of the caller's orders with its line items
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderDetail>> {
    let repo = state.orders();
    let order = repo
        .find_owned(&id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;
    Ok(Json(repo.detail(order).await?))
}

/// Cancel one of the caller's orders (idempotent)
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state
        .orders()
        .find_owned(&id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;

    let order = state
        .checkout_orchestrator()
        .cancel(order, &user.user_id)
        .await?;
    Ok(Json(order))
}
