//! Admin API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::audit::AuditEntry;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::orders::OrderStatus;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustInventoryRequest {
    /// Signed stock correction, e.g. -3 for shrinkage
    #[validate(range(min = -100000, max = 100000))]
    pub delta: i64,
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct AdjustReceipt {
    pub variant_id: String,
    pub stock_quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ChainReport {
    pub valid: bool,
    /// Sequence number of the first entry whose hash does not match
    pub first_broken_seq: Option<i64>,
}

/// List all orders, optionally filtered by status
pub async fn list_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    user.require_admin()?;
    let orders = state
        .orders()
        .list_all(query.status, query.limit.clamp(1, 200), query.offset.max(0))
        .await?;
    Ok(Json(orders))
}

/// Drive an order through the fulfillment states
pub async fn update_order_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    user.require_admin()?;
    payload.validate()?;

    let target: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::validation(format!("Unknown order status '{}'", payload.status)))?;

    let repo = state.orders();
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;

    state
        .state_machine()
        .transition(&order, target, &user.user_id)
        .await?;

    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;
    Ok(Json(order))
}

/// Apply a signed stock correction to a variant
pub async fn adjust_inventory(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(variant_id): Path<String>,
    Json(payload): Json<AdjustInventoryRequest>,
) -> AppResult<Json<AdjustReceipt>> {
    user.require_admin()?;
    payload.validate()?;
    let stock_quantity = state
        .inventory()
        .adjust(&variant_id, payload.delta, &payload.reason, &user.user_id)
        .await?;
    Ok(Json(AdjustReceipt {
        variant_id,
        stock_quantity,
    }))
}

/// Audit trail for one entity, oldest first
pub async fn audit_trail(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    user.require_admin()?;
    let entries = state.audit.entries_for(&entity_type, &entity_id).await?;
    Ok(Json(entries))
}

/// Recompute the audit hash chain end to end
pub async fn verify_audit_chain(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ChainReport>> {
    user.require_admin()?;
    let first_broken_seq = state.audit.verify_chain().await?;
    Ok(Json(ChainReport {
        valid: first_broken_seq.is_none(),
        first_broken_seq,
    }))
}
