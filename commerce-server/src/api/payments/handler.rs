//! Payment API Handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::payments::{IntentReceipt, VerifiedPayment};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntentRequest {
    #[validate(length(min = 1))]
    pub order_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(min = 1))]
    pub intent_id: String,
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    #[validate(length(min = 1))]
    pub signature: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefundRequest {
    #[validate(length(min = 1))]
    pub gateway_payment_id: String,
    /// Minor units; omitted means the full captured amount
    #[validate(range(min = 1))]
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RefundReceipt {
    pub refund_id: String,
}

/// Create (or fail on an already-paid order) a gateway payment intent
pub async fn create_intent(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateIntentRequest>,
) -> AppResult<(StatusCode, Json<IntentReceipt>)> {
    payload.validate()?;

    // The order must belong to the caller
    state
        .orders()
        .find_owned(&payload.order_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {}", payload.order_id)))?;

    let receipt = state
        .payment_verifier()
        .request_intent(&payload.order_id, &user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Verify a gateway callback; a captured payment confirms the order
pub async fn verify(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<VerifyRequest>,
) -> AppResult<Json<VerifiedPayment>> {
    payload.validate()?;
    let verified = state
        .payment_verifier()
        .verify_callback(
            &payload.intent_id,
            &payload.gateway_payment_id,
            &payload.signature,
            &user.user_id,
        )
        .await?;
    Ok(Json(verified))
}

/// Refund a captured payment (admin only)
pub async fn refund(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<RefundReceipt>> {
    user.require_admin()?;
    payload.validate()?;
    let refund_id = state
        .payment_verifier()
        .refund(&payload.gateway_payment_id, payload.amount, &user.user_id)
        .await?;
    Ok(Json(RefundReceipt { refund_id }))
}
