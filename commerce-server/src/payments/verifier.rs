//! Payment Verifier
//!
//! Opens payment intents and validates inbound gateway callbacks. The
//! signature check is the sole authenticity gate; the claimed contents
//! of a callback are never trusted without it, and the payment status
//! applied afterwards always comes from the gateway, not the caller.
//!
//! Verification is idempotent per order: replaying a verified callback
//! re-drives order confirmation (state machine edges and inventory
//! commits are all guarded) instead of double-applying anything.

use std::sync::Arc;

use crate::audit::{AuditAction, AuditRecorder};
use crate::db::models::{Order, Payment};
use crate::db::repository::{OrderRepository, PaymentRepository};
use crate::inventory::InventoryManager;
use crate::orders::state_machine::{OrderStateMachine, OrderStatus, PaymentState};
use crate::payments::gateway::{GatewayPaymentStatus, PaymentGateway};
use crate::payments::signature::SignatureScheme;
use crate::security_log;
use crate::utils::{AppError, AppResult};

/// Response to a created intent, handed to the storefront client
#[derive(Debug, Clone, serde::Serialize)]
pub struct IntentReceipt {
    pub intent_id: String,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

/// Outcome of a successfully verified callback
#[derive(Debug, Clone, serde::Serialize)]
pub struct VerifiedPayment {
    pub gateway_payment_id: String,
    pub order_id: String,
    pub status: &'static str,
}

#[derive(Clone)]
pub struct PaymentVerifier {
    orders: OrderRepository,
    payments: PaymentRepository,
    inventory: InventoryManager,
    machine: OrderStateMachine,
    gateway: Arc<dyn PaymentGateway>,
    signature: SignatureScheme,
    audit: AuditRecorder,
    currency: String,
}

impl PaymentVerifier {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: OrderRepository,
        payments: PaymentRepository,
        inventory: InventoryManager,
        machine: OrderStateMachine,
        gateway: Arc<dyn PaymentGateway>,
        signature: SignatureScheme,
        audit: AuditRecorder,
        currency: String,
    ) -> Self {
        Self {
            orders,
            payments,
            inventory,
            machine,
            gateway,
            signature,
            audit,
            currency,
        }
    }

    /// Ask the gateway to open an intent for the order's total and
    /// record the pending payment row.
    pub async fn request_intent(&self, order_id: &str, actor: &str) -> AppResult<IntentReceipt> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

        // One captured payment per order; further intents are refused
        if self
            .payments
            .find_verified_for_order(order_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "Order {order_id} already has a verified payment"
            )));
        }

        let intent = self
            .gateway
            .create_intent(order.total_amount, &self.currency, &order.order_number)
            .await?;

        self.payments
            .create_intent(&order.id, &intent.intent_id, intent.amount, &intent.currency)
            .await?;

        self.audit
            .record(
                actor,
                AuditAction::PaymentIntentCreated,
                "payment",
                &intent.intent_id,
                serde_json::json!({ "order_id": order.id, "amount": intent.amount }),
            )
            .await?;

        Ok(IntentReceipt {
            intent_id: intent.intent_id,
            order_id: order.id,
            amount: intent.amount,
            currency: intent.currency,
        })
    }

    /// Validate a gateway callback and, on a captured payment, drive
    /// the order to confirmed with its stock committed.
    pub async fn verify_callback(
        &self,
        intent_id: &str,
        gateway_payment_id: &str,
        signature: &str,
        actor: &str,
    ) -> AppResult<VerifiedPayment> {
        let payment = self
            .payments
            .find_by_intent(intent_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment for intent {intent_id}")))?;

        // Sole authenticity gate, replays included. Constant-time
        // compare; on mismatch no state changes and the expected value
        // never leaves the process.
        if !self
            .signature
            .verify(intent_id, gateway_payment_id, signature)
        {
            security_log!(
                "WARN",
                "payment_signature_mismatch",
                intent_id = intent_id,
                gateway_payment_id = gateway_payment_id
            );
            return Err(AppError::InvalidSignature);
        }

        // Replay of an already-verified callback: confirmation is
        // re-driven in case an earlier attempt died between payment
        // verification and order confirmation.
        if payment.verified && payment.gateway_payment_id.as_deref() == Some(gateway_payment_id) {
            self.confirm_order(&payment, actor).await?;
            return Ok(VerifiedPayment {
                gateway_payment_id: gateway_payment_id.to_string(),
                order_id: payment.order_id,
                status: "captured",
            });
        }

        // Authoritative status from the gateway, never from the caller
        let status = self.gateway.fetch_status(gateway_payment_id).await?;

        if !status.is_captured() {
            if status == GatewayPaymentStatus::Failed {
                self.payments
                    .mark_status(intent_id, PaymentState::Failed)
                    .await?;
                self.audit
                    .record(
                        actor,
                        AuditAction::PaymentFailed,
                        "payment",
                        intent_id,
                        serde_json::json!({ "gateway_payment_id": gateway_payment_id }),
                    )
                    .await?;
            }
            return Err(AppError::PaymentNotCaptured);
        }

        self.payments
            .mark_verified(intent_id, gateway_payment_id, signature)
            .await?;

        self.audit
            .record(
                actor,
                AuditAction::PaymentVerified,
                "payment",
                intent_id,
                serde_json::json!({
                    "gateway_payment_id": gateway_payment_id,
                    "order_id": payment.order_id,
                }),
            )
            .await?;

        self.confirm_order(&payment, actor).await?;

        Ok(VerifiedPayment {
            gateway_payment_id: gateway_payment_id.to_string(),
            order_id: payment.order_id,
            status: "captured",
        })
    }

    /// Refund through the gateway; full amount when none given.
    pub async fn refund(
        &self,
        gateway_payment_id: &str,
        amount: Option<i64>,
        actor: &str,
    ) -> AppResult<String> {
        let payment = self
            .payments
            .find_by_gateway_payment(gateway_payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment {gateway_payment_id}")))?;

        if payment.payment_status != PaymentState::Completed {
            return Err(AppError::conflict(format!(
                "Payment {gateway_payment_id} is not refundable in state {}",
                payment.payment_status
            )));
        }

        let refund_id = self
            .gateway
            .refund(gateway_payment_id, amount.or(Some(payment.amount)))
            .await?;

        self.payments.mark_refunded(gateway_payment_id).await?;

        if let Some(order) = self.orders.find_by_id(&payment.order_id).await? {
            if order.payment_status == PaymentState::Completed {
                self.machine
                    .transition_payment(&order, PaymentState::Refunded, actor)
                    .await?;
            }
        }

        self.audit
            .record(
                actor,
                AuditAction::PaymentRefunded,
                "payment",
                gateway_payment_id,
                serde_json::json!({
                    "order_id": payment.order_id,
                    "amount": amount.unwrap_or(payment.amount),
                    "refund_id": refund_id,
                }),
            )
            .await?;

        Ok(refund_id)
    }

    /// Drive the paid order to confirmed and commit its reservations.
    /// Every step is guarded, so calling this again after a partial
    /// failure finishes the remaining work and nothing else.
    async fn confirm_order(&self, payment: &Payment, actor: &str) -> AppResult<()> {
        let order = self.load_order(&payment.order_id).await?;

        if matches!(
            order.order_status,
            OrderStatus::Cancelled | OrderStatus::Refunded
        ) {
            // A captured payment for a cancelled/refunded order is an
            // operational conflict to resolve via refund, not a confirm.
            return Err(AppError::conflict(format!(
                "Order {} is {} and cannot be confirmed",
                order.id, order.order_status
            )));
        }

        if order.payment_status == PaymentState::Pending {
            self.machine
                .transition_payment(&order, PaymentState::Completed, actor)
                .await?;
        }

        let order = self.load_order(&payment.order_id).await?;
        if order.order_status == OrderStatus::Pending {
            self.machine
                .transition(&order, OrderStatus::Confirmed, actor)
                .await?;
        }

        for item in self.orders.items(&order.id).await? {
            self.inventory
                .commit(&order.id, &item.variant_id, item.quantity, actor)
                .await?;
        }

        Ok(())
    }

    async fn load_order(&self, order_id: &str) -> AppResult<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))
    }
}
