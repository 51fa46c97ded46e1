//! Order State Machine
//!
//! Governs legal order-status and payment-status transitions. Every
//! transition is a total function over (current, target): either the
//! edge is legal and the new state is persisted with an audit record,
//! or the call is rejected with `InvalidTransition` and nothing
//! changes. There are no silent no-ops.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::audit::{AuditAction, AuditRecorder};
use crate::db::models::Order;
use crate::utils::{AppError, AppResult};

/// Order fulfillment status
///
/// `pending -> confirmed -> packed -> shipped -> delivered`, with
/// `cancelled` reachable from pending/confirmed and `refunded` from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Packed,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Whether the edge `self -> target` is legal
    pub fn can_transition(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        if self.is_terminal() || self == target {
            return false;
        }
        match (self, target) {
            (Pending, Confirmed) => true,
            (Confirmed, Packed) => true,
            (Packed, Shipped) => true,
            (Shipped, Delivered) => true,
            // Cancellation only before shipping; after that a return
            // flow (refund) applies instead.
            (Pending | Confirmed, Cancelled) => true,
            // Refund reachable from any non-terminal state
            (_, Refunded) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Packed => "packed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "packed" => Ok(OrderStatus::Packed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(AppError::validation(format!(
                "Unknown order status: {other}"
            ))),
        }
    }
}

/// Payment status attached to an order (and to payment rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentState {
    pub fn can_transition(self, target: PaymentState) -> bool {
        use PaymentState::*;
        matches!(
            (self, target),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
            PaymentState::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted transitions over the orders table
///
/// Updates are compare-and-set on the current status so a concurrent
/// transition surfaces as a retryable conflict instead of clobbering.
#[derive(Clone)]
pub struct OrderStateMachine {
    pool: SqlitePool,
    audit: AuditRecorder,
}

impl OrderStateMachine {
    pub fn new(pool: SqlitePool, audit: AuditRecorder) -> Self {
        Self { pool, audit }
    }

    /// Validate and persist `order -> target`, writing an audit record.
    ///
    /// `pending -> confirmed` additionally requires the order's payment
    /// status to be completed: confirmation is earned by a verified,
    /// captured payment, never asserted.
    pub async fn transition(
        &self,
        order: &Order,
        target: OrderStatus,
        actor: &str,
    ) -> AppResult<OrderStatus> {
        if !order.order_status.can_transition(target) {
            return Err(AppError::InvalidTransition {
                from: order.order_status.to_string(),
                to: target.to_string(),
            });
        }
        if target == OrderStatus::Confirmed && order.payment_status != PaymentState::Completed {
            return Err(AppError::InvalidTransition {
                from: order.order_status.to_string(),
                to: target.to_string(),
            });
        }

        let result = sqlx::query(
            "UPDATE orders SET order_status = ?1, updated_at = ?2 \
             WHERE id = ?3 AND order_status = ?4",
        )
        .bind(target)
        .bind(chrono::Utc::now())
        .bind(&order.id)
        .bind(order.order_status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race with another transition on the same order
            return Err(AppError::conflict(format!(
                "Order {} status changed concurrently",
                order.id
            )));
        }

        self.audit
            .record(
                actor,
                AuditAction::OrderStatusChanged,
                "order",
                &order.id,
                serde_json::json!({
                    "from": order.order_status,
                    "to": target,
                }),
            )
            .await?;

        Ok(target)
    }

    /// Validate and persist the order's payment status edge.
    pub async fn transition_payment(
        &self,
        order: &Order,
        target: PaymentState,
        actor: &str,
    ) -> AppResult<PaymentState> {
        if !order.payment_status.can_transition(target) {
            return Err(AppError::InvalidTransition {
                from: order.payment_status.to_string(),
                to: target.to_string(),
            });
        }

        let result = sqlx::query(
            "UPDATE orders SET payment_status = ?1, updated_at = ?2 \
             WHERE id = ?3 AND payment_status = ?4",
        )
        .bind(target)
        .bind(chrono::Utc::now())
        .bind(&order.id)
        .bind(order.payment_status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Order {} payment status changed concurrently",
                order.id
            )));
        }

        self.audit
            .record(
                actor,
                AuditAction::OrderPaymentStateChanged,
                "order",
                &order.id,
                serde_json::json!({
                    "from": order.payment_status,
                    "to": target,
                }),
            )
            .await?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_legal() {
        use OrderStatus::*;
        for (from, to) in [
            (Pending, Confirmed),
            (Confirmed, Packed),
            (Packed, Shipped),
            (Shipped, Delivered),
        ] {
            assert!(from.can_transition(to), "{from} -> {to} should be legal");
        }
    }

    #[test]
    fn cancellation_only_before_shipping() {
        use OrderStatus::*;
        assert!(Pending.can_transition(Cancelled));
        assert!(Confirmed.can_transition(Cancelled));
        assert!(!Packed.can_transition(Cancelled));
        assert!(!Shipped.can_transition(Cancelled));
    }

    #[test]
    fn refund_reachable_from_non_terminal() {
        use OrderStatus::*;
        assert!(Pending.can_transition(Refunded));
        assert!(Shipped.can_transition(Refunded));
        assert!(!Delivered.can_transition(Refunded));
        assert!(!Cancelled.can_transition(Refunded));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        use OrderStatus::*;
        for terminal in [Delivered, Cancelled, Refunded] {
            for target in [
                Pending, Confirmed, Packed, Shipped, Delivered, Cancelled, Refunded,
            ] {
                assert!(!terminal.can_transition(target));
            }
        }
    }

    #[test]
    fn no_backwards_edges() {
        use OrderStatus::*;
        assert!(!Shipped.can_transition(Pending));
        assert!(!Confirmed.can_transition(Pending));
        assert!(!Packed.can_transition(Confirmed));
    }

    #[test]
    fn self_transition_rejected() {
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Pending));
    }

    #[test]
    fn payment_edges() {
        use PaymentState::*;
        assert!(Pending.can_transition(Completed));
        assert!(Pending.can_transition(Failed));
        assert!(Completed.can_transition(Refunded));
        assert!(!Failed.can_transition(Completed));
        assert!(!Refunded.can_transition(Pending));
        assert!(!Pending.can_transition(Refunded));
    }
}
