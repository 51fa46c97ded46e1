//! Checkout Orchestrator
//!
//! Coordinates cart read -> pricing -> inventory reservation -> order
//! persistence -> cart clear as one logical unit. There is no global
//! lock across the steps: each step is individually safe and any
//! failure after reservations were taken triggers an explicit
//! compensating release (saga-style), so no partial order is ever
//! persisted.

use std::sync::Arc;

use chrono::Utc;

use crate::audit::{AuditAction, AuditRecorder};
use crate::db::models::{CartLine, Order};
use crate::db::repository::{CartRepository, CouponRepository, OrderRepository};
use crate::db::repository::order::{NewOrder, NewOrderItem};
use crate::inventory::InventoryManager;
use crate::orders::number::OrderNumberGenerator;
use crate::orders::state_machine::{OrderStateMachine, OrderStatus};
use crate::pricing::{PriceLine, PricingEngine};
use crate::utils::{AppError, AppResult};

/// Checkout input, identity supplied by the auth collaborator
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub shipping_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// What the caller gets back from a successful checkout
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub order_number: String,
    pub total: i64,
}

#[derive(Clone)]
pub struct CheckoutOrchestrator {
    carts: CartRepository,
    coupons: CouponRepository,
    orders: OrderRepository,
    inventory: InventoryManager,
    pricing: PricingEngine,
    machine: OrderStateMachine,
    numbers: Arc<OrderNumberGenerator>,
    audit: AuditRecorder,
}

impl CheckoutOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        carts: CartRepository,
        coupons: CouponRepository,
        orders: OrderRepository,
        inventory: InventoryManager,
        pricing: PricingEngine,
        machine: OrderStateMachine,
        numbers: Arc<OrderNumberGenerator>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            carts,
            coupons,
            orders,
            inventory,
            pricing,
            machine,
            numbers,
            audit,
        }
    }

    /// Convert the user's cart into a priced, stock-reserved order.
    pub async fn checkout(
        &self,
        user_id: &str,
        request: CheckoutRequest,
    ) -> AppResult<CheckoutReceipt> {
        // 1. Cart lines, with price and name snapshotted at read time
        let lines = self.carts.lines(user_id).await?;
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }

        // 2-3. Price, resolving the coupon if one was supplied
        let coupon = match &request.coupon_code {
            Some(code) => self.coupons.find_by_code(code).await?,
            None => None,
        };
        let price_lines: Vec<PriceLine> = lines
            .iter()
            .map(|line| PriceLine {
                unit_price: line.unit_price,
                quantity: line.quantity,
            })
            .collect();
        let quote = self
            .pricing
            .quote(&price_lines, coupon.as_ref(), Utc::now());

        // 4. Reserve stock line by line; on any failure release what was
        //    already taken in this call and surface the offending variant.
        let mut reserved: Vec<&CartLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            match self
                .inventory
                .reserve(&line.variant_id, line.quantity, user_id)
                .await
            {
                Ok(()) => reserved.push(line),
                Err(err) => {
                    self.release_all(&reserved, user_id).await;
                    return Err(err);
                }
            }
        }

        // 5. Persist order + lines as one durable unit
        let order_number = self.numbers.next();
        let new_order = NewOrder {
            order_number,
            user_id: user_id.to_string(),
            shipping_address_id: request.shipping_address_id,
            billing_address_id: request.billing_address_id,
            subtotal: quote.subtotal,
            discount_amount: quote.discount,
            shipping_fee: quote.shipping_fee,
            tax_amount: quote.tax,
            total_amount: quote.total,
            // Only record the code when it actually discounted something
            coupon_code: coupon
                .as_ref()
                .filter(|_| quote.discount > 0)
                .map(|c| c.code.clone()),
            notes: request.notes,
        };
        let items: Vec<NewOrderItem> = lines
            .iter()
            .map(|line| NewOrderItem {
                variant_id: line.variant_id.clone(),
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                total_price: line.line_total(),
            })
            .collect();

        let order: Order = match self.orders.create_with_items(new_order, items).await {
            Ok(order) => order,
            Err(err) => {
                // Reservation holds must not outlive a failed checkout
                self.release_all(&reserved, user_id).await;
                return Err(err);
            }
        };

        // Past the durable commit point. Counter increment and cart
        // clear happen exactly here so a retried checkout attempt can
        // never double-count the coupon.
        if let Some(code) = &order.coupon_code {
            if self.coupons.redeem(code).await? {
                self.audit
                    .record(
                        user_id,
                        AuditAction::CouponRedeemed,
                        "coupon",
                        code,
                        serde_json::json!({ "order_id": order.id }),
                    )
                    .await?;
            }
        }

        // 6. Clear the cart
        self.carts.clear(user_id).await?;

        self.audit
            .record(
                user_id,
                AuditAction::OrderCreated,
                "order",
                &order.id,
                serde_json::json!({
                    "order_number": order.order_number,
                    "subtotal": order.subtotal,
                    "discount": order.discount_amount,
                    "total": order.total_amount,
                }),
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = order.total_amount,
            "Checkout completed"
        );

        // 7. Hand back the reference the storefront shows the customer
        Ok(CheckoutReceipt {
            order_id: order.id,
            order_number: order.order_number,
            total: order.total_amount,
        })
    }

    /// Cancel an order.
    ///
    /// Idempotent: an already-cancelled order comes back unchanged.
    /// Reservations not yet committed to fulfillment return to
    /// available stock; committed stock stays deducted and flows back
    /// through the refund path, never here. The state machine rejects
    /// cancellation from packed/shipped/delivered.
    pub async fn cancel(&self, order: Order, actor: &str) -> AppResult<Order> {
        if order.order_status == OrderStatus::Cancelled {
            return Ok(order);
        }

        self.machine
            .transition(&order, OrderStatus::Cancelled, actor)
            .await?;

        for item in self.orders.items(&order.id).await? {
            if !self.inventory.is_committed(&order.id, &item.variant_id).await? {
                self.inventory
                    .release(&item.variant_id, item.quantity, actor)
                    .await?;
            }
        }

        self.audit
            .record(
                actor,
                AuditAction::OrderCancelled,
                "order",
                &order.id,
                serde_json::json!({ "order_number": order.order_number }),
            )
            .await?;

        self.orders
            .find_by_id(&order.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {}", order.id)))
    }

    /// Compensating release for every reservation taken in this call.
    /// Release failures are logged, not propagated: the caller is
    /// already unwinding a more important error.
    async fn release_all(&self, reserved: &[&CartLine], actor: &str) {
        for line in reserved {
            if let Err(err) = self
                .inventory
                .release(&line.variant_id, line.quantity, actor)
                .await
            {
                tracing::warn!(
                    variant_id = %line.variant_id,
                    error = %err,
                    "Failed to release reservation during checkout rollback"
                );
            }
        }
    }
}
