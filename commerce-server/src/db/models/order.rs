//! Order models
//!
//! Orders are created once at checkout from a non-empty cart. Monetary
//! fields are immutable afterwards; the status fields change only
//! through the order state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orders::state_machine::{OrderStatus, PaymentState};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    /// Human-readable reference, unique and issued in increasing order
    pub order_number: String,
    pub user_id: String,
    pub shipping_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentState,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_fee: i64,
    pub tax_amount: i64,
    /// `subtotal - discount + shipping + tax`
    pub total_amount: i64,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of a cart line at checkout time. Denormalized on purpose:
/// later catalog price or name changes leave historical orders intact.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub variant_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

/// Order with its line items, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
