//! Cart models
//!
//! A cart is ephemeral: created lazily on first add, owned by exactly
//! one user, deleted (cleared) on order creation or explicit clear.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub variant_id: String,
    pub quantity: i64,
    pub added_at: DateTime<Utc>,
}

/// Cart line joined with current catalog data (price and name at read
/// time). This is the checkout input; the orchestrator snapshots these
/// values into order lines.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub item_id: String,
    pub variant_id: String,
    pub sku: String,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i64,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity
    }
}
