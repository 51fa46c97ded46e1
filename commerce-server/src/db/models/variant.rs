//! Sellable variant — the unit inventory and pricing apply to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A purchasable product variant with its stock counters.
///
/// Invariant (also enforced by CHECK constraints):
/// `0 <= reserved_quantity <= stock_quantity`, so
/// `available = stock - reserved` never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Variant {
    pub id: String,
    pub sku: String,
    pub product_name: String,
    /// Current catalog price in minor units
    pub unit_price: i64,
    pub stock_quantity: i64,
    pub reserved_quantity: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    /// Stock available for new reservations
    pub fn available(&self) -> i64 {
        self.stock_quantity - self.reserved_quantity
    }
}
