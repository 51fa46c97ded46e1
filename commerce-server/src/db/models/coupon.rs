//! Coupon model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// A discount code.
///
/// `discount_value` is interpreted per type: percent for
/// [`DiscountType::Percentage`] (10.0 = 10%), minor units for
/// [`DiscountType::Fixed`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    /// Subtotal (minor units) the cart must reach for the coupon to apply
    pub min_purchase_amount: Option<i64>,
    pub max_uses: Option<i64>,
    pub current_uses: i64,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether this coupon applies to a cart with the given subtotal.
    ///
    /// Applicable only if active, inside the validity window, not over
    /// its usage cap, and the subtotal meets the minimum threshold.
    pub fn is_applicable(&self, subtotal: i64, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(from) = self.valid_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        if let Some(cap) = self.max_uses {
            if self.current_uses >= cap {
                return false;
            }
        }
        if let Some(min) = self.min_purchase_amount {
            if subtotal < min {
                return false;
            }
        }
        true
    }
}
