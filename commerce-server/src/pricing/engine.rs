//! Pricing & Coupon Engine
//!
//! Computes subtotal, discount and total for a set of cart lines plus
//! an optional (already resolved) coupon. All intermediate percentage
//! math runs in `Decimal` and is rounded to the currency's minor unit
//! with round-half-up.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;

use crate::db::models::{Coupon, DiscountType};
use crate::pricing::rates::{RateProvider, ZeroRates};

/// One cart line as the engine sees it: unit price in minor units
#[derive(Debug, Clone, Copy)]
pub struct PriceLine {
    pub unit_price: i64,
    pub quantity: i64,
}

/// Monetary breakdown for an order, all minor units, all non-negative.
/// `total = subtotal - discount + shipping_fee + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_fee: i64,
    pub tax: i64,
    pub total: i64,
}

#[derive(Clone)]
pub struct PricingEngine {
    rates: Arc<dyn RateProvider>,
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(Arc::new(ZeroRates))
    }
}

impl PricingEngine {
    pub fn new(rates: Arc<dyn RateProvider>) -> Self {
        Self { rates }
    }

    /// Price the lines with an optional coupon.
    ///
    /// Policy (deliberate, documented): a coupon that does not apply —
    /// inactive, outside its validity window, usage cap reached, or
    /// subtotal below its minimum — degrades to zero discount instead
    /// of failing the checkout. Callers wanting strict validation must
    /// pre-check the coupon before pricing.
    ///
    /// The discount never exceeds the subtotal, so
    /// `total >= shipping + tax` always holds.
    pub fn quote(&self, lines: &[PriceLine], coupon: Option<&Coupon>, now: DateTime<Utc>) -> Quote {
        let subtotal: i64 = lines
            .iter()
            .map(|line| line.unit_price * line.quantity)
            .sum();

        let discount = coupon
            .filter(|c| c.is_applicable(subtotal, now))
            .map(|c| discount_amount(c, subtotal))
            .unwrap_or(0);

        let shipping_fee = self.rates.shipping_fee(subtotal);
        let tax = self.rates.tax(subtotal);

        Quote {
            subtotal,
            discount,
            shipping_fee,
            tax,
            total: subtotal - discount + shipping_fee + tax,
        }
    }
}

/// Discount for an applicable coupon, capped at the subtotal
fn discount_amount(coupon: &Coupon, subtotal: i64) -> i64 {
    match coupon.discount_type {
        DiscountType::Percentage => {
            let percent = Decimal::from_f64(coupon.discount_value).unwrap_or_default();
            let raw = Decimal::from(subtotal) * percent / Decimal::from(100);
            let rounded = raw
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(0);
            rounded.clamp(0, subtotal)
        }
        DiscountType::Fixed => {
            let fixed = Decimal::from_f64(coupon.discount_value)
                .unwrap_or_default()
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .unwrap_or(0);
            fixed.clamp(0, subtotal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn coupon(discount_type: DiscountType, value: f64) -> Coupon {
        Coupon {
            id: Uuid::new_v4().to_string(),
            code: "TEST".into(),
            discount_type,
            discount_value: value,
            min_purchase_amount: None,
            max_uses: None,
            current_uses: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn lines(pairs: &[(i64, i64)]) -> Vec<PriceLine> {
        pairs
            .iter()
            .map(|&(unit_price, quantity)| PriceLine {
                unit_price,
                quantity,
            })
            .collect()
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let quote = PricingEngine::default().quote(&lines(&[(250, 2), (100, 5)]), None, Utc::now());
        assert_eq!(quote.subtotal, 1000);
        assert_eq!(quote.discount, 0);
        assert_eq!(quote.total, 1000);
    }

    #[test]
    fn percentage_coupon() {
        let c = coupon(DiscountType::Percentage, 10.0);
        let quote = PricingEngine::default().quote(&lines(&[(1000, 1)]), Some(&c), Utc::now());
        assert_eq!(quote.subtotal, 1000);
        assert_eq!(quote.discount, 100);
        assert_eq!(quote.total, 900);
    }

    #[test]
    fn percentage_rounds_half_up() {
        // 105 * 10% = 10.5 -> 11
        let c = coupon(DiscountType::Percentage, 10.0);
        let quote = PricingEngine::default().quote(&lines(&[(105, 1)]), Some(&c), Utc::now());
        assert_eq!(quote.discount, 11);
    }

    #[test]
    fn fixed_coupon_capped_at_subtotal() {
        let c = coupon(DiscountType::Fixed, 100.0);
        let quote = PricingEngine::default().quote(&lines(&[(50, 1)]), Some(&c), Utc::now());
        assert_eq!(quote.discount, 50);
        assert_eq!(quote.total, 0);
    }

    #[test]
    fn below_minimum_degrades_to_zero_discount() {
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.min_purchase_amount = Some(5000);
        let quote = PricingEngine::default().quote(&lines(&[(1000, 1)]), Some(&c), Utc::now());
        assert_eq!(quote.discount, 0);
        assert_eq!(quote.total, 1000);
    }

    #[test]
    fn inactive_coupon_yields_zero() {
        let mut c = coupon(DiscountType::Fixed, 100.0);
        c.is_active = false;
        let quote = PricingEngine::default().quote(&lines(&[(1000, 1)]), Some(&c), Utc::now());
        assert_eq!(quote.discount, 0);
    }

    #[test]
    fn expired_window_yields_zero() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.valid_until = Some(now - Duration::days(1));
        let quote = PricingEngine::default().quote(&lines(&[(1000, 1)]), Some(&c), now);
        assert_eq!(quote.discount, 0);

        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.valid_from = Some(now + Duration::days(1));
        let quote = PricingEngine::default().quote(&lines(&[(1000, 1)]), Some(&c), now);
        assert_eq!(quote.discount, 0);
    }

    #[test]
    fn exhausted_usage_cap_yields_zero() {
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.max_uses = Some(3);
        c.current_uses = 3;
        let quote = PricingEngine::default().quote(&lines(&[(1000, 1)]), Some(&c), Utc::now());
        assert_eq!(quote.discount, 0);
    }

    #[test]
    fn empty_lines_price_to_zero() {
        let quote = PricingEngine::default().quote(&[], None, Utc::now());
        assert_eq!(
            quote,
            Quote {
                subtotal: 0,
                discount: 0,
                shipping_fee: 0,
                tax: 0,
                total: 0
            }
        );
    }
}
