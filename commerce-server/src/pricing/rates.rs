//! Shipping and tax rate provider
//!
//! Rate computation is out of scope for the core: the default provider
//! returns zero for both, matching the reference behavior. Deployments
//! with real rate rules plug in their own implementation without
//! touching the pricing contracts.

/// Supplies shipping fee and tax for a priced cart (minor units)
pub trait RateProvider: Send + Sync {
    fn shipping_fee(&self, subtotal: i64) -> i64;
    fn tax(&self, subtotal: i64) -> i64;
}

/// Zero-rate pass-through provider
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroRates;

impl RateProvider for ZeroRates {
    fn shipping_fee(&self, _subtotal: i64) -> i64 {
        0
    }

    fn tax(&self, _subtotal: i64) -> i64 {
        0
    }
}
