//! Pricing
//!
//! - [`engine::PricingEngine`] - subtotal/discount/total for cart lines
//! - [`rates::RateProvider`] - pluggable shipping/tax stub

pub mod engine;
pub mod rates;

pub use engine::{PriceLine, PricingEngine, Quote};
pub use rates::{RateProvider, ZeroRates};
