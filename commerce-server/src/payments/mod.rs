//! Payments
//!
//! - [`gateway`] - external processor behind the adapter trait
//! - [`signature`] - HMAC callback signatures
//! - [`verifier`] - intent creation, callback verification, refunds

pub mod gateway;
pub mod signature;
pub mod verifier;

pub use gateway::{GatewayError, GatewayIntent, GatewayPaymentStatus, HttpPaymentGateway, PaymentGateway};
pub use signature::SignatureScheme;
pub use verifier::{IntentReceipt, PaymentVerifier, VerifiedPayment};
