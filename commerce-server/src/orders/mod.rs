//! Orders
//!
//! - [`state_machine`] - legal order/payment status transitions
//! - [`checkout`] - cart-to-order orchestration
//! - [`number`] - order reference numbers

pub mod checkout;
pub mod number;
pub mod state_machine;

pub use checkout::{CheckoutOrchestrator, CheckoutReceipt, CheckoutRequest};
pub use number::OrderNumberGenerator;
pub use state_machine::{OrderStateMachine, OrderStatus, PaymentState};
