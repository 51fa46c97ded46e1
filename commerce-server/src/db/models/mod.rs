//! Database models
//!
//! Row structs for the ledger tables. Monetary fields are integer
//! minor units throughout.

pub mod cart;
pub mod coupon;
pub mod order;
pub mod payment;
pub mod variant;

pub use cart::{Cart, CartItem, CartLine};
pub use coupon::{Coupon, DiscountType};
pub use order::{Order, OrderDetail, OrderItem};
pub use payment::Payment;
pub use variant::Variant;
