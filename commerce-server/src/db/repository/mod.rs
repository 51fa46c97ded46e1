//! Repository Module
//!
//! Per-entity data access over the shared SQLite pool. Repositories are
//! cheap to construct; handlers build them per request from
//! `ServerState`. Stock counters are deliberately absent here: the four
//! inventory operations in [`crate::inventory`] are the only legal
//! mutators of stock fields.

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod order;
pub mod payment;

pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use coupon::CouponRepository;
pub use order::OrderRepository;
pub use payment::PaymentRepository;
