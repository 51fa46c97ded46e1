//! Commerce Server - checkout-to-fulfillment backend
//!
//! The core of a storefront: carts, pricing, inventory reservation,
//! order lifecycle, payment verification and an audit trail. Identity
//! comes from a fronting auth service; catalog writes and payment
//! capture live elsewhere.
//!
//! # Module structure
//!
//! ```text
//! commerce-server/src/
//! ├── core/      # configuration, shared state, HTTP server
//! ├── auth/      # trusted-header identity extraction
//! ├── db/        # pool setup, models, repositories
//! ├── inventory/ # stock reservation ledger
//! ├── pricing/   # quote and coupon engine
//! ├── orders/    # state machine, checkout orchestration
//! ├── payments/  # gateway adapter, signature check, verifier
//! ├── audit/     # hash-chained audit log
//! ├── api/       # HTTP routes and handlers
//! └── utils/     # errors, logging
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod utils;

// Re-export the types nearly every caller needs
pub use audit::{AuditAction, AuditRecorder};
pub use auth::{CurrentUser, Role};
pub use core::{Config, Server, ServerState};
pub use db::DbService;
pub use inventory::InventoryManager;
pub use orders::{CheckoutOrchestrator, OrderStateMachine, OrderStatus, PaymentState};
pub use payments::{PaymentGateway, PaymentVerifier, SignatureScheme};
pub use pricing::PricingEngine;
pub use utils::{AppError, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security event logging - routed to its own target so the subscriber
// can split it into a dedicated sink
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
