//! HTTP API
//!
//! One router per resource, merged here:
//!
//! - [`health`] - liveness probe
//! - [`cart`] - the caller's shopping cart
//! - [`orders`] - checkout, order history, cancellation
//! - [`payments`] - payment intents, gateway callbacks, refunds
//! - [`admin`] - fulfillment, inventory corrections, audit access

pub mod admin;
pub mod cart;
pub mod health;
pub mod orders;
pub mod payments;

use axum::Router;

use crate::core::ServerState;

/// Assemble the full application router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(admin::router())
        .with_state(state)
}
