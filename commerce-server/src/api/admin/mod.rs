//! Admin API
//!
//! Fulfillment transitions, inventory corrections and audit access.
//! Every handler checks the admin role before touching anything.

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::list_orders))
        .route("/orders/{id}/status", patch(handler::update_order_status))
        .route("/inventory/{variant_id}", patch(handler::adjust_inventory))
        .route("/audit/{entity_type}/{entity_id}", get(handler::audit_trail))
        .route("/audit/verify", get(handler::verify_audit_chain))
}
