//! Payment API
//!
//! Intent creation and callback verification are customer-facing;
//! refunds are admin-only.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/intent", post(handler::create_intent))
        .route("/verify", post(handler::verify))
        .route("/refund", post(handler::refund))
}
