//! Order API
//!
//! Checkout creates orders from the cart; reads are scoped to the
//! caller. Fulfillment transitions live under the admin routes.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::checkout).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", post(handler::cancel))
}
