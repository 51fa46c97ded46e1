//! Cart API
//!
//! All routes operate on the caller's own cart; ownership is implied by
//! the authenticated identity, never by an id in the path.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart).delete(handler::clear_cart))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{item_id}",
            patch(handler::update_item).delete(handler::remove_item),
        )
}
