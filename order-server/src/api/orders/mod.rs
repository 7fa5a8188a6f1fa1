//! Order API Module
//!
//! Orders and their immutable versions. Pricing and numbering happen in
//! [`OrderService`](crate::orders::OrderService).

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/status", put(handler::update_status))
        // Versions
        .route(
            "/{id}/versions",
            get(handler::list_versions).delete(handler::delete_versions),
        )
        .route("/{id}/versions/latest", get(handler::get_latest_version))
        .route("/{id}/versions/{version}", get(handler::get_version))
}
