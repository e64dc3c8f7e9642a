//! Bill API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/bills", bill_routes())
}

fn bill_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::finalize).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
}
