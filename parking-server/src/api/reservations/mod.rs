//! Reservation API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_staff;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reservations", routes())
}

fn routes() -> Router<ServerState> {
    // 客户端点 (归属检查在 handler 内完成)
    let customer_routes = Router::new()
        .route("/", post(handler::create))
        .route("/mine", get(handler::mine))
        .route("/{id}", put(handler::update))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/confirm", post(handler::confirm));

    let staff_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_staff));

    customer_routes.merge(staff_routes)
}
