//! Parking Session API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_staff;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    // 客户自助出场/查询 (任何已登录用户)
    let customer_routes = Router::new()
        .route("/my/check-out", post(handler::self_check_out))
        .route("/my/current", get(handler::my_current));

    let staff_routes = Router::new()
        .route("/", get(handler::list))
        .route("/check-in", post(handler::check_in))
        .route("/check-out", post(handler::check_out))
        .route("/occupancy", get(handler::occupancy))
        .layer(middleware::from_fn(require_staff));

    customer_routes.merge(staff_routes)
}
