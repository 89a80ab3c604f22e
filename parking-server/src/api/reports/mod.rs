//! Reporting API 模块

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{require_admin, require_staff};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reports", routes())
}

fn routes() -> Router<ServerState> {
    let staff_routes = Router::new()
        .route("/dashboard", get(handler::dashboard))
        .layer(middleware::from_fn(require_staff));

    let admin_routes = Router::new()
        .route("/", get(handler::reports))
        .layer(middleware::from_fn(require_admin));

    staff_routes.merge(admin_routes)
}
