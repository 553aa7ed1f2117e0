use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::router::booking_routes;
use roster_cell::router::roster_routes;
use scheduling_cell::router::session_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Hospital scheduling API is running!" }))
        .nest("/sessions", session_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/roster", roster_routes(state))
}
