// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn session_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Administrator window management
        .route("/windows", post(handlers::create_session_window))
        .route(
            "/windows/{window_id}",
            patch(handlers::update_session_window).delete(handlers::delete_session_window),
        )
        .route("/doctors/{doctor_id}/windows", get(handlers::list_session_windows))
        // Availability query surface
        .route("/doctors/{doctor_id}/slots", get(handlers::get_day_schedule))
        .with_state(state)
}
