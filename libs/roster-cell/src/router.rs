// libs/roster-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn roster_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/assignments", post(handlers::assign_staff).get(handlers::get_week_roster))
        .route("/assignments/{assignment_id}", delete(handlers::unassign_staff))
        .with_state(state)
}
