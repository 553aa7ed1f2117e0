// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_slot).get(handlers::list_bookings))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/status", patch(handlers::update_booking_status))
        .with_state(state)
}
