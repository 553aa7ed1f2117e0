// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{BookSlotRequest, BookingError, UpdateBookingStatusRequest};
use crate::services::allocator::BookingAllocatorService;

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
}

/// Booking request surface: allocate a slot and hand back the committed
/// booking including its queue number.
#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BookSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let allocator = BookingAllocatorService::new(&state);

    let booking = allocator.book_slot(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Slot booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let allocator = BookingAllocatorService::new(&state);

    let booking = allocator.get_booking(booking_id).await.map_err(map_error)?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Value>, AppError> {
    let allocator = BookingAllocatorService::new(&state);

    let bookings = allocator
        .list_bookings(query.doctor_id, query.date)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "bookings": bookings })))
}

#[axum::debug_handler]
pub async fn update_booking_status(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<UpdateBookingStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let allocator = BookingAllocatorService::new(&state);

    let booking = allocator
        .update_status(booking_id, request.status)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking status updated"
    })))
}

fn map_error(e: BookingError) -> AppError {
    match e {
        BookingError::OwnerNotFound => AppError::not_found("OwnerNotFound", e.to_string()),
        BookingError::SlotTaken => AppError::conflict("SlotTaken", e.to_string()),
        BookingError::NotFound => AppError::not_found("NotFound", e.to_string()),
        BookingError::InvalidStatusTransition(_) => AppError::Validation(e.to_string()),
        BookingError::AllocatorBusy => AppError::conflict("Conflict", e.to_string()),
        BookingError::Validation(msg) => AppError::Validation(msg),
        BookingError::Database(msg) => AppError::Database(msg),
    }
}
