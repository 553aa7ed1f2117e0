// libs/scheduling-cell/src/handlers.rs
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

use crate::models::{CreateSessionWindowRequest, SchedulingError, UpdateSessionWindowRequest};
use crate::services::windows::SessionWindowService;

#[derive(Debug, Deserialize)]
pub struct DayScheduleQuery {
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn create_session_window(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateSessionWindowRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SessionWindowService::new(&state);

    let window = service.create_window(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "window": window,
        "message": "Session window created"
    })))
}

#[axum::debug_handler]
pub async fn list_session_windows(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionWindowService::new(&state);

    let windows = service.list_windows(doctor_id).await.map_err(map_error)?;

    Ok(Json(json!({ "windows": windows })))
}

#[axum::debug_handler]
pub async fn update_session_window(
    State(state): State<Arc<AppConfig>>,
    Path(window_id): Path<Uuid>,
    Json(request): Json<UpdateSessionWindowRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SessionWindowService::new(&state);

    let window = service.update_window(window_id, request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "window": window,
        "message": "Session window updated"
    })))
}

#[axum::debug_handler]
pub async fn delete_session_window(
    State(state): State<Arc<AppConfig>>,
    Path(window_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionWindowService::new(&state);

    service.delete_window(window_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Session window deleted"
    })))
}

/// Availability query surface: bookable slots for one doctor on one date.
#[axum::debug_handler]
pub async fn get_day_schedule(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<DayScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let service = SessionWindowService::new(&state);

    let schedule = service.day_schedule(doctor_id, query.date).await.map_err(map_error)?;

    Ok(Json(json!(schedule)))
}

fn map_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::InvalidWindow
        | SchedulingError::InvalidGranularity
        | SchedulingError::Validation(_) => AppError::Validation(e.to_string()),
        SchedulingError::WindowNotFound => AppError::not_found("NotFound", e.to_string()),
        SchedulingError::NoSessionWindows => AppError::not_found("OwnerNotFound", e.to_string()),
        SchedulingError::WindowOverlap => AppError::conflict("Conflict", e.to_string()),
        SchedulingError::Database(msg) => AppError::Database(msg),
    }
}
