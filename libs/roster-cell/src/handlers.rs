// libs/roster-cell/src/handlers.rs
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

use crate::models::{AssignStaffRequest, RosterError};
use crate::services::assignment::StaffAssignmentService;

#[derive(Debug, Deserialize)]
pub struct WeekRosterQuery {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub room_id: Option<String>,
}

/// Assignment request surface: commit one staff member to one room slot
/// for one week range.
#[axum::debug_handler]
pub async fn assign_staff(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<AssignStaffRequest>,
) -> Result<Json<Value>, AppError> {
    let service = StaffAssignmentService::new(&state);

    let assignment = service.assign_staff(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "assignment": assignment,
        "message": "Staff assigned"
    })))
}

#[axum::debug_handler]
pub async fn unassign_staff(
    State(state): State<Arc<AppConfig>>,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = StaffAssignmentService::new(&state);

    service.unassign_staff(assignment_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Assignment removed"
    })))
}

#[axum::debug_handler]
pub async fn get_week_roster(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<WeekRosterQuery>,
) -> Result<Json<Value>, AppError> {
    let service = StaffAssignmentService::new(&state);

    let assignments = service
        .week_roster(query.week_start, query.week_end, query.room_id.as_deref())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({ "assignments": assignments })))
}

fn map_error(e: RosterError) -> AppError {
    match e {
        RosterError::RoomOccupied => AppError::conflict("RoomOccupied", e.to_string()),
        RosterError::StaffConflict => AppError::conflict("StaffConflict", e.to_string()),
        RosterError::NotFound => AppError::not_found("NotFound", e.to_string()),
        RosterError::AllocatorBusy => AppError::conflict("Conflict", e.to_string()),
        RosterError::Validation(msg) => AppError::Validation(msg),
        RosterError::Database(msg) => AppError::Database(msg),
    }
}
