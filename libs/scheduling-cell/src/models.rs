// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::schedule::{hhmm, hhmm_opt, DayOfWeek};

/// A weekly-recurring bookable time range for one doctor in one room.
/// Immutable while a slot request is being served; edited only through
/// the administrator CRUD surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub room_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionWindowRequest {
    pub doctor_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSessionWindowRequest {
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default, with = "hhmm_opt")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm_opt")]
    pub end_time: Option<NaiveTime>,
    pub room_id: Option<String>,
}

/// Bookable slots for one doctor on one calendar date, after removing
/// slots already committed as bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub available_slots: Vec<String>,
    pub booked_count: i32,
    pub total_count: i32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Session window start time must be before end time")]
    InvalidWindow,

    #[error("Slot granularity must divide an hour evenly")]
    InvalidGranularity,

    #[error("Session window not found")]
    WindowNotFound,

    #[error("No session windows exist for this doctor")]
    NoSessionWindows,

    #[error("Session window overlaps an existing window for this doctor")]
    WindowOverlap,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
