// libs/roster-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::schedule::{hhmm, DayOfWeek};

/// Commitment of one staff member to one room at one recurring time key
/// for one week range. Created and deleted explicitly; never overwritten
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardAssignment {
    pub id: Uuid,
    pub room_id: String,
    pub staff_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStaffRequest {
    pub room_id: String,
    pub staff_id: Uuid,
    pub day_of_week: DayOfWeek,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

/// Outcome of checking a candidate assignment against committed state.
/// Both flags must be clear before an assignment may be written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConflicts {
    pub room_occupied: bool,
    pub staff_busy_elsewhere: bool,
}

impl RosterConflicts {
    pub fn is_clear(&self) -> bool {
        !self.room_occupied && !self.staff_busy_elsewhere
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RosterError {
    #[error("Room slot already has an assignee for this week")]
    RoomOccupied,

    #[error("Staff member is already assigned to another room at this time")]
    StaffConflict,

    #[error("Assignment not found")]
    NotFound,

    #[error("Roster allocator is busy for this slot, try again")]
    AllocatorBusy,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
