// libs/booking-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_models::schedule::hhmm;

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

/// A committed reservation of one slot on one calendar date. Bookings are
/// never deleted; only their status moves, and only forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub session_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub slot_time: NaiveTime,
    pub queue_number: i32,
    pub patient_name: String,
    pub patient_age: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Channeled,
}

impl BookingStatus {
    /// Forward-only transition table. `Channeled` is terminal.
    pub fn valid_transitions(&self) -> Vec<BookingStatus> {
        match self {
            BookingStatus::Pending => vec![BookingStatus::Approved, BookingStatus::Channeled],
            BookingStatus::Approved => vec![BookingStatus::Channeled],
            BookingStatus::Channeled => vec![],
        }
    }

    pub fn can_transition_to(&self, next: &BookingStatus) -> bool {
        self.valid_transitions().contains(next)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Approved => write!(f, "approved"),
            BookingStatus::Channeled => write!(f, "channeled"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub slot_time: NaiveTime,
    pub patient_name: String,
    pub patient_age: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("No session windows exist for this doctor")]
    OwnerNotFound,

    #[error("Requested slot is already booked")]
    SlotTaken,

    #[error("Booking not found")]
    NotFound,

    #[error("Booking cannot leave its current status: {0}")]
    InvalidStatusTransition(BookingStatus),

    #[error("Booking allocator is busy for this doctor and date, try again")]
    AllocatorBusy,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}
