// libs/booking-cell/src/services/allocator.rs
//
// Booking allocation with a critical section per (doctor, date). The slot
// check and the queue-number computation run under a persisted advisory
// lock; a unique index on (doctor_id, session_date, slot_time) backstops
// the race so the loser gets a rejection, never a duplicate row.

use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use scheduling_cell::models::SessionWindow;
use scheduling_cell::services::slots::{generate_slots, SLOT_GRANULARITY_MINUTES};
use shared_config::AppConfig;
use shared_database::locks::SlotLockService;
use shared_database::postgrest::{DbError, PostgrestClient};
use shared_models::schedule::{format_hhmm, DayOfWeek};

use crate::models::{Booking, BookingError, BookSlotRequest, BookingStatus};

const WINDOWS_PATH: &str = "/rest/v1/session_windows";
const BOOKINGS_PATH: &str = "/rest/v1/bookings";

const MAX_PATIENT_AGE: i32 = 120;

pub struct BookingAllocatorService {
    db: Arc<PostgrestClient>,
    locks: SlotLockService,
    max_lock_attempts: u32,
}

impl BookingAllocatorService {
    pub fn new(config: &AppConfig) -> Self {
        let db = Arc::new(PostgrestClient::new(config));
        let locks = SlotLockService::new(Arc::clone(&db));

        Self {
            db,
            locks,
            max_lock_attempts: 3,
        }
    }

    /// Allocate a slot for a patient. Validates the request, confirms the
    /// doctor has session windows covering the slot, then commits the
    /// booking inside the (doctor, date) critical section.
    pub async fn book_slot(&self, request: BookSlotRequest) -> Result<Booking, BookingError> {
        info!(
            "Booking slot {} on {} for doctor {}",
            format_hhmm(request.slot_time),
            request.date,
            request.doctor_id
        );

        self.validate_request(&request)?;

        let windows = self.doctor_windows(request.doctor_id).await?;
        if windows.is_empty() {
            return Err(BookingError::OwnerNotFound);
        }

        self.check_slot_in_session(&windows, request.date, request.slot_time)?;

        let lock_key = format!("booking_{}_{}", request.doctor_id, request.date);

        for attempt in 1..=self.max_lock_attempts {
            let acquired = self
                .locks
                .acquire(&lock_key)
                .await
                .map_err(|e| BookingError::Database(e.to_string()))?;

            if acquired {
                let outcome = self.allocate_locked(&request).await;

                if let Err(e) = self.locks.release(&lock_key).await {
                    // Expiry reclaims the key; the commit outcome stands.
                    warn!("Failed to release booking lock {}: {}", lock_key, e);
                }

                return outcome;
            }

            warn!(
                "Booking lock contention on {} (attempt {}/{})",
                lock_key, attempt, self.max_lock_attempts
            );
            tokio::time::sleep(tokio::time::Duration::from_millis(50 * attempt as u64)).await;
        }

        Err(BookingError::AllocatorBusy)
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        debug!("Fetching booking: {}", booking_id);

        let path = format!("{}?id=eq.{}", BOOKINGS_PATH, booking_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        let found = result.first().ok_or(BookingError::NotFound)?;

        serde_json::from_value(found.clone())
            .map_err(|e| BookingError::Database(format!("Failed to parse booking: {}", e)))
    }

    /// Bookings for one doctor on one date, in queue order.
    pub async fn list_bookings(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingError> {
        let path = format!(
            "{}?doctor_id=eq.{}&session_date=eq.{}&order=queue_number.asc",
            BOOKINGS_PATH, doctor_id, date
        );

        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Booking>, _>>()
            .map_err(|e| BookingError::Database(format!("Failed to parse bookings: {}", e)))
    }

    /// Move a booking forward through its lifecycle. Backward transitions
    /// are rejected; queue numbers never change.
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
    ) -> Result<Booking, BookingError> {
        debug!("Updating booking {} status to {}", booking_id, new_status);

        let current = self.get_booking(booking_id).await?;

        if !current.status.can_transition_to(&new_status) {
            warn!(
                "Invalid booking status transition attempted: {} -> {}",
                current.status, new_status
            );
            return Err(BookingError::InvalidStatusTransition(current.status));
        }

        let update_data = json!({
            "status": new_status,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("{}?id=eq.{}", BOOKINGS_PATH, booking_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .db
            .request_with_headers(Method::PATCH, &path, Some(update_data), Some(headers))
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        let updated = result.first().ok_or(BookingError::NotFound)?;

        let booking: Booking = serde_json::from_value(updated.clone())
            .map_err(|e| BookingError::Database(format!("Failed to parse booking: {}", e)))?;

        info!("Booking {} moved to {}", booking_id, booking.status);
        Ok(booking)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    /// The critical section body: re-check the slot, compute the next
    /// queue number from the committed count, insert. Runs only while the
    /// (doctor, date) lock is held.
    async fn allocate_locked(&self, request: &BookSlotRequest) -> Result<Booking, BookingError> {
        let existing = self.bookings_for_day(request.doctor_id, request.date).await?;

        if existing.iter().any(|b| b.slot_time == request.slot_time) {
            warn!(
                "Slot {} on {} already booked for doctor {}",
                format_hhmm(request.slot_time),
                request.date,
                request.doctor_id
            );
            return Err(BookingError::SlotTaken);
        }

        let queue_number = existing.len() as i32 + 1;
        let now = Utc::now();

        let booking_data = json!({
            "id": Uuid::new_v4(),
            "doctor_id": request.doctor_id,
            "session_date": request.date,
            "slot_time": format_hhmm(request.slot_time),
            "queue_number": queue_number,
            "patient_name": request.patient_name,
            "patient_age": request.patient_age,
            "status": BookingStatus::Pending,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result = match self.db.insert_returning(BOOKINGS_PATH, booking_data).await {
            Ok(rows) => rows,
            // Unique-index backstop: a concurrent writer landed first.
            Err(DbError::Conflict(_)) => return Err(BookingError::SlotTaken),
            Err(e) => return Err(BookingError::Database(e.to_string())),
        };

        let created = result
            .first()
            .ok_or_else(|| BookingError::Database("Failed to create booking".to_string()))?;

        let booking: Booking = serde_json::from_value(created.clone())
            .map_err(|e| BookingError::Database(format!("Failed to parse created booking: {}", e)))?;

        info!(
            "Booking {} committed with queue number {} for doctor {}",
            booking.id, booking.queue_number, booking.doctor_id
        );

        Ok(booking)
    }

    async fn bookings_for_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, BookingError> {
        let path = format!(
            "{}?doctor_id=eq.{}&session_date=eq.{}",
            BOOKINGS_PATH, doctor_id, date
        );

        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Booking>, _>>()
            .map_err(|e| BookingError::Database(format!("Failed to parse bookings: {}", e)))
    }

    async fn doctor_windows(&self, doctor_id: Uuid) -> Result<Vec<SessionWindow>, BookingError> {
        let path = format!("{}?doctor_id=eq.{}", WINDOWS_PATH, doctor_id);

        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<SessionWindow>, _>>()
            .map_err(|e| BookingError::Database(format!("Failed to parse session windows: {}", e)))
    }

    /// The requested slot must be one the generator would produce for a
    /// window covering the date's weekday.
    fn check_slot_in_session(
        &self,
        windows: &[SessionWindow],
        date: NaiveDate,
        slot_time: NaiveTime,
    ) -> Result<(), BookingError> {
        let day = DayOfWeek::from_date(date);

        for window in windows.iter().filter(|w| w.day_of_week == day) {
            let slots = generate_slots(window, SLOT_GRANULARITY_MINUTES)
                .map_err(|e| BookingError::Validation(e.to_string()))?;

            if slots.contains(&slot_time) {
                return Ok(());
            }
        }

        Err(BookingError::Validation(
            "Requested slot is outside the doctor's session hours".to_string(),
        ))
    }

    fn validate_request(&self, request: &BookSlotRequest) -> Result<(), BookingError> {
        if request.patient_name.trim().is_empty() {
            return Err(BookingError::Validation("patient_name must not be empty".to_string()));
        }

        if request.patient_age <= 0 || request.patient_age > MAX_PATIENT_AGE {
            return Err(BookingError::Validation(format!(
                "patient_age must be between 1 and {}",
                MAX_PATIENT_AGE
            )));
        }

        Ok(())
    }
}
