// libs/scheduling-cell/src/services/windows.rs
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::{DbError, PostgrestClient};
use shared_models::schedule::{format_hhmm, hhmm, DayOfWeek};

use crate::models::{
    CreateSessionWindowRequest, DaySchedule, SchedulingError, SessionWindow,
    UpdateSessionWindowRequest,
};
use crate::services::slots::{available_slots, generate_slots, SLOT_GRANULARITY_MINUTES};

const WINDOWS_PATH: &str = "/rest/v1/session_windows";
const BOOKINGS_PATH: &str = "/rest/v1/bookings";

/// Slot time of a committed booking; only the field the availability
/// filter needs.
#[derive(Debug, Deserialize)]
struct BookedSlot {
    #[serde(with = "hhmm")]
    slot_time: NaiveTime,
}

pub struct SessionWindowService {
    db: PostgrestClient,
}

impl SessionWindowService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Create a recurring session window for a doctor.
    pub async fn create_window(
        &self,
        request: CreateSessionWindowRequest,
    ) -> Result<SessionWindow, SchedulingError> {
        debug!("Creating session window for doctor: {}", request.doctor_id);

        if request.start_time >= request.end_time {
            return Err(SchedulingError::InvalidWindow);
        }
        if request.room_id.trim().is_empty() {
            return Err(SchedulingError::Validation("room_id must not be empty".to_string()));
        }

        self.check_window_overlap(
            request.doctor_id,
            request.day_of_week,
            request.start_time,
            request.end_time,
            None,
        )
        .await?;

        let now = Utc::now();
        let window_data = json!({
            "id": Uuid::new_v4(),
            "doctor_id": request.doctor_id,
            "day_of_week": request.day_of_week,
            "start_time": format_hhmm(request.start_time),
            "end_time": format_hhmm(request.end_time),
            "room_id": request.room_id,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result = self
            .db
            .insert_returning(WINDOWS_PATH, window_data)
            .await
            .map_err(db_error)?;

        let created = result
            .first()
            .ok_or_else(|| SchedulingError::Database("Failed to create session window".to_string()))?;

        let window: SessionWindow = serde_json::from_value(created.clone())
            .map_err(|e| SchedulingError::Database(format!("Failed to parse session window: {}", e)))?;

        debug!("Session window created with ID: {}", window.id);
        Ok(window)
    }

    /// List a doctor's session windows, ordered by day then start time.
    pub async fn list_windows(&self, doctor_id: Uuid) -> Result<Vec<SessionWindow>, SchedulingError> {
        let path = format!(
            "{}?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            WINDOWS_PATH, doctor_id
        );

        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(db_error)?;

        let windows = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<SessionWindow>, _>>()
            .map_err(|e| SchedulingError::Database(format!("Failed to parse session windows: {}", e)))?;

        Ok(windows)
    }

    /// Update a session window in place.
    pub async fn update_window(
        &self,
        window_id: Uuid,
        request: UpdateSessionWindowRequest,
    ) -> Result<SessionWindow, SchedulingError> {
        debug!("Updating session window: {}", window_id);

        let current = self.get_window(window_id).await?;

        let start_time = request.start_time.unwrap_or(current.start_time);
        let end_time = request.end_time.unwrap_or(current.end_time);
        let day_of_week = request.day_of_week.unwrap_or(current.day_of_week);

        if start_time >= end_time {
            return Err(SchedulingError::InvalidWindow);
        }

        self.check_window_overlap(current.doctor_id, day_of_week, start_time, end_time, Some(window_id))
            .await?;

        let mut update_data = serde_json::Map::new();
        if let Some(day) = request.day_of_week {
            update_data.insert("day_of_week".to_string(), json!(day));
        }
        if let Some(start) = request.start_time {
            update_data.insert("start_time".to_string(), json!(format_hhmm(start)));
        }
        if let Some(end) = request.end_time {
            update_data.insert("end_time".to_string(), json!(format_hhmm(end)));
        }
        if let Some(room_id) = request.room_id {
            if room_id.trim().is_empty() {
                return Err(SchedulingError::Validation("room_id must not be empty".to_string()));
            }
            update_data.insert("room_id".to_string(), json!(room_id));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("{}?id=eq.{}", WINDOWS_PATH, window_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .db
            .request_with_headers(Method::PATCH, &path, Some(Value::Object(update_data)), Some(headers))
            .await
            .map_err(db_error)?;

        let updated = result
            .first()
            .ok_or(SchedulingError::WindowNotFound)?;

        serde_json::from_value(updated.clone())
            .map_err(|e| SchedulingError::Database(format!("Failed to parse session window: {}", e)))
    }

    /// Delete a session window.
    pub async fn delete_window(&self, window_id: Uuid) -> Result<(), SchedulingError> {
        debug!("Deleting session window: {}", window_id);

        let removed = self
            .db
            .delete_returning(&format!("{}?id=eq.{}", WINDOWS_PATH, window_id))
            .await
            .map_err(db_error)?;

        if removed.is_empty() {
            return Err(SchedulingError::WindowNotFound);
        }

        Ok(())
    }

    /// Bookable slots for a doctor on a calendar date: expand every window
    /// matching the date's weekday, then drop slots already committed as
    /// bookings for that date.
    pub async fn day_schedule(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<DaySchedule, SchedulingError> {
        debug!("Calculating day schedule for doctor {} on {}", doctor_id, date);

        let windows = self.list_windows(doctor_id).await?;
        if windows.is_empty() {
            return Err(SchedulingError::NoSessionWindows);
        }

        let day = DayOfWeek::from_date(date);
        let mut candidates: Vec<NaiveTime> = Vec::new();
        for window in windows.iter().filter(|w| w.day_of_week == day) {
            candidates.extend(generate_slots(window, SLOT_GRANULARITY_MINUTES)?);
        }
        candidates.sort();
        candidates.dedup();

        let taken = self.booked_slots(doctor_id, date).await?;
        let availability = available_slots(&candidates, &taken);

        debug!(
            "Doctor {} on {}: {} of {} slots available",
            doctor_id,
            date,
            availability.available.len(),
            availability.total_count
        );

        Ok(DaySchedule {
            doctor_id,
            date,
            available_slots: availability.available.into_iter().map(format_hhmm).collect(),
            booked_count: availability.booked_count,
            total_count: availability.total_count,
        })
    }

    async fn get_window(&self, window_id: Uuid) -> Result<SessionWindow, SchedulingError> {
        let path = format!("{}?id=eq.{}", WINDOWS_PATH, window_id);
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(db_error)?;

        let found = result.first().ok_or(SchedulingError::WindowNotFound)?;

        serde_json::from_value(found.clone())
            .map_err(|e| SchedulingError::Database(format!("Failed to parse session window: {}", e)))
    }

    async fn booked_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        let path = format!(
            "{}?doctor_id=eq.{}&session_date=eq.{}",
            BOOKINGS_PATH, doctor_id, date
        );

        let booked: Vec<BookedSlot> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(db_error)?;

        Ok(booked.into_iter().map(|b| b.slot_time).collect())
    }

    async fn check_window_overlap(
        &self,
        doctor_id: Uuid,
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        end_time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> Result<(), SchedulingError> {
        let mut path = format!(
            "{}?doctor_id=eq.{}&day_of_week=eq.{}",
            WINDOWS_PATH, doctor_id, day_of_week
        );
        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }

        let existing: Vec<SessionWindow> = {
            let result: Vec<Value> = self
                .db
                .request(Method::GET, &path, None)
                .await
                .map_err(db_error)?;

            result
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<_, _>>()
                .map_err(|e| SchedulingError::Database(format!("Failed to parse session windows: {}", e)))?
        };

        for window in existing {
            if start_time < window.end_time && end_time > window.start_time {
                warn!(
                    "Session window overlap for doctor {} on {}: {}-{}",
                    doctor_id,
                    day_of_week,
                    format_hhmm(window.start_time),
                    format_hhmm(window.end_time)
                );
                return Err(SchedulingError::WindowOverlap);
            }
        }

        Ok(())
    }
}

fn db_error(e: DbError) -> SchedulingError {
    match e {
        DbError::Conflict(_) => SchedulingError::WindowOverlap,
        other => SchedulingError::Database(other.to_string()),
    }
}
