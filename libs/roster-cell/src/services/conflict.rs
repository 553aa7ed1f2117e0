// libs/roster-cell/src/services/conflict.rs
//
// Read-only invariant checks for the weekly ward roster. The time key is
// compared field by field (day-of-week, start time, week range) so a
// formatting mismatch can never hide a clash.

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::postgrest::PostgrestClient;
use shared_models::schedule::{format_hhmm, DayOfWeek};

use crate::models::{RosterConflicts, RosterError};

pub const ASSIGNMENTS_PATH: &str = "/rest/v1/ward_assignments";

pub struct RosterConflictService {
    db: Arc<PostgrestClient>,
}

impl RosterConflictService {
    pub fn new(db: Arc<PostgrestClient>) -> Self {
        Self { db }
    }

    /// Check a candidate assignment against committed state:
    /// `room_occupied` when the room slot already has an assignee (any
    /// staff member); `staff_busy_elsewhere` when this staff member holds
    /// the same time key in a different room within the same week range.
    pub async fn find_conflicts(
        &self,
        room_id: &str,
        week_start: NaiveDate,
        week_end: NaiveDate,
        day_of_week: DayOfWeek,
        start_time: NaiveTime,
        staff_id: Uuid,
    ) -> Result<RosterConflicts, RosterError> {
        debug!(
            "Checking roster conflicts for room {} / staff {} at {} {} ({}..{})",
            room_id,
            staff_id,
            day_of_week,
            format_hhmm(start_time),
            week_start,
            week_end
        );

        let time_key = format!(
            "day_of_week=eq.{}&start_time=eq.{}&week_start=eq.{}&week_end=eq.{}",
            day_of_week,
            urlencoding::encode(&format_hhmm(start_time)),
            week_start,
            week_end
        );

        let room_rows: Vec<Value> = self
            .db
            .request(
                Method::GET,
                &format!(
                    "{}?room_id=eq.{}&{}",
                    ASSIGNMENTS_PATH,
                    urlencoding::encode(room_id),
                    time_key
                ),
                None,
            )
            .await
            .map_err(|e| RosterError::Database(e.to_string()))?;

        let staff_rows: Vec<Value> = self
            .db
            .request(
                Method::GET,
                &format!(
                    "{}?staff_id=eq.{}&room_id=neq.{}&{}",
                    ASSIGNMENTS_PATH,
                    staff_id,
                    urlencoding::encode(room_id),
                    time_key
                ),
                None,
            )
            .await
            .map_err(|e| RosterError::Database(e.to_string()))?;

        Ok(RosterConflicts {
            room_occupied: !room_rows.is_empty(),
            staff_busy_elsewhere: !staff_rows.is_empty(),
        })
    }
}
