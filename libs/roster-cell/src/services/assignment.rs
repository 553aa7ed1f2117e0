// libs/roster-cell/src/services/assignment.rs
//
// Staff-to-slot allocation. The conflict check re-runs inside the same
// critical section as the write; one advisory lock per (week range, time
// key) serializes every write that could touch either roster invariant.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::locks::SlotLockService;
use shared_database::postgrest::{DbError, PostgrestClient};
use shared_models::schedule::format_hhmm;

use crate::models::{AssignStaffRequest, RosterError, WardAssignment};
use crate::services::conflict::{RosterConflictService, ASSIGNMENTS_PATH};

pub struct StaffAssignmentService {
    db: Arc<PostgrestClient>,
    conflicts: RosterConflictService,
    locks: SlotLockService,
    max_lock_attempts: u32,
}

impl StaffAssignmentService {
    pub fn new(config: &AppConfig) -> Self {
        let db = Arc::new(PostgrestClient::new(config));
        let conflicts = RosterConflictService::new(Arc::clone(&db));
        let locks = SlotLockService::new(Arc::clone(&db));

        Self {
            db,
            conflicts,
            locks,
            max_lock_attempts: 3,
        }
    }

    /// Commit a staff-to-slot assignment. A slot moves Unassigned →
    /// Assigned here and back only through `unassign_staff`; there is no
    /// reassign-in-place.
    pub async fn assign_staff(
        &self,
        request: AssignStaffRequest,
    ) -> Result<WardAssignment, RosterError> {
        info!(
            "Assigning staff {} to room {} at {} {} ({}..{})",
            request.staff_id,
            request.room_id,
            request.day_of_week,
            format_hhmm(request.start_time),
            request.week_start,
            request.week_end
        );

        self.validate_request(&request)?;

        let lock_key = format!(
            "roster_{}_{}_{}_{}",
            request.week_start,
            request.week_end,
            request.day_of_week,
            format_hhmm(request.start_time)
        );

        for attempt in 1..=self.max_lock_attempts {
            let acquired = self
                .locks
                .acquire(&lock_key)
                .await
                .map_err(|e| RosterError::Database(e.to_string()))?;

            if acquired {
                let outcome = self.assign_locked(&request).await;

                if let Err(e) = self.locks.release(&lock_key).await {
                    warn!("Failed to release roster lock {}: {}", lock_key, e);
                }

                return outcome;
            }

            warn!(
                "Roster lock contention on {} (attempt {}/{})",
                lock_key, attempt, self.max_lock_attempts
            );
            tokio::time::sleep(tokio::time::Duration::from_millis(50 * attempt as u64)).await;
        }

        Err(RosterError::AllocatorBusy)
    }

    /// Remove an assignment, returning the slot to Unassigned.
    pub async fn unassign_staff(&self, assignment_id: Uuid) -> Result<(), RosterError> {
        info!("Removing ward assignment {}", assignment_id);

        let removed = self
            .db
            .delete_returning(&format!("{}?id=eq.{}", ASSIGNMENTS_PATH, assignment_id))
            .await
            .map_err(|e| RosterError::Database(e.to_string()))?;

        if removed.is_empty() {
            return Err(RosterError::NotFound);
        }

        Ok(())
    }

    /// Assignments for one week range, optionally narrowed to one room.
    pub async fn week_roster(
        &self,
        week_start: chrono::NaiveDate,
        week_end: chrono::NaiveDate,
        room_id: Option<&str>,
    ) -> Result<Vec<WardAssignment>, RosterError> {
        if week_start > week_end {
            return Err(RosterError::Validation(
                "week_start must not be after week_end".to_string(),
            ));
        }

        let mut path = format!(
            "{}?week_start=eq.{}&week_end=eq.{}&order=start_time.asc",
            ASSIGNMENTS_PATH, week_start, week_end
        );
        if let Some(room) = room_id {
            path.push_str(&format!("&room_id=eq.{}", urlencoding::encode(room)));
        }

        let result: Vec<serde_json::Value> = self
            .db
            .request(reqwest::Method::GET, &path, None)
            .await
            .map_err(|e| RosterError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<WardAssignment>, _>>()
            .map_err(|e| RosterError::Database(format!("Failed to parse assignments: {}", e)))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn assign_locked(
        &self,
        request: &AssignStaffRequest,
    ) -> Result<WardAssignment, RosterError> {
        let conflicts = self
            .conflicts
            .find_conflicts(
                &request.room_id,
                request.week_start,
                request.week_end,
                request.day_of_week,
                request.start_time,
                request.staff_id,
            )
            .await?;

        if conflicts.room_occupied {
            warn!(
                "Room {} already has an assignee at {} {}",
                request.room_id,
                request.day_of_week,
                format_hhmm(request.start_time)
            );
            return Err(RosterError::RoomOccupied);
        }

        if conflicts.staff_busy_elsewhere {
            warn!(
                "Staff {} already committed to another room at {} {}",
                request.staff_id,
                request.day_of_week,
                format_hhmm(request.start_time)
            );
            return Err(RosterError::StaffConflict);
        }

        let assignment_data = json!({
            "id": Uuid::new_v4(),
            "room_id": request.room_id,
            "staff_id": request.staff_id,
            "day_of_week": request.day_of_week,
            "start_time": format_hhmm(request.start_time),
            "week_start": request.week_start,
            "week_end": request.week_end,
            "created_at": Utc::now().to_rfc3339()
        });

        let result = match self.db.insert_returning(ASSIGNMENTS_PATH, assignment_data).await {
            Ok(rows) => rows,
            // Unique-index backstop on (room, time key, week range).
            Err(DbError::Conflict(_)) => return Err(RosterError::RoomOccupied),
            Err(e) => return Err(RosterError::Database(e.to_string())),
        };

        let created = result
            .first()
            .ok_or_else(|| RosterError::Database("Failed to create assignment".to_string()))?;

        let assignment: WardAssignment = serde_json::from_value(created.clone())
            .map_err(|e| RosterError::Database(format!("Failed to parse assignment: {}", e)))?;

        info!(
            "Ward assignment {} committed: staff {} in room {}",
            assignment.id, assignment.staff_id, assignment.room_id
        );

        Ok(assignment)
    }

    fn validate_request(&self, request: &AssignStaffRequest) -> Result<(), RosterError> {
        if request.room_id.trim().is_empty() {
            return Err(RosterError::Validation("room_id must not be empty".to_string()));
        }

        if request.week_start > request.week_end {
            return Err(RosterError::Validation(
                "week_start must not be after week_end".to_string(),
            ));
        }

        Ok(())
    }
}
