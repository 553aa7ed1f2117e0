// libs/scheduling-cell/src/services/slots.rs
//
// Pure slot arithmetic. No I/O lives here: both functions are
// deterministic over their inputs and safe to call concurrently.

use chrono::{Duration, NaiveTime};

use crate::models::{SchedulingError, SessionWindow};

/// Slot step used across the whole system.
pub const SLOT_GRANULARITY_MINUTES: u32 = 15;

/// Expand a recurring window into its discrete bookable time points.
///
/// Slots step from `start_time` in `granularity_minutes` increments; a
/// trailing interval that does not fully fit before `end_time` is dropped,
/// so the result always holds `floor((end - start) / granularity)` entries
/// in strictly increasing order.
pub fn generate_slots(
    window: &SessionWindow,
    granularity_minutes: u32,
) -> Result<Vec<NaiveTime>, SchedulingError> {
    if granularity_minutes == 0 || 60 % granularity_minutes != 0 {
        return Err(SchedulingError::InvalidGranularity);
    }

    if window.start_time >= window.end_time {
        return Err(SchedulingError::InvalidWindow);
    }

    let span_minutes = (window.end_time - window.start_time).num_minutes();
    let count = span_minutes / granularity_minutes as i64;

    let slots = (0..count)
        .map(|i| window.start_time + Duration::minutes(i * granularity_minutes as i64))
        .collect();

    Ok(slots)
}

/// Result of removing committed bookings from a candidate slot sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAvailability {
    pub available: Vec<NaiveTime>,
    pub booked_count: i32,
    pub total_count: i32,
}

/// Set-difference over slot sequences: drops every candidate present in
/// `taken` without reordering the survivors. Empty inputs are valid.
pub fn available_slots(candidates: &[NaiveTime], taken: &[NaiveTime]) -> SlotAvailability {
    let total_count = candidates.len() as i32;

    let available: Vec<NaiveTime> = candidates
        .iter()
        .copied()
        .filter(|slot| !taken.contains(slot))
        .collect();

    let booked_count = total_count - available.len() as i32;

    SlotAvailability {
        available,
        booked_count,
        total_count,
    }
}
