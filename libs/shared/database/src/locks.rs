use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::postgrest::{DbError, PostgrestClient};

const LOCKS_PATH: &str = "/rest/v1/slot_locks";

/// Advisory locks persisted through the storage collaborator. Acquisition
/// is a conditional insert on `lock_key`, so two contenders for the same
/// critical section cannot both hold the lock. Entries carry a TTL and are
/// reclaimed inline when a contender finds an expired holder.
pub struct SlotLockService {
    db: Arc<PostgrestClient>,
    lock_timeout_seconds: i64,
}

impl SlotLockService {
    pub fn new(db: Arc<PostgrestClient>) -> Self {
        Self {
            db,
            lock_timeout_seconds: 30,
        }
    }

    /// Try to take the lock. Returns false when another holder has it and
    /// the entry has not yet expired.
    pub async fn acquire(&self, lock_key: &str) -> Result<bool, DbError> {
        if self.try_insert(lock_key).await? {
            return Ok(true);
        }

        // Holder exists; reclaim it only if its TTL has lapsed.
        if self.cleanup_if_expired(lock_key).await? {
            return self.try_insert(lock_key).await;
        }

        Ok(false)
    }

    pub async fn release(&self, lock_key: &str) -> Result<(), DbError> {
        self.db
            .delete_returning(&format!("{}?lock_key=eq.{}", LOCKS_PATH, lock_key))
            .await?;

        debug!("Slot lock released: {}", lock_key);
        Ok(())
    }

    /// Remove every lapsed lock. Expiry is normally handled inline by
    /// `acquire`; this sweep exists for operator use.
    pub async fn cleanup_expired(&self) -> Result<u32, DbError> {
        let now = Utc::now();

        let removed = self
            .db
            .delete_returning(&format!("{}?expires_at=lt.{}", LOCKS_PATH, now.to_rfc3339()))
            .await?;

        let count = removed.len() as u32;
        if count > 0 {
            info!("Cleaned up {} expired slot locks", count);
        }

        Ok(count)
    }

    async fn try_insert(&self, lock_key: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let lock_data = json!({
            "lock_key": lock_key,
            "holder": format!("scheduler_{}", Uuid::new_v4()),
            "acquired_at": now.to_rfc3339(),
            "expires_at": (now + Duration::seconds(self.lock_timeout_seconds)).to_rfc3339()
        });

        match self.db.insert_returning(LOCKS_PATH, lock_data).await {
            Ok(_) => {
                debug!("Slot lock acquired: {}", lock_key);
                Ok(true)
            }
            Err(DbError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn cleanup_if_expired(&self, lock_key: &str) -> Result<bool, DbError> {
        let rows: Vec<Value> = self
            .db
            .request(
                reqwest::Method::GET,
                &format!("{}?lock_key=eq.{}", LOCKS_PATH, lock_key),
                None,
            )
            .await?;

        let Some(row) = rows.first() else {
            // Holder released between our insert attempt and this check.
            return Ok(true);
        };

        let expired = row
            .get("expires_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|expires_at| expires_at.with_timezone(&Utc) < Utc::now())
            .unwrap_or(false);

        if expired {
            warn!("Reclaiming expired slot lock: {}", lock_key);
            self.release(lock_key).await?;
            return Ok(true);
        }

        Ok(false)
    }
}
