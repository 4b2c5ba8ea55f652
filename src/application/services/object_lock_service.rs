//! Object Lock Service - Shared lock table for all editing sessions
//!
//! Wraps the domain `ObjectLockTable` behind an async mutex and supplies the
//! wall clock, so every session sees the same locks.

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::services::{LockConflict, LockStatus, ObjectLockTable};
use crate::domain::value_objects::{ObjectId, UserId};

pub struct ObjectLockService {
    table: Mutex<ObjectLockTable>,
}

impl ObjectLockService {
    pub fn new(ttl: Duration) -> Self {
        Self {
            table: Mutex::new(ObjectLockTable::new(ttl)),
        }
    }

    /// Lock every object for `holder`, or none of them
    pub async fn acquire_all(
        &self,
        objects: &[ObjectId],
        holder: UserId,
    ) -> Result<(), LockConflict> {
        self.table
            .lock()
            .await
            .acquire_all(objects, holder, Utc::now())
    }

    pub async fn ensure_writable(
        &self,
        object: ObjectId,
        holder: UserId,
    ) -> Result<(), LockConflict> {
        self.table
            .lock()
            .await
            .ensure_writable(object, holder, Utc::now())
    }

    /// Release the listed locks `holder` owns, returning how many were dropped
    pub async fn release(&self, objects: &[ObjectId], holder: UserId) -> usize {
        let mut table = self.table.lock().await;
        let released = objects
            .iter()
            .filter(|object| table.release(**object, holder))
            .count();
        if released > 0 {
            debug!(user_id = %holder, released, "Released object locks");
        }
        released
    }

    pub async fn status(&self, object: ObjectId) -> LockStatus {
        self.table.lock().await.status(object, Utc::now())
    }
}
