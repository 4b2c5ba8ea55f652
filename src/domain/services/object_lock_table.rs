//! Object lock table - Which actor may mutate which room object
//!
//! Locks are keyed by object id and carry the holder and an expiry. An expired
//! lock is treated exactly like a missing one and is pruned on the next access.
//! Time is always passed in so the table stays deterministic.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_objects::{ObjectId, UserId};

/// A lock held on a single object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectLock {
    pub holder: UserId,
    pub expires_at: DateTime<Utc>,
}

impl ObjectLock {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Another actor holds a live lock on the object
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Object {object} is locked by user {holder}")]
pub struct LockConflict {
    pub object: ObjectId,
    pub holder: UserId,
}

/// Lock state reported to clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockStatus {
    pub locked: bool,
    pub holders: Vec<UserId>,
}

#[derive(Debug)]
pub struct ObjectLockTable {
    locks: HashMap<ObjectId, ObjectLock>,
    ttl: Duration,
}

impl ObjectLockTable {
    pub fn new(ttl: Duration) -> Self {
        Self {
            locks: HashMap::new(),
            ttl,
        }
    }

    /// Take or refresh locks on every object, or on none of them
    pub fn acquire_all(
        &mut self,
        objects: &[ObjectId],
        holder: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), LockConflict> {
        for object in objects {
            self.ensure_writable(*object, holder, now)?;
        }

        let expires_at = now + self.ttl;
        for object in objects {
            self.locks
                .insert(*object, ObjectLock { holder, expires_at });
        }
        Ok(())
    }

    /// Fails if someone other than `holder` has a live lock on the object
    pub fn ensure_writable(
        &self,
        object: ObjectId,
        holder: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), LockConflict> {
        match self.locks.get(&object) {
            Some(lock) if lock.is_live(now) && lock.holder != holder => Err(LockConflict {
                object,
                holder: lock.holder,
            }),
            _ => Ok(()),
        }
    }

    /// Release a lock if `holder` owns it
    pub fn release(&mut self, object: ObjectId, holder: UserId) -> bool {
        match self.locks.get(&object) {
            Some(lock) if lock.holder == holder => {
                self.locks.remove(&object);
                true
            }
            _ => false,
        }
    }

    pub fn status(&mut self, object: ObjectId, now: DateTime<Utc>) -> LockStatus {
        match self.locks.get(&object) {
            Some(lock) if lock.is_live(now) => LockStatus {
                locked: true,
                holders: vec![lock.holder],
            },
            Some(_) => {
                self.locks.remove(&object);
                LockStatus {
                    locked: false,
                    holders: Vec::new(),
                }
            }
            None => LockStatus {
                locked: false,
                holders: Vec::new(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }
}
