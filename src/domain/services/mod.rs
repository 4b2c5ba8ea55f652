//! Domain services - Pure business logic operations

mod object_lock_table;

pub use object_lock_table::{LockConflict, LockStatus, ObjectLockTable};
