//! SQLite persistence adapters
//!
//! The dungeon authoring data lives in a single SQLite database; the
//! schema is created on startup.

mod sqlite_dungeon_store;

#[cfg(test)]
pub mod fixtures;

pub use sqlite_dungeon_store::SqliteDungeonStore;
