//! Dungeon entity - Versioned container of rooms

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ArchetypeId, DungeonId, FactionId, GroupId, RoomId, Vec3};

/// Release lifecycle of a dungeon version
///
/// Only a working copy may be edited; testing and released versions are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DungeonStatus {
    WorkingCopy,
    Released,
    Testing,
}

impl DungeonStatus {
    /// Decode the stored status code (1 = released, 2 = testing, anything else is a working copy)
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => DungeonStatus::Released,
            2 => DungeonStatus::Testing,
            _ => DungeonStatus::WorkingCopy,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            DungeonStatus::WorkingCopy => 0,
            DungeonStatus::Released => 1,
            DungeonStatus::Testing => 2,
        }
    }

    pub fn is_frozen(&self) -> bool {
        !matches!(self, DungeonStatus::WorkingCopy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub id: DungeonId,
    pub name: String,
    pub status: DungeonStatus,
    pub archetype_id: ArchetypeId,
    pub faction_id: FactionId,
}

/// A room within a dungeon
///
/// Object positions are stored relative to `origin`; the world position of a
/// spawned object is its local position plus the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub dungeon_id: DungeonId,
    pub name: String,
    pub origin: Vec3,
}

/// Classification of objects inside a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGroup {
    pub id: GroupId,
    pub room_id: RoomId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DungeonStatus::from_code(1), DungeonStatus::Released);
        assert_eq!(DungeonStatus::from_code(2), DungeonStatus::Testing);
        assert_eq!(DungeonStatus::from_code(0), DungeonStatus::WorkingCopy);
        assert_eq!(DungeonStatus::from_code(7), DungeonStatus::WorkingCopy);

        for status in [
            DungeonStatus::WorkingCopy,
            DungeonStatus::Released,
            DungeonStatus::Testing,
        ] {
            assert_eq!(DungeonStatus::from_code(status.code()), status);
        }
    }

    #[test]
    fn test_only_working_copy_is_editable() {
        assert!(!DungeonStatus::WorkingCopy.is_frozen());
        assert!(DungeonStatus::Released.is_frozen());
        assert!(DungeonStatus::Testing.is_frozen());
    }
}
