//! RoomObject entity - The atomic editable unit of a dungeon

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{GroupId, ItemTypeId, ObjectId, Orientation, RoomId, Vec3};

/// Revision assigned to a freshly created object row
pub const INITIAL_REVISION: i64 = 1;

/// A placed object, as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomObject {
    pub id: ObjectId,
    pub room_id: RoomId,
    pub type_id: ItemTypeId,
    pub group_id: GroupId,
    /// Position relative to the room origin
    pub position: Vec3,
    pub orientation: Orientation,
    pub radius: f64,
    pub revision: i64,
    pub name: Option<String>,
}

/// An object that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoomObject {
    pub room_id: RoomId,
    pub type_id: ItemTypeId,
    pub group_id: GroupId,
    pub position: Vec3,
    pub orientation: Orientation,
    pub radius: f64,
}

impl NewRoomObject {
    /// The persisted form of this object once the store assigned it an id
    pub fn into_persisted(self, id: ObjectId) -> RoomObject {
        RoomObject {
            id,
            room_id: self.room_id,
            type_id: self.type_id,
            group_id: self.group_id,
            position: self.position,
            orientation: self.orientation,
            radius: self.radius,
            revision: INITIAL_REVISION,
            name: None,
        }
    }
}
