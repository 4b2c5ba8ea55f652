//! Strongly-typed identifiers for domain entities
//!
//! Every persisted row in the dungeon store is keyed by a 64-bit integer, and the
//! remote-call layer carries ids as plain integers. Wrapping them keeps an
//! `ObjectId` from ever being passed where a `RoomId` is expected.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(ArchetypeId);
define_id!(FactionId);
define_id!(DungeonId);
define_id!(RoomId);
define_id!(GroupId);
define_id!(ObjectId);
define_id!(TemplateId);
define_id!(ItemTypeId);
define_id!(CategoryId);
define_id!(UserId);
define_id!(LocationId);
define_id!(EntityId);

impl GroupId {
    /// Group assigned to objects placed in a room that has no groups yet
    pub const UNGROUPED: GroupId = GroupId(0);
}

/// Live dungeon objects are addressed in the world by their persisted object id
impl From<ObjectId> for EntityId {
    fn from(id: ObjectId) -> Self {
        EntityId(id.0)
    }
}
