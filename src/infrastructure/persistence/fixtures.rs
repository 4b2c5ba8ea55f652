//! Seeded in-memory dungeon store shared by the test suites

use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;

use super::SqliteDungeonStore;
use crate::domain::value_objects::{
    ArchetypeId, CategoryId, DungeonId, FactionId, GroupId, ItemTypeId, ObjectId, RoomId, Vec3,
};

pub const COMBAT_ARCHETYPE: ArchetypeId = ArchetypeId::new(1);
pub const PIRATE_FACTION: FactionId = FactionId::new(500001);

/// Working copy, archetype 1 / faction 500001
pub const WORKING_DUNGEON: DungeonId = DungeonId::new(10);
/// Released, archetype 2 / faction 500002
pub const RELEASED_DUNGEON: DungeonId = DungeonId::new(11);

pub const MAIN_ROOM: RoomId = RoomId::new(100);
pub const MAIN_ROOM_ORIGIN: Vec3 = Vec3::new(1000.0, 2000.0, 3000.0);
/// Has no groups
pub const SIDE_ROOM: RoomId = RoomId::new(101);
pub const SIDE_ROOM_ORIGIN: Vec3 = Vec3::new(-500.0, 0.0, 500.0);
pub const FROZEN_ROOM: RoomId = RoomId::new(110);

pub const MAIN_GROUP: GroupId = GroupId::new(1000);

/// Beacon at (10, 0, 0) in the side room
pub const SIDE_ROOM_OBJECT: ObjectId = ObjectId::new(5000);
pub const FROZEN_ROOM_OBJECT: ObjectId = ObjectId::new(5100);

pub const CELESTIAL_CATEGORY: CategoryId = CategoryId::new(2);
pub const BEACON_TYPE: ItemTypeId = ItemTypeId::new(1001);
pub const RUINS_TYPE: ItemTypeId = ItemTypeId::new(1002);
pub const CARGO_TYPE: ItemTypeId = ItemTypeId::new(2001);
pub const SPAWNABLE_TYPES: [ItemTypeId; 3] = [BEACON_TYPE, RUINS_TYPE, CARGO_TYPE];

const SEED: &[&str] = &[
    "INSERT INTO archetypes (archetype_id, archetype_name) VALUES (1, 'Combat Site'), (2, 'Relic Site')",
    "INSERT INTO factions (faction_id, faction_name) VALUES (500001, 'Angel Cartel'), (500002, 'Blood Raiders')",
    r#"
    INSERT INTO dungeons (dungeon_id, dungeon_name, status, archetype_id, faction_id) VALUES
        (10, 'Angel Hideaway', 0, 1, 500001),
        (11, 'Blood Shrine', 1, 2, 500002)
    "#,
    r#"
    INSERT INTO rooms (room_id, dungeon_id, room_name, origin_x, origin_y, origin_z) VALUES
        (100, 10, 'Main Hall', 1000, 2000, 3000),
        (101, 10, 'Side Pocket', -500, 0, 500),
        (110, 11, 'Sanctum', 0, 0, 0)
    "#,
    "INSERT INTO room_groups (group_id, room_id, group_name) VALUES (1000, 100, 'Structures')",
    r#"
    INSERT INTO room_objects
        (object_id, room_id, type_id, group_id, x, y, z, yaw, pitch, roll, radius, revision)
    VALUES
        (5000, 101, 1001, 0, 10, 0, 0, 0, 0, 0, 100, 1),
        (5100, 110, 1002, 0, 0, 0, 0, 0, 0, 0, 500, 1)
    "#,
    "INSERT INTO item_groups (group_id, category_id, group_name) VALUES (10, 2, 'Beacons'), (20, 6, 'Cargo Containers')",
    r#"
    INSERT INTO item_types (type_id, group_id, type_name) VALUES
        (1002, 10, 'Ancient Ruins'),
        (1001, 10, 'Warp Beacon'),
        (2001, 20, 'Cargo Container')
    "#,
];

/// A fresh in-memory store holding the reference dungeons above
///
/// The pool is capped at one connection so every query sees the same
/// in-memory database.
pub async fn seeded_store() -> Arc<SqliteDungeonStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteDungeonStore::new(pool).await.unwrap();

    for statement in SEED {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .unwrap();
    }

    Arc::new(store)
}
