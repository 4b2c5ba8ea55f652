//! Repository ports - Interfaces for dungeon data persistence
//!
//! These traits define the contracts that infrastructure repositories must implement.
//! Application services depend on these traits, not concrete implementations.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::entities::{
    Archetype, Dungeon, Faction, NewRoomObject, PaletteEntry, Room, RoomGroup, RoomObject,
    Template, TemplateObject,
};
use crate::domain::value_objects::{
    ArchetypeId, CategoryId, DungeonId, FactionId, GroupId, ItemTypeId, ObjectId, Orientation,
    RoomId, TemplateId, UserId, Vec3,
};

/// Which dungeons a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DungeonFilter {
    All,
    ById(DungeonId),
    ByArchetypeAndFaction {
        archetype_id: ArchetypeId,
        faction_id: FactionId,
    },
}

/// Repository port for the dungeon authoring data
///
/// Pure CRUD, no business rules. Update and delete methods report whether a
/// row was affected so callers can surface "not found" explicitly.
#[async_trait]
pub trait DungeonRepositoryPort: Send + Sync {
    // =========================================================================
    // Reference data
    // =========================================================================

    async fn list_archetypes(&self) -> Result<Vec<Archetype>>;

    async fn list_factions(&self) -> Result<Vec<Faction>>;

    /// Palette entries whose type belongs to a group of the given category
    async fn list_palette(&self, category_id: CategoryId) -> Result<Vec<PaletteEntry>>;

    /// Every item type id the world may spawn
    async fn list_item_types(&self) -> Result<Vec<ItemTypeId>>;

    // =========================================================================
    // Dungeons and rooms
    // =========================================================================

    async fn list_dungeons(&self, filter: DungeonFilter) -> Result<Vec<Dungeon>>;

    async fn get_dungeon(&self, id: DungeonId) -> Result<Option<Dungeon>>;

    /// Rooms of a dungeon, ordered by id
    async fn list_rooms(&self, dungeon_id: DungeonId) -> Result<Vec<Room>>;

    async fn get_room(&self, id: RoomId) -> Result<Option<Room>>;

    async fn list_room_groups(&self, room_id: RoomId) -> Result<Vec<RoomGroup>>;

    /// Lowest group id defined for the room, if any
    async fn first_group_for_room(&self, room_id: RoomId) -> Result<Option<GroupId>>;

    // =========================================================================
    // Room objects
    // =========================================================================

    async fn list_room_objects(&self, room_id: RoomId) -> Result<Vec<RoomObject>>;

    async fn get_object(&self, id: ObjectId) -> Result<Option<RoomObject>>;

    /// Insert a new object row and return its id
    async fn create_object(&self, object: &NewRoomObject) -> Result<ObjectId>;

    async fn delete_object(&self, id: ObjectId) -> Result<bool>;

    async fn update_object_radius(&self, id: ObjectId, radius: f64) -> Result<bool>;

    /// Store the room-local position
    async fn update_object_position(&self, id: ObjectId, position: Vec3) -> Result<bool>;

    async fn update_object_orientation(&self, id: ObjectId, orientation: Orientation)
        -> Result<bool>;

    async fn update_object_name(&self, id: ObjectId, name: &str) -> Result<bool>;

    // =========================================================================
    // Templates
    // =========================================================================

    /// Templates authored by `owner_id`
    async fn list_templates(&self, owner_id: UserId) -> Result<Vec<Template>>;

    async fn get_template(&self, id: TemplateId) -> Result<Option<Template>>;

    async fn create_template(
        &self,
        owner_id: UserId,
        name: &str,
        description: &str,
        room_id: RoomId,
    ) -> Result<TemplateId>;

    async fn update_template(&self, id: TemplateId, name: &str, description: &str)
        -> Result<bool>;

    /// Delete a template together with its captured objects
    async fn delete_template(&self, id: TemplateId) -> Result<bool>;

    async fn list_template_objects(&self, template_id: TemplateId) -> Result<Vec<TemplateObject>>;

    async fn add_template_object(&self, object: &TemplateObject) -> Result<()>;
}
