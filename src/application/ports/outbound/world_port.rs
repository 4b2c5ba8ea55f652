//! World port - Interface to the live simulation that hosts spawned entities
//!
//! The simulation itself (movement, physics, combat) lives outside this
//! service. The editor only needs to spawn entities, hand them to the world
//! container, look them up and change a few of their properties.

use async_trait::async_trait;

use crate::domain::entities::RoomObject;
use crate::domain::value_objects::{
    EntityId, ItemTypeId, LocationId, Orientation, UserId, Vec3,
};

/// What a live entity represents
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Editable mirror of a persisted room object
    DungeonObject(RoomObject),
    /// An actor's ship
    Ship { owner: UserId },
}

/// An entity as held by the world container
#[derive(Debug, Clone, PartialEq)]
pub struct LiveEntity {
    pub id: EntityId,
    pub location_id: LocationId,
    pub type_id: ItemTypeId,
    pub name: String,
    /// Absolute position in the location
    pub position: Vec3,
    pub orientation: Orientation,
    pub radius: f64,
    pub kind: EntityKind,
}

impl LiveEntity {
    /// The room object this entity mirrors, if it is a dungeon-editing entity
    pub fn as_dungeon_object(&self) -> Option<&RoomObject> {
        match &self.kind {
            EntityKind::DungeonObject(object) => Some(object),
            EntityKind::Ship { .. } => None,
        }
    }
}

/// Everything the spawner needs to create a dungeon-object entity
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub location_id: LocationId,
    /// World position (room-local position plus the room origin)
    pub position: Vec3,
    pub object: RoomObject,
}

/// A property change applied to a registered entity
#[derive(Debug, Clone, PartialEq)]
pub enum EntityUpdate {
    /// Move to an absolute position
    MoveTo(Vec3),
    /// Move a dungeon object; `local` is mirrored into its room-object data
    Place { world: Vec3, local: Vec3 },
    Radius(f64),
    Orientation(Orientation),
    Rename(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpawnError {
    #[error("Unknown item type: {0}")]
    UnknownType(ItemTypeId),

    #[error("Invalid spawn position: {0:?}")]
    InvalidPosition(Vec3),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    #[error("Entity already registered: {0}")]
    AlreadyRegistered(EntityId),
}

/// Port for the entity spawner and world container
#[async_trait]
pub trait WorldPort: Send + Sync {
    /// Create a live entity for a room object; it is not yet in the world
    async fn spawn(&self, request: SpawnRequest) -> Result<LiveEntity, SpawnError>;

    /// Place a ship for an actor and register it
    async fn spawn_ship(
        &self,
        owner: UserId,
        location_id: LocationId,
        position: Vec3,
    ) -> Result<EntityId, WorldError>;

    /// Hand an entity to the world container; the caller becomes its first holder
    async fn register(&self, entity: LiveEntity) -> Result<EntityId, WorldError>;

    /// Add a holder to an entity that is already registered
    async fn retain(&self, id: EntityId) -> Result<(), WorldError>;

    /// Drop one holder; returns `true` when that was the last one and the
    /// entity left the world
    async fn release(&self, id: EntityId) -> Result<bool, WorldError>;

    /// Take an entity out of the world container regardless of its holders
    async fn unregister(&self, id: EntityId) -> Option<LiveEntity>;

    async fn get(&self, id: EntityId) -> Option<LiveEntity>;

    async fn update(&self, id: EntityId, update: EntityUpdate) -> Result<(), WorldError>;
}
