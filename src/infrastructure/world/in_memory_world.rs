//! In-memory world container
//!
//! Holds every live entity of every location in one arena. Dungeon objects
//! are keyed by their object id; ships draw ids from a separate range well
//! above any object id the store hands out. Sessions sharing a room share
//! its entities, so each entity counts its holders.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{
    EntityKind, EntityUpdate, LiveEntity, SpawnError, SpawnRequest, WorldError, WorldPort,
};
use crate::domain::value_objects::{EntityId, ItemTypeId, LocationId, Orientation, UserId, Vec3};

const FIRST_SHIP_ID: i64 = 1 << 40;
const SHIP_TYPE: ItemTypeId = ItemTypeId::new(670);
const SHIP_RADIUS: f64 = 50.0;

struct Slot {
    entity: LiveEntity,
    holders: usize,
}

pub struct InMemoryWorld {
    spawnable: HashSet<ItemTypeId>,
    entities: RwLock<HashMap<EntityId, Slot>>,
    next_ship_id: AtomicI64,
}

impl InMemoryWorld {
    pub fn new(spawnable: impl IntoIterator<Item = ItemTypeId>) -> Self {
        Self {
            spawnable: spawnable.into_iter().collect(),
            entities: RwLock::new(HashMap::new()),
            next_ship_id: AtomicI64::new(FIRST_SHIP_ID),
        }
    }

    /// Number of registered entities across all locations
    pub async fn entity_count(&self) -> usize {
        self.entities.read().await.len()
    }
}

#[async_trait]
impl WorldPort for InMemoryWorld {
    async fn spawn(&self, request: SpawnRequest) -> Result<LiveEntity, SpawnError> {
        let object = request.object;
        if !self.spawnable.contains(&object.type_id) {
            return Err(SpawnError::UnknownType(object.type_id));
        }
        if !request.position.is_finite() {
            return Err(SpawnError::InvalidPosition(request.position));
        }

        Ok(LiveEntity {
            id: object.id.into(),
            location_id: request.location_id,
            type_id: object.type_id,
            name: object
                .name
                .clone()
                .unwrap_or_else(|| format!("Dungeon object {}", object.id)),
            position: request.position,
            orientation: object.orientation,
            radius: object.radius,
            kind: EntityKind::DungeonObject(object),
        })
    }

    async fn spawn_ship(
        &self,
        owner: UserId,
        location_id: LocationId,
        position: Vec3,
    ) -> Result<EntityId, WorldError> {
        let id = EntityId::new(self.next_ship_id.fetch_add(1, Ordering::Relaxed));
        let ship = LiveEntity {
            id,
            location_id,
            type_id: SHIP_TYPE,
            name: format!("Editor ship of {owner}"),
            position,
            orientation: Orientation::default(),
            radius: SHIP_RADIUS,
            kind: EntityKind::Ship { owner },
        };

        self.register(ship).await
    }

    async fn register(&self, entity: LiveEntity) -> Result<EntityId, WorldError> {
        let mut entities = self.entities.write().await;
        let id = entity.id;
        if entities.contains_key(&id) {
            return Err(WorldError::AlreadyRegistered(id));
        }

        entities.insert(id, Slot { entity, holders: 1 });
        tracing::debug!(entity_id = %id, "Registered entity");
        Ok(id)
    }

    async fn retain(&self, id: EntityId) -> Result<(), WorldError> {
        let mut entities = self.entities.write().await;
        let slot = entities.get_mut(&id).ok_or(WorldError::NotFound(id))?;
        slot.holders += 1;
        Ok(())
    }

    async fn release(&self, id: EntityId) -> Result<bool, WorldError> {
        let mut entities = self.entities.write().await;
        let slot = entities.get_mut(&id).ok_or(WorldError::NotFound(id))?;
        slot.holders = slot.holders.saturating_sub(1);
        if slot.holders > 0 {
            return Ok(false);
        }

        entities.remove(&id);
        tracing::debug!(entity_id = %id, "Last holder released entity");
        Ok(true)
    }

    async fn unregister(&self, id: EntityId) -> Option<LiveEntity> {
        let removed = self.entities.write().await.remove(&id);
        if removed.is_some() {
            tracing::debug!(entity_id = %id, "Unregistered entity");
        }
        removed.map(|slot| slot.entity)
    }

    async fn get(&self, id: EntityId) -> Option<LiveEntity> {
        self.entities
            .read()
            .await
            .get(&id)
            .map(|slot| slot.entity.clone())
    }

    async fn update(&self, id: EntityId, update: EntityUpdate) -> Result<(), WorldError> {
        let mut entities = self.entities.write().await;
        let entity = &mut entities
            .get_mut(&id)
            .ok_or(WorldError::NotFound(id))?
            .entity;

        match update {
            EntityUpdate::MoveTo(position) => entity.position = position,
            EntityUpdate::Place { world, local } => {
                entity.position = world;
                if let EntityKind::DungeonObject(object) = &mut entity.kind {
                    object.position = local;
                }
            }
            EntityUpdate::Radius(radius) => {
                entity.radius = radius;
                if let EntityKind::DungeonObject(object) = &mut entity.kind {
                    object.radius = radius;
                }
            }
            EntityUpdate::Orientation(orientation) => {
                entity.orientation = orientation;
                if let EntityKind::DungeonObject(object) = &mut entity.kind {
                    object.orientation = orientation;
                }
            }
            EntityUpdate::Rename(name) => {
                if let EntityKind::DungeonObject(object) = &mut entity.kind {
                    object.name = Some(name.clone());
                }
                entity.name = name;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RoomObject;
    use crate::domain::value_objects::{GroupId, ObjectId, RoomId};

    const BEACON: ItemTypeId = ItemTypeId::new(1001);
    const LOCATION: LocationId = LocationId::new(30000142);

    fn beacon(id: i64) -> RoomObject {
        RoomObject {
            id: ObjectId::new(id),
            room_id: RoomId::new(100),
            type_id: BEACON,
            group_id: GroupId::UNGROUPED,
            position: Vec3::new(1.0, 2.0, 3.0),
            orientation: Orientation::default(),
            radius: 100.0,
            revision: 1,
            name: None,
        }
    }

    fn request(object: RoomObject) -> SpawnRequest {
        SpawnRequest {
            location_id: LOCATION,
            position: object.position + Vec3::new(1000.0, 0.0, 0.0),
            object,
        }
    }

    #[tokio::test]
    async fn test_spawn_does_not_register() {
        let world = InMemoryWorld::new([BEACON]);

        let entity = world.spawn(request(beacon(7))).await.unwrap();

        assert_eq!(entity.id, EntityId::new(7));
        assert_eq!(entity.position, Vec3::new(1001.0, 2.0, 3.0));
        assert!(world.get(entity.id).await.is_none());

        world.register(entity).await.unwrap();
        assert_eq!(world.entity_count().await, 1);
    }

    #[tokio::test]
    async fn test_spawn_rejects_unknown_type_and_bad_position() {
        let world = InMemoryWorld::new([BEACON]);

        let mut unknown = beacon(1);
        unknown.type_id = ItemTypeId::new(9999);
        assert_eq!(
            world.spawn(request(unknown)).await,
            Err(SpawnError::UnknownType(ItemTypeId::new(9999)))
        );

        let mut misplaced = request(beacon(2));
        misplaced.position = Vec3::new(f64::NAN, 0.0, 0.0);
        assert!(matches!(
            world.spawn(misplaced).await,
            Err(SpawnError::InvalidPosition(_))
        ));
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let world = InMemoryWorld::new([BEACON]);
        let entity = world.spawn(request(beacon(3))).await.unwrap();

        world.register(entity.clone()).await.unwrap();

        assert_eq!(
            world.register(entity).await,
            Err(WorldError::AlreadyRegistered(EntityId::new(3)))
        );
    }

    #[tokio::test]
    async fn test_entity_stays_until_last_holder_releases() {
        let world = InMemoryWorld::new([BEACON]);
        let entity = world.spawn(request(beacon(5))).await.unwrap();
        let id = world.register(entity).await.unwrap();
        world.retain(id).await.unwrap();

        assert_eq!(world.release(id).await, Ok(false));
        assert!(world.get(id).await.is_some());
        assert_eq!(world.release(id).await, Ok(true));
        assert!(world.get(id).await.is_none());
        assert_eq!(world.release(id).await, Err(WorldError::NotFound(id)));
        assert_eq!(world.retain(id).await, Err(WorldError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_unregister_ignores_other_holders() {
        let world = InMemoryWorld::new([BEACON]);
        let entity = world.spawn(request(beacon(6))).await.unwrap();
        let id = world.register(entity).await.unwrap();
        world.retain(id).await.unwrap();

        let removed = world.unregister(id).await.unwrap();

        assert_eq!(removed.id, id);
        assert_eq!(world.entity_count().await, 0);
    }

    #[tokio::test]
    async fn test_ships_use_separate_id_range() {
        let world = InMemoryWorld::new([BEACON]);

        let first = world
            .spawn_ship(UserId::new(1), LOCATION, Vec3::ZERO)
            .await
            .unwrap();
        let second = world
            .spawn_ship(UserId::new(2), LocationId::new(1), Vec3::ZERO)
            .await
            .unwrap();

        assert!(first.value() >= FIRST_SHIP_ID);
        assert_ne!(first, second);
        let ship = world.get(first).await.unwrap();
        assert!(ship.as_dungeon_object().is_none());
        assert_eq!(ship.location_id, LOCATION);
        assert_eq!(world.entity_count().await, 2);
    }

    #[tokio::test]
    async fn test_updates_mirror_into_object() {
        let world = InMemoryWorld::new([BEACON]);
        let entity = world.spawn(request(beacon(4))).await.unwrap();
        let id = world.register(entity).await.unwrap();

        world
            .update(
                id,
                EntityUpdate::Place {
                    world: Vec3::new(50.0, 0.0, 0.0),
                    local: Vec3::new(5.0, 0.0, 0.0),
                },
            )
            .await
            .unwrap();
        world.update(id, EntityUpdate::Radius(12.0)).await.unwrap();
        world
            .update(id, EntityUpdate::Rename("Gate".to_string()))
            .await
            .unwrap();

        let entity = world.get(id).await.unwrap();
        assert_eq!(entity.position, Vec3::new(50.0, 0.0, 0.0));
        assert_eq!(entity.name, "Gate");
        let object = entity.as_dungeon_object().unwrap();
        assert_eq!(object.position, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(object.radius, 12.0);
        assert_eq!(object.name.as_deref(), Some("Gate"));
    }

    #[tokio::test]
    async fn test_update_missing_entity() {
        let world = InMemoryWorld::new([BEACON]);

        assert_eq!(
            world
                .update(EntityId::new(404), EntityUpdate::Radius(1.0))
                .await,
            Err(WorldError::NotFound(EntityId::new(404)))
        );
        assert!(world.unregister(EntityId::new(404)).await.is_none());
    }
}
