//! Editing Session - Per-actor dungeon editing state machine
//!
//! A session is bound to one actor (user, location, ship). It tracks which
//! room is being edited, the live entities it holds for that room and the
//! actor's current selection. Every mutation writes the store first and then
//! mirrors the change onto the live entity. Sessions editing the same room
//! hold the same entities; the world drops an entity when its last holder
//! lets go.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{
    DungeonRepositoryPort, EntityUpdate, SpawnError, SpawnRequest, WorldError, WorldPort,
};
use crate::application::services::ObjectLockService;
use crate::domain::entities::{NewRoomObject, Room, RoomGroup, RoomObject, TemplateObject};
use crate::domain::services::{LockConflict, LockStatus};
use crate::domain::value_objects::{
    DungeonId, EntityId, GroupId, ItemTypeId, LocationId, ObjectId, Orientation, RoomId,
    TemplateId, UserId, Vec3,
};

/// Reference point that `EditObjectXYZ` offsets are applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionBasis {
    /// The actor's current ship position
    #[default]
    ShipPosition,
    /// The stored origin of the object's room
    RoomOrigin,
}

impl FromStr for PositionBasis {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ship" => Ok(PositionBasis::ShipPosition),
            "room" => Ok(PositionBasis::RoomOrigin),
            other => Err(anyhow::anyhow!(
                "Unknown position basis '{}', expected 'ship' or 'room'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditorSettings {
    pub xyz_basis: PositionBasis,
}

/// The actor a session is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: UserId,
    pub location_id: LocationId,
    pub ship_id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Idle,
    EditingRoom {
        dungeon_id: DungeonId,
        room_id: RoomId,
    },
}

/// Where objects of one call are spawned
#[derive(Debug, Clone, Copy)]
struct SpawnContext {
    location_id: LocationId,
    room_origin: Vec3,
}

/// A room object whose live entity this session holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedObject {
    pub object_id: ObjectId,
    pub entity_id: EntityId,
}

/// Arguments of `AddObject`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceObject {
    pub room_id: RoomId,
    pub type_id: ItemTypeId,
    pub position: Vec3,
    pub orientation: Orientation,
    pub radius: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("No room is being edited")]
    NotEditing,

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Entity {0} is not an editable dungeon object")]
    NotEditable(EntityId),

    #[error("Room {room_id} is not part of dungeon {dungeon_id}")]
    RoomNotInDungeon {
        room_id: RoomId,
        dungeon_id: DungeonId,
    },

    #[error("Dungeon {0} is not a working copy and cannot be edited")]
    DungeonFrozen(DungeonId),

    #[error("Spawn failed: {0}")]
    SpawnFailure(#[from] SpawnError),

    #[error(transparent)]
    ObjectLocked(#[from] LockConflict),

    #[error("World error: {0}")]
    World(#[from] WorldError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl EditError {
    fn not_found(kind: &'static str, id: impl Into<i64>) -> Self {
        EditError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub struct EditingSession {
    actor: ActorContext,
    state: EditState,
    owned: Vec<OwnedObject>,
    selection: BTreeSet<ObjectId>,
    repository: Arc<dyn DungeonRepositoryPort>,
    world: Arc<dyn WorldPort>,
    locks: Arc<ObjectLockService>,
    settings: EditorSettings,
}

impl EditingSession {
    pub fn new(
        actor: ActorContext,
        repository: Arc<dyn DungeonRepositoryPort>,
        world: Arc<dyn WorldPort>,
        locks: Arc<ObjectLockService>,
        settings: EditorSettings,
    ) -> Self {
        Self {
            actor,
            state: EditState::Idle,
            owned: Vec::new(),
            selection: BTreeSet::new(),
            repository,
            world,
            locks,
            settings,
        }
    }

    pub fn actor(&self) -> &ActorContext {
        &self.actor
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    /// `GetCurrentlyEditedRoomID`
    pub fn current_room_id(&self) -> Option<RoomId> {
        match self.state {
            EditState::EditingRoom { room_id, .. } => Some(room_id),
            EditState::Idle => None,
        }
    }

    /// `GetRoomObjects`: ids of the live objects this session holds, oldest first
    ///
    /// Objects another session removed since are left out.
    pub async fn room_objects(&self) -> Vec<ObjectId> {
        let mut live = Vec::with_capacity(self.owned.len());
        for owned in &self.owned {
            if self.world.get(owned.entity_id).await.is_some() {
                live.push(owned.object_id);
            }
        }
        live
    }

    pub fn selection(&self) -> &BTreeSet<ObjectId> {
        &self.selection
    }

    // =========================================================================
    // Object operations
    // =========================================================================

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn is_object_locked(&self, object_id: ObjectId) -> Result<LockStatus, EditError> {
        self.require_editing()?;
        Ok(self.locks.status(object_id).await)
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn add_object(&mut self, place: PlaceObject) -> Result<(ObjectId, i64), EditError> {
        self.require_editing()?;
        let room = self.editable_room(place.room_id).await?;
        let group_id = self.group_for(room.id).await?;
        let context = self.spawn_context(&room);

        let created = self
            .instantiate(
                context,
                NewRoomObject {
                    room_id: room.id,
                    type_id: place.type_id,
                    group_id,
                    position: place.position,
                    orientation: place.orientation,
                    radius: place.radius,
                },
            )
            .await?;

        info!(object_id = %created.id, room_id = %room.id, "Added object");
        Ok((created.id, created.revision))
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn remove_object(&mut self, object_id: ObjectId) -> Result<(), EditError> {
        let (_, room_id) = self.require_editing()?;
        let entity_id = self.live_object(object_id, room_id).await?.0;
        self.locks
            .ensure_writable(object_id, self.actor.user_id)
            .await?;

        match self.repository.get_object(object_id).await? {
            Some(row) => {
                self.editable_room(row.room_id).await?;
                self.repository.delete_object(object_id).await?;
            }
            None => debug!(object_id = %object_id, "Object row already gone, detaching live entity only"),
        }

        if self.world.unregister(entity_id).await.is_none() {
            warn!(entity_id = %entity_id, "Live entity was already missing from the world");
        }
        self.owned.retain(|owned| owned.object_id != object_id);
        self.selection.remove(&object_id);
        self.locks.release(&[object_id], self.actor.user_id).await;

        info!(object_id = %object_id, "Removed object");
        Ok(())
    }

    /// Duplicate a live object into `room_id`, shifted by `offset`
    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn copy_object(
        &mut self,
        object_id: ObjectId,
        room_id: RoomId,
        offset: Vec3,
    ) -> Result<ObjectId, EditError> {
        let (_, current_room) = self.require_editing()?;
        let source = self.live_object(object_id, current_room).await?.1;

        let room = self.editable_room(room_id).await?;
        let group_id = self.group_for(room.id).await?;
        let context = self.spawn_context(&room);

        let created = self
            .instantiate(
                context,
                NewRoomObject {
                    room_id: room.id,
                    type_id: source.type_id,
                    group_id,
                    position: source.position + offset,
                    orientation: source.orientation,
                    radius: source.radius,
                },
            )
            .await?;

        info!(source_id = %object_id, object_id = %created.id, "Copied object");
        Ok(created.id)
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn edit_object_name(&self, object_id: ObjectId, name: &str) -> Result<(), EditError> {
        self.require_editing()?;
        let (object, _) = self.editable_target(object_id).await?;

        if !self.repository.update_object_name(object.id, name).await? {
            return Err(EditError::not_found("Object", object_id));
        }
        self.world
            .update(object.id.into(), EntityUpdate::Rename(name.to_string()))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn edit_object_radius(&self, object_id: ObjectId, radius: f64) -> Result<(), EditError> {
        self.require_editing()?;
        let (object, _) = self.editable_target(object_id).await?;

        if !self.repository.update_object_radius(object.id, radius).await? {
            return Err(EditError::not_found("Object", object_id));
        }
        self.world
            .update(object.id.into(), EntityUpdate::Radius(radius))
            .await?;
        Ok(())
    }

    /// Move an object to `offset` from the configured basis; the offset is what gets stored
    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn edit_object_xyz(&self, object_id: ObjectId, offset: Vec3) -> Result<(), EditError> {
        self.require_editing()?;
        let (object, room) = self.editable_target(object_id).await?;

        let basis = match self.settings.xyz_basis {
            PositionBasis::ShipPosition => {
                self.world
                    .get(self.actor.ship_id)
                    .await
                    .ok_or_else(|| EditError::not_found("Ship", self.actor.ship_id))?
                    .position
            }
            PositionBasis::RoomOrigin => room.origin,
        };

        if !self.repository.update_object_position(object.id, offset).await? {
            return Err(EditError::not_found("Object", object_id));
        }
        self.world
            .update(
                object.id.into(),
                EntityUpdate::Place {
                    world: basis + offset,
                    local: offset,
                },
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn edit_object_yaw_pitch_roll(
        &self,
        object_id: ObjectId,
        orientation: Orientation,
    ) -> Result<(), EditError> {
        self.require_editing()?;
        let (object, _) = self.editable_target(object_id).await?;

        if !self
            .repository
            .update_object_orientation(object.id, orientation)
            .await?
        {
            return Err(EditError::not_found("Object", object_id));
        }
        self.world
            .update(object.id.into(), EntityUpdate::Orientation(orientation))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Template operations
    // =========================================================================

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn template_add(&self, name: &str, description: &str) -> Result<TemplateId, EditError> {
        let (_, room_id) = self.require_editing()?;
        let template_id = self
            .repository
            .create_template(self.actor.user_id, name, description, room_id)
            .await?;
        info!(template_id = %template_id, "Created template");
        Ok(template_id)
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn template_remove(&self, template_id: TemplateId) -> Result<(), EditError> {
        self.require_editing()?;
        if !self.repository.delete_template(template_id).await? {
            return Err(EditError::not_found("Template", template_id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn template_edit(
        &self,
        template_id: TemplateId,
        name: &str,
        description: &str,
    ) -> Result<(), EditError> {
        self.require_editing()?;
        if !self
            .repository
            .update_template(template_id, name, description)
            .await?
        {
            return Err(EditError::not_found("Template", template_id));
        }
        Ok(())
    }

    /// Instantiate every object of a template into `room_id`
    ///
    /// Objects that fail to spawn are rolled back and skipped. Returns the
    /// ids of the objects that were created.
    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn add_template_objects(
        &mut self,
        room_id: RoomId,
        template_id: TemplateId,
        offset: Vec3,
    ) -> Result<Vec<ObjectId>, EditError> {
        self.require_editing()?;
        let template = self
            .repository
            .get_template(template_id)
            .await?
            .ok_or_else(|| EditError::not_found("Template", template_id))?;
        let room = self.editable_room(room_id).await?;
        let group_id = self.group_for(room.id).await?;
        let context = self.spawn_context(&room);

        let template_objects = self.repository.list_template_objects(template.id).await?;
        let mut created = Vec::with_capacity(template_objects.len());
        for template_object in template_objects {
            let object = NewRoomObject {
                room_id: room.id,
                type_id: template_object.type_id,
                group_id,
                position: template_object.position + offset,
                orientation: template_object.orientation,
                radius: template_object.radius,
            };
            match self.instantiate(context, object).await {
                Ok(object) => created.push(object.id),
                Err(err @ (EditError::SpawnFailure(_) | EditError::World(_))) => {
                    warn!(
                        template_id = %template.id,
                        type_id = %template_object.type_id,
                        error = %err,
                        "Skipped template object"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        info!(template_id = %template.id, count = created.len(), "Instantiated template");
        Ok(created)
    }

    /// Capture the listed objects into a template; unknown ids are skipped
    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn template_object_add_list(
        &self,
        template_id: TemplateId,
        object_ids: &[ObjectId],
    ) -> Result<usize, EditError> {
        self.require_editing()?;
        self.repository
            .get_template(template_id)
            .await?
            .ok_or_else(|| EditError::not_found("Template", template_id))?;

        let mut added = 0;
        for object_id in object_ids {
            let Some(object) = self.repository.get_object(*object_id).await? else {
                debug!(object_id = %object_id, "Skipping unknown object");
                continue;
            };
            self.repository
                .add_template_object(&TemplateObject {
                    template_id,
                    type_id: object.type_id,
                    position: object.position,
                    orientation: object.orientation,
                    radius: object.radius,
                })
                .await?;
            added += 1;
        }
        Ok(added)
    }

    // =========================================================================
    // Room navigation
    // =========================================================================

    /// Open a dungeon for editing, in `room_id` or its first room
    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn edit_dungeon(
        &mut self,
        dungeon_id: DungeonId,
        room_id: Option<RoomId>,
    ) -> Result<RoomId, EditError> {
        let dungeon = self
            .repository
            .get_dungeon(dungeon_id)
            .await?
            .ok_or_else(|| EditError::not_found("Dungeon", dungeon_id))?;

        let room = match room_id {
            Some(room_id) => self.room_in_dungeon(room_id, dungeon.id).await?,
            None => self
                .repository
                .list_rooms(dungeon.id)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| EditError::not_found("Room of dungeon", dungeon.id))?,
        };

        let room_id = room.id;
        self.enter_room(dungeon.id, room).await?;
        Ok(room_id)
    }

    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn goto_room(&mut self, room_id: RoomId) -> Result<(), EditError> {
        let (dungeon_id, _) = self.require_editing()?;
        let room = self.room_in_dungeon(room_id, dungeon_id).await?;
        self.enter_room(dungeon_id, room).await
    }

    /// Drop everything the session owns and go back to idle
    pub async fn reset(&mut self) {
        self.detach_all().await;
        self.state = EditState::Idle;
    }

    pub async fn room_groups(&self) -> Result<Vec<RoomGroup>, EditError> {
        let (_, room_id) = self.require_editing()?;
        Ok(self.repository.list_room_groups(room_id).await?)
    }

    /// Replace the selection, locking every selected object for this actor
    #[instrument(skip(self), fields(user_id = %self.actor.user_id))]
    pub async fn select_objects(&mut self, object_ids: &[ObjectId]) -> Result<(), EditError> {
        self.require_editing()?;
        let selection: BTreeSet<ObjectId> = object_ids.iter().copied().collect();
        let wanted: Vec<ObjectId> = selection.iter().copied().collect();
        self.locks.acquire_all(&wanted, self.actor.user_id).await?;

        let dropped: Vec<ObjectId> = self.selection.difference(&selection).copied().collect();
        self.locks.release(&dropped, self.actor.user_id).await;
        self.selection = selection;
        Ok(())
    }

    /// Tear the session down: release every owned entity and the actor's ship
    pub async fn close(&mut self) {
        self.reset().await;
        if self.world.unregister(self.actor.ship_id).await.is_none() {
            debug!(ship_id = %self.actor.ship_id, "Ship already gone at session close");
        }
        info!(user_id = %self.actor.user_id, "Editing session closed");
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_editing(&self) -> Result<(DungeonId, RoomId), EditError> {
        match self.state {
            EditState::EditingRoom {
                dungeon_id,
                room_id,
            } => Ok((dungeon_id, room_id)),
            EditState::Idle => Err(EditError::NotEditing),
        }
    }

    fn spawn_context(&self, room: &Room) -> SpawnContext {
        SpawnContext {
            location_id: self.actor.location_id,
            room_origin: room.origin,
        }
    }

    /// Load a room and make sure its dungeon may be mutated
    async fn editable_room(&self, room_id: RoomId) -> Result<Room, EditError> {
        let room = self
            .repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| EditError::not_found("Room", room_id))?;
        let dungeon = self
            .repository
            .get_dungeon(room.dungeon_id)
            .await?
            .ok_or_else(|| EditError::not_found("Dungeon", room.dungeon_id))?;

        if dungeon.status.is_frozen() {
            return Err(EditError::DungeonFrozen(dungeon.id));
        }
        Ok(room)
    }

    async fn room_in_dungeon(&self, room_id: RoomId, dungeon_id: DungeonId) -> Result<Room, EditError> {
        let room = self
            .repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| EditError::not_found("Room", room_id))?;
        if room.dungeon_id != dungeon_id {
            return Err(EditError::RoomNotInDungeon {
                room_id,
                dungeon_id,
            });
        }
        Ok(room)
    }

    /// Resolve an edit target through the world and check it may be changed
    async fn editable_target(&self, object_id: ObjectId) -> Result<(RoomObject, Room), EditError> {
        let entity_id = EntityId::from(object_id);
        let entity = self
            .world
            .get(entity_id)
            .await
            .ok_or_else(|| EditError::not_found("Object", object_id))?;
        let object = entity
            .as_dungeon_object()
            .cloned()
            .ok_or(EditError::NotEditable(entity_id))?;

        self.locks
            .ensure_writable(object.id, self.actor.user_id)
            .await?;
        let room = self.editable_room(object.room_id).await?;
        Ok((object, room))
    }

    /// A live object this session may remove or copy: one it holds, or any
    /// object of the room being edited
    async fn live_object(
        &self,
        object_id: ObjectId,
        current_room: RoomId,
    ) -> Result<(EntityId, RoomObject), EditError> {
        let entity_id = EntityId::from(object_id);
        let held = self.owned.iter().any(|owned| owned.object_id == object_id);
        self.world
            .get(entity_id)
            .await
            .and_then(|entity| entity.as_dungeon_object().cloned())
            .filter(|object| held || object.room_id == current_room)
            .map(|object| (entity_id, object))
            .ok_or_else(|| EditError::not_found("Object", object_id))
    }

    async fn group_for(&self, room_id: RoomId) -> Result<GroupId, EditError> {
        Ok(self
            .repository
            .first_group_for_room(room_id)
            .await?
            .unwrap_or(GroupId::UNGROUPED))
    }

    /// Persist a new object and mirror it into the world, rolling the row back if the spawn fails
    async fn instantiate(
        &mut self,
        context: SpawnContext,
        object: NewRoomObject,
    ) -> Result<RoomObject, EditError> {
        let object_id = self.repository.create_object(&object).await?;
        let persisted = object.into_persisted(object_id);

        if let Err(err) = self.attach(context, persisted.clone()).await {
            match self.repository.delete_object(object_id).await {
                Ok(_) => debug!(object_id = %object_id, "Rolled back object row after failed spawn"),
                Err(rollback) => warn!(
                    object_id = %object_id,
                    error = %rollback,
                    "Failed to roll back object row; store and world have diverged"
                ),
            }
            return Err(err);
        }
        Ok(persisted)
    }

    /// Hold the live entity of a persisted object, spawning it if no other
    /// session has it yet
    async fn attach(&mut self, context: SpawnContext, object: RoomObject) -> Result<(), EditError> {
        let object_id = object.id;
        let entity_id = EntityId::from(object_id);

        if self.world.retain(entity_id).await.is_err() {
            let entity = self
                .world
                .spawn(SpawnRequest {
                    location_id: context.location_id,
                    position: object.position + context.room_origin,
                    object,
                })
                .await?;
            match self.world.register(entity).await {
                Ok(_) => {}
                Err(WorldError::AlreadyRegistered(_)) => self.world.retain(entity_id).await?,
                Err(err) => return Err(err.into()),
            }
        }

        self.owned.push(OwnedObject {
            object_id,
            entity_id,
        });
        Ok(())
    }

    async fn enter_room(&mut self, dungeon_id: DungeonId, room: Room) -> Result<(), EditError> {
        let objects = self.repository.list_room_objects(room.id).await?;
        self.detach_all().await;

        if let Err(err) = self
            .world
            .update(self.actor.ship_id, EntityUpdate::MoveTo(room.origin))
            .await
        {
            warn!(ship_id = %self.actor.ship_id, error = %err, "Could not move ship to room");
        }

        let context = self.spawn_context(&room);
        let total = objects.len();
        for object in objects {
            let object_id = object.id;
            if let Err(err) = self.attach(context, object).await {
                warn!(object_id = %object_id, error = %err, "Skipped object while loading room");
            }
        }

        self.state = EditState::EditingRoom {
            dungeon_id,
            room_id: room.id,
        };
        info!(
            dungeon_id = %dungeon_id,
            room_id = %room.id,
            held = self.owned.len(),
            total,
            "Entered room"
        );
        Ok(())
    }

    async fn detach_all(&mut self) {
        for owned in self.owned.drain(..) {
            match self.world.release(owned.entity_id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(entity_id = %owned.entity_id, "Entity still held by another session")
                }
                Err(_) => debug!(entity_id = %owned.entity_id, "Entity was removed while held"),
            }
        }
        let selection: Vec<ObjectId> = std::mem::take(&mut self.selection)
            .into_iter()
            .collect();
        self.locks.release(&selection, self.actor.user_id).await;
    }
}
