//! Call Dispatcher - Routes remote calls to the dungeon service or a session
//!
//! A call is validated against its operation's schema, decoded into a typed
//! `Command` and then run. Stateless lookups go to the `DungeonService`;
//! everything else needs the caller's bound `EditingSession`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn, Instrument};

use crate::application::dispatch::{
    CallError, Command, LookupCommand, Operation, SessionCommand,
};
use crate::application::dto::{CallValue, Rowset};
use crate::application::services::{DungeonService, EditingSession};
use crate::domain::value_objects::UserId;

/// A remote call as received from a client
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteCall {
    pub method: String,
    #[serde(default)]
    pub args: Vec<CallValue>,
    #[serde(default)]
    pub kwargs: BTreeMap<String, CallValue>,
}

impl RemoteCall {
    pub fn new(method: impl Into<String>, args: Vec<CallValue>) -> Self {
        Self {
            method: method.into(),
            args,
            kwargs: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<CallValue>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

pub struct Dispatcher {
    dungeon_service: Arc<dyn DungeonService>,
}

impl Dispatcher {
    pub fn new(dungeon_service: Arc<dyn DungeonService>) -> Self {
        Self { dungeon_service }
    }

    /// Run one call on behalf of `caller`
    ///
    /// `session` is the caller's bound editing session, if it has one.
    pub async fn dispatch(
        &self,
        caller: UserId,
        session: Option<&mut EditingSession>,
        call: &RemoteCall,
    ) -> Result<CallValue, CallError> {
        let span = info_span!(
            "remote_call",
            method = %call.method,
            user_id = %caller,
            args = call.args.len(),
            kwargs = call.kwargs.len(),
        );

        async move {
            debug!(args = ?call.args, kwargs = ?call.kwargs, "Call received");
            let result = self.execute(caller, session, call).await;
            match &result {
                Ok(_) => debug!("Call completed"),
                Err(err) => warn!(
                    code = err.code(),
                    error = %err,
                    args = ?call.args,
                    kwargs = ?call.kwargs,
                    "Call failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        caller: UserId,
        session: Option<&mut EditingSession>,
        call: &RemoteCall,
    ) -> Result<CallValue, CallError> {
        let operation = Operation::from_name(&call.method)
            .ok_or_else(|| CallError::UnknownMethod(call.method.clone()))?;
        let args = operation
            .schema()
            .validate(operation.name(), &call.args, &call.kwargs)?;
        match Command::decode(operation, args)? {
            Command::Lookup(command) => self.run_lookup(caller, command).await,
            Command::Session(command) => {
                let session = session.ok_or(CallError::NoBoundSession(operation.name()))?;
                run_session_command(session, command).await
            }
        }
    }

    async fn run_lookup(
        &self,
        caller: UserId,
        command: LookupCommand,
    ) -> Result<CallValue, CallError> {
        let rowset = match command {
            LookupCommand::GetArchetypes => self.dungeon_service.get_archetypes().await?,
            LookupCommand::GetFactions => self.dungeon_service.get_factions().await?,
            LookupCommand::GetDungeons(filter) => {
                self.dungeon_service.get_dungeons(filter).await?
            }
            LookupCommand::GetTemplates => self.dungeon_service.get_templates(caller).await?,
            LookupCommand::GetRooms(dungeon_id) => {
                self.dungeon_service.get_rooms(dungeon_id).await?
            }
            LookupCommand::GetRoomObjectPaletteData => {
                let palette = self.dungeon_service.get_room_object_palette().await?;
                return Ok(CallValue::List(
                    palette
                        .into_iter()
                        .map(|entry| {
                            CallValue::List(vec![entry.type_id.value().into(), entry.name.into()])
                        })
                        .collect(),
                ));
            }
        };
        Ok(rowset.into())
    }
}

async fn run_session_command(
    session: &mut EditingSession,
    command: SessionCommand,
) -> Result<CallValue, CallError> {
    let value = match command {
        SessionCommand::IsObjectLocked(object_id) => {
            let status = session.is_object_locked(object_id).await?;
            let holders: Vec<i64> = status.holders.iter().map(|holder| holder.value()).collect();
            CallValue::List(vec![status.locked.into(), holders.into()])
        }
        SessionCommand::AddObject(place) => {
            let (object_id, revision) = session.add_object(place).await?;
            CallValue::List(vec![object_id.value().into(), revision.into()])
        }
        SessionCommand::RemoveObject(object_id) => {
            session.remove_object(object_id).await?;
            CallValue::None
        }
        SessionCommand::CopyObject {
            object_id,
            room_id,
            offset,
        } => session
            .copy_object(object_id, room_id, offset)
            .await?
            .value()
            .into(),
        SessionCommand::EditObjectName { object_id, name } => {
            session.edit_object_name(object_id, &name).await?;
            CallValue::None
        }
        SessionCommand::EditObjectRadius { object_id, radius } => {
            session.edit_object_radius(object_id, radius).await?;
            CallValue::None
        }
        SessionCommand::EditObjectXyz { object_id, offset } => {
            session.edit_object_xyz(object_id, offset).await?;
            CallValue::None
        }
        SessionCommand::EditObjectYawPitchRoll {
            object_id,
            orientation,
        } => {
            session
                .edit_object_yaw_pitch_roll(object_id, orientation)
                .await?;
            CallValue::None
        }
        SessionCommand::TemplateAdd { name, description } => session
            .template_add(&name, &description)
            .await?
            .value()
            .into(),
        SessionCommand::TemplateRemove(template_id) => {
            session.template_remove(template_id).await?;
            CallValue::None
        }
        SessionCommand::TemplateEdit {
            template_id,
            name,
            description,
        } => {
            session
                .template_edit(template_id, &name, &description)
                .await?;
            CallValue::None
        }
        SessionCommand::AddTemplateObjects {
            room_id,
            template_id,
            offset,
        } => {
            let created = session
                .add_template_objects(room_id, template_id, offset)
                .await?;
            ids(created.into_iter().map(|id| id.value()))
        }
        SessionCommand::TemplateObjectAddDungeonList {
            template_id,
            object_ids,
        } => {
            let added = session
                .template_object_add_list(template_id, &object_ids)
                .await?;
            CallValue::Int(added as i64)
        }
        SessionCommand::EditDungeon {
            dungeon_id,
            room_id,
        } => session
            .edit_dungeon(dungeon_id, room_id)
            .await?
            .value()
            .into(),
        SessionCommand::GotoRoom(room_id) => {
            session.goto_room(room_id).await?;
            CallValue::None
        }
        SessionCommand::Reset => {
            session.reset().await;
            CallValue::None
        }
        SessionCommand::GetCurrentlyEditedRoomId => {
            session.current_room_id().map(|id| id.value()).into()
        }
        SessionCommand::GetRoomObjects => {
            let objects = session.room_objects().await;
            ids(objects.into_iter().map(|id| id.value()))
        }
        SessionCommand::GetRoomGroups => {
            let mut rowset = Rowset::new(&["groupID", "groupName", "roomID"]);
            for group in session.room_groups().await? {
                rowset.push(vec![
                    group.id.value().into(),
                    group.name.into(),
                    group.room_id.value().into(),
                ]);
            }
            rowset.into()
        }
        SessionCommand::ObjectSelection(object_ids) => {
            session.select_objects(&object_ids).await?;
            CallValue::None
        }
    };
    Ok(value)
}

fn ids(values: impl Iterator<Item = i64>) -> CallValue {
    CallValue::List(values.map(CallValue::Int).collect())
}
