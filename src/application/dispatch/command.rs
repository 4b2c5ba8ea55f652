//! Typed commands decoded from validated calls

use crate::application::dispatch::{CallError, Operation, ValidatedArgs};
use crate::application::ports::outbound::DungeonFilter;
use crate::application::services::PlaceObject;
use crate::domain::value_objects::{
    ArchetypeId, DungeonId, FactionId, ItemTypeId, ObjectId, Orientation, RoomId, TemplateId,
    Vec3,
};

/// A decoded call, already split by whether it needs an editing session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Lookup(LookupCommand),
    Session(SessionCommand),
}

/// Stateless dungeon lookups
#[derive(Debug, Clone, PartialEq)]
pub enum LookupCommand {
    GetArchetypes,
    GetFactions,
    GetDungeons(DungeonFilter),
    GetTemplates,
    GetRooms(DungeonId),
    GetRoomObjectPaletteData,
}

/// Operations run against the caller's editing session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    IsObjectLocked(ObjectId),
    AddObject(PlaceObject),
    RemoveObject(ObjectId),
    CopyObject {
        object_id: ObjectId,
        room_id: RoomId,
        offset: Vec3,
    },
    EditObjectName {
        object_id: ObjectId,
        name: String,
    },
    EditObjectRadius {
        object_id: ObjectId,
        radius: f64,
    },
    EditObjectXyz {
        object_id: ObjectId,
        offset: Vec3,
    },
    EditObjectYawPitchRoll {
        object_id: ObjectId,
        orientation: Orientation,
    },
    TemplateAdd {
        name: String,
        description: String,
    },
    TemplateRemove(TemplateId),
    TemplateEdit {
        template_id: TemplateId,
        name: String,
        description: String,
    },
    AddTemplateObjects {
        room_id: RoomId,
        template_id: TemplateId,
        offset: Vec3,
    },
    TemplateObjectAddDungeonList {
        template_id: TemplateId,
        object_ids: Vec<ObjectId>,
    },
    EditDungeon {
        dungeon_id: DungeonId,
        room_id: Option<RoomId>,
    },
    GotoRoom(RoomId),
    Reset,
    GetCurrentlyEditedRoomId,
    GetRoomObjects,
    GetRoomGroups,
    ObjectSelection(Vec<ObjectId>),
}

impl Command {
    pub fn decode(operation: Operation, mut args: ValidatedArgs) -> Result<Self, CallError> {
        let command = match operation {
            Operation::GetArchetypes => return Ok(Command::Lookup(LookupCommand::GetArchetypes)),
            Operation::GetFactions => return Ok(Command::Lookup(LookupCommand::GetFactions)),
            Operation::GetDungeons => {
                let filter = dungeon_filter(&mut args)?;
                return Ok(Command::Lookup(LookupCommand::GetDungeons(filter)));
            }
            Operation::GetTemplates => return Ok(Command::Lookup(LookupCommand::GetTemplates)),
            Operation::GetRooms => {
                let dungeon_id = DungeonId::new(args.int("dungeonID")?);
                return Ok(Command::Lookup(LookupCommand::GetRooms(dungeon_id)));
            }
            Operation::GetRoomObjectPaletteData => {
                return Ok(Command::Lookup(LookupCommand::GetRoomObjectPaletteData));
            }
            Operation::IsObjectLocked => SessionCommand::IsObjectLocked(object_id(&mut args)?),
            Operation::AddObject => SessionCommand::AddObject(PlaceObject {
                room_id: RoomId::new(args.int("roomID")?),
                type_id: ItemTypeId::new(args.int("typeID")?),
                position: vec3(&mut args)?,
                orientation: orientation(&mut args)?,
                radius: args.float("radius")?,
            }),
            Operation::RemoveObject => SessionCommand::RemoveObject(object_id(&mut args)?),
            Operation::CopyObject => SessionCommand::CopyObject {
                object_id: object_id(&mut args)?,
                room_id: RoomId::new(args.int("roomID")?),
                offset: vec3(&mut args)?,
            },
            Operation::EditObjectName => SessionCommand::EditObjectName {
                object_id: object_id(&mut args)?,
                name: args.string("name")?,
            },
            Operation::EditObjectRadius => SessionCommand::EditObjectRadius {
                object_id: object_id(&mut args)?,
                radius: args.float("radius")?,
            },
            Operation::EditObjectXyz => SessionCommand::EditObjectXyz {
                object_id: object_id(&mut args)?,
                offset: vec3(&mut args)?,
            },
            Operation::EditObjectYawPitchRoll => SessionCommand::EditObjectYawPitchRoll {
                object_id: object_id(&mut args)?,
                orientation: orientation(&mut args)?,
            },
            Operation::TemplateAdd => SessionCommand::TemplateAdd {
                name: args.string("name")?,
                description: args.string("description")?,
            },
            Operation::TemplateRemove => {
                SessionCommand::TemplateRemove(TemplateId::new(args.int("templateID")?))
            }
            Operation::TemplateEdit => SessionCommand::TemplateEdit {
                template_id: TemplateId::new(args.int("templateID")?),
                name: args.string("name")?,
                description: args.string("description")?,
            },
            Operation::AddTemplateObjects => SessionCommand::AddTemplateObjects {
                room_id: RoomId::new(args.int("roomID")?),
                template_id: TemplateId::new(args.int("templateID")?),
                offset: args.triple("position")?,
            },
            Operation::TemplateObjectAddDungeonList => {
                SessionCommand::TemplateObjectAddDungeonList {
                    template_id: TemplateId::new(args.int("templateID")?),
                    object_ids: object_ids(&mut args)?,
                }
            }
            Operation::EditDungeon => SessionCommand::EditDungeon {
                dungeon_id: DungeonId::new(args.int("dungeonID")?),
                room_id: args.opt_int("roomID")?.map(RoomId::new),
            },
            Operation::GotoRoom => SessionCommand::GotoRoom(RoomId::new(args.int("roomID")?)),
            Operation::Reset => SessionCommand::Reset,
            Operation::GetCurrentlyEditedRoomId => SessionCommand::GetCurrentlyEditedRoomId,
            Operation::GetRoomObjects => SessionCommand::GetRoomObjects,
            Operation::GetRoomGroups => SessionCommand::GetRoomGroups,
            Operation::ObjectSelection => SessionCommand::ObjectSelection(object_ids(&mut args)?),
        };
        Ok(Command::Session(command))
    }
}

fn object_id(args: &mut ValidatedArgs) -> Result<ObjectId, CallError> {
    args.int("objectID").map(ObjectId::new)
}

fn object_ids(args: &mut ValidatedArgs) -> Result<Vec<ObjectId>, CallError> {
    Ok(args
        .int_list("objectIDs")?
        .into_iter()
        .map(ObjectId::new)
        .collect())
}

fn vec3(args: &mut ValidatedArgs) -> Result<Vec3, CallError> {
    Ok(Vec3::new(args.float("x")?, args.float("y")?, args.float("z")?))
}

fn orientation(args: &mut ValidatedArgs) -> Result<Orientation, CallError> {
    Ok(Orientation::new(
        args.float("yaw")?,
        args.float("pitch")?,
        args.float("roll")?,
    ))
}

/// `dungeonID` alone, `archetypeID` with `factionID`, or nothing at all
fn dungeon_filter(args: &mut ValidatedArgs) -> Result<DungeonFilter, CallError> {
    let dungeon_id = args.opt_int("dungeonID")?;
    let archetype_id = args.opt_int("archetypeID")?;
    let faction_id = args.opt_int("factionID")?;

    match (dungeon_id, archetype_id, faction_id) {
        (None, None, None) => Ok(DungeonFilter::All),
        (Some(id), None, None) => Ok(DungeonFilter::ById(DungeonId::new(id))),
        (None, Some(archetype_id), Some(faction_id)) => Ok(DungeonFilter::ByArchetypeAndFaction {
            archetype_id: ArchetypeId::new(archetype_id),
            faction_id: FactionId::new(faction_id),
        }),
        _ => Err(CallError::InvalidArgumentCount {
            method: args.method(),
            detail: "expected dungeonID, or archetypeID together with factionID".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::CallValue;
    use std::collections::BTreeMap;

    fn decode(
        operation: Operation,
        args: Vec<CallValue>,
        kwargs: &[(&str, CallValue)],
    ) -> Result<Command, CallError> {
        let kwargs: BTreeMap<String, CallValue> = kwargs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        let validated = operation
            .schema()
            .validate(operation.name(), &args, &kwargs)?;
        Command::decode(operation, validated)
    }

    #[test]
    fn test_decode_add_object() {
        let args: Vec<CallValue> = vec![
            100i64.into(),
            1001i64.into(),
            1.0.into(),
            2.0.into(),
            3.0.into(),
            90i64.into(),
            0i64.into(),
            0i64.into(),
            500.0.into(),
        ];

        let command = decode(Operation::AddObject, args, &[]).unwrap();

        assert_eq!(
            command,
            Command::Session(SessionCommand::AddObject(PlaceObject {
                room_id: RoomId::new(100),
                type_id: ItemTypeId::new(1001),
                position: Vec3::new(1.0, 2.0, 3.0),
                orientation: Orientation::new(90.0, 0.0, 0.0),
                radius: 500.0,
            }))
        );
    }

    #[test]
    fn test_decode_named_edit() {
        let command = decode(
            Operation::EditObjectXyz,
            vec![],
            &[
                ("objectID", 9i64.into()),
                ("x", 1i64.into()),
                ("y", 2.5.into()),
                ("z", (-1i64).into()),
            ],
        )
        .unwrap();

        assert_eq!(
            command,
            Command::Session(SessionCommand::EditObjectXyz {
                object_id: ObjectId::new(9),
                offset: Vec3::new(1.0, 2.5, -1.0),
            })
        );
    }

    #[test]
    fn test_dungeon_filter_variants() {
        assert_eq!(
            decode(Operation::GetDungeons, vec![], &[]).unwrap(),
            Command::Lookup(LookupCommand::GetDungeons(DungeonFilter::All))
        );
        assert_eq!(
            decode(Operation::GetDungeons, vec![], &[("dungeonID", 10i64.into())]).unwrap(),
            Command::Lookup(LookupCommand::GetDungeons(DungeonFilter::ById(DungeonId::new(10))))
        );
        assert_eq!(
            decode(
                Operation::GetDungeons,
                vec![],
                &[("archetypeID", 1i64.into()), ("factionID", 500001i64.into())]
            )
            .unwrap(),
            Command::Lookup(LookupCommand::GetDungeons(
                DungeonFilter::ByArchetypeAndFaction {
                    archetype_id: ArchetypeId::new(1),
                    faction_id: FactionId::new(500001),
                }
            ))
        );
    }

    #[test]
    fn test_lone_archetype_is_invalid_count() {
        let err = decode(Operation::GetDungeons, vec![], &[("archetypeID", 1i64.into())]).unwrap_err();

        assert!(matches!(err, CallError::InvalidArgumentCount { method: "DEGetDungeons", .. }));
    }

    #[test]
    fn test_decode_edit_dungeon_optional_room() {
        assert_eq!(
            decode(Operation::EditDungeon, vec![10i64.into()], &[]).unwrap(),
            Command::Session(SessionCommand::EditDungeon {
                dungeon_id: DungeonId::new(10),
                room_id: None,
            })
        );
        assert_eq!(
            decode(Operation::EditDungeon, vec![10i64.into()], &[("roomID", 101i64.into())]).unwrap(),
            Command::Session(SessionCommand::EditDungeon {
                dungeon_id: DungeonId::new(10),
                room_id: Some(RoomId::new(101)),
            })
        );
    }

    #[test]
    fn test_lookups_and_session_operations_split() {
        assert_eq!(
            decode(Operation::GetRooms, vec![], &[("dungeonID", 10i64.into())]).unwrap(),
            Command::Lookup(LookupCommand::GetRooms(DungeonId::new(10)))
        );
        assert_eq!(
            decode(Operation::Reset, vec![], &[]).unwrap(),
            Command::Session(SessionCommand::Reset)
        );
        for operation in Operation::ALL {
            let is_lookup =
                operation.name().starts_with("DE") || operation == Operation::GetArchetypes;
            if let Ok(command) = decode(operation, vec![], &[]) {
                let decoded_as_lookup = matches!(command, Command::Lookup(_));
                assert_eq!(decoded_as_lookup, is_lookup, "{}", operation.name());
            }
        }
    }

    #[test]
    fn test_decode_selection_list() {
        let ids: CallValue = vec![3i64, 4, 5].into();

        assert_eq!(
            decode(Operation::ObjectSelection, vec![ids], &[]).unwrap(),
            Command::Session(SessionCommand::ObjectSelection(vec![
                ObjectId::new(3),
                ObjectId::new(4),
                ObjectId::new(5)
            ]))
        );
    }
}
