//! Remote operations and their argument schemas
//!
//! Every method a client may call is a variant of `Operation`. Each variant
//! declares which positional and named parameters it takes; a call is checked
//! against that schema before anything is decoded or executed.

use std::collections::BTreeMap;

use crate::application::dispatch::CallError;
use crate::application::dto::CallValue;
use crate::domain::value_objects::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Session-bound editing
    IsObjectLocked,
    AddObject,
    RemoveObject,
    CopyObject,
    EditObjectName,
    EditObjectRadius,
    EditObjectXyz,
    EditObjectYawPitchRoll,
    TemplateAdd,
    TemplateRemove,
    TemplateEdit,
    AddTemplateObjects,
    TemplateObjectAddDungeonList,
    EditDungeon,
    GotoRoom,
    Reset,
    GetCurrentlyEditedRoomId,
    GetRoomObjects,
    GetRoomGroups,
    ObjectSelection,
    // Stateless lookups
    GetArchetypes,
    GetFactions,
    GetDungeons,
    GetTemplates,
    GetRooms,
    GetRoomObjectPaletteData,
}

impl Operation {
    pub const ALL: [Operation; 26] = [
        Operation::IsObjectLocked,
        Operation::AddObject,
        Operation::RemoveObject,
        Operation::CopyObject,
        Operation::EditObjectName,
        Operation::EditObjectRadius,
        Operation::EditObjectXyz,
        Operation::EditObjectYawPitchRoll,
        Operation::TemplateAdd,
        Operation::TemplateRemove,
        Operation::TemplateEdit,
        Operation::AddTemplateObjects,
        Operation::TemplateObjectAddDungeonList,
        Operation::EditDungeon,
        Operation::GotoRoom,
        Operation::Reset,
        Operation::GetCurrentlyEditedRoomId,
        Operation::GetRoomObjects,
        Operation::GetRoomGroups,
        Operation::ObjectSelection,
        Operation::GetArchetypes,
        Operation::GetFactions,
        Operation::GetDungeons,
        Operation::GetTemplates,
        Operation::GetRooms,
        Operation::GetRoomObjectPaletteData,
    ];

    /// Method name on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Operation::IsObjectLocked => "IsObjectLocked",
            Operation::AddObject => "AddObject",
            Operation::RemoveObject => "RemoveObject",
            Operation::CopyObject => "CopyObject",
            Operation::EditObjectName => "EditObjectName",
            Operation::EditObjectRadius => "EditObjectRadius",
            Operation::EditObjectXyz => "EditObjectXYZ",
            Operation::EditObjectYawPitchRoll => "EditObjectYawPitchRoll",
            Operation::TemplateAdd => "TemplateAdd",
            Operation::TemplateRemove => "TemplateRemove",
            Operation::TemplateEdit => "TemplateEdit",
            Operation::AddTemplateObjects => "AddTemplateObjects",
            Operation::TemplateObjectAddDungeonList => "TemplateObjectAddDungeonList",
            Operation::EditDungeon => "EditDungeon",
            Operation::GotoRoom => "GotoRoom",
            Operation::Reset => "Reset",
            Operation::GetCurrentlyEditedRoomId => "GetCurrentlyEditedRoomID",
            Operation::GetRoomObjects => "GetRoomObjects",
            Operation::GetRoomGroups => "GetRoomGroups",
            Operation::ObjectSelection => "ObjectSelection",
            Operation::GetArchetypes => "GetArchetypes",
            Operation::GetFactions => "DEGetFactions",
            Operation::GetDungeons => "DEGetDungeons",
            Operation::GetTemplates => "DEGetTemplates",
            Operation::GetRooms => "DEGetRooms",
            Operation::GetRoomObjectPaletteData => "DEGetRoomObjectPaletteData",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.name() == name)
    }

    pub fn schema(&self) -> CallSchema {
        match self {
            Operation::IsObjectLocked | Operation::RemoveObject => OBJECT_ONLY,
            Operation::AddObject => ADD_OBJECT,
            Operation::CopyObject => COPY_OBJECT,
            Operation::EditObjectName => EDIT_OBJECT_NAME,
            Operation::EditObjectRadius => EDIT_OBJECT_RADIUS,
            Operation::EditObjectXyz => EDIT_OBJECT_XYZ,
            Operation::EditObjectYawPitchRoll => EDIT_OBJECT_YAW_PITCH_ROLL,
            Operation::TemplateAdd => TEMPLATE_ADD,
            Operation::TemplateRemove => TEMPLATE_ONLY,
            Operation::TemplateEdit => TEMPLATE_EDIT,
            Operation::AddTemplateObjects => ADD_TEMPLATE_OBJECTS,
            Operation::TemplateObjectAddDungeonList => TEMPLATE_OBJECT_ADD_LIST,
            Operation::EditDungeon => EDIT_DUNGEON,
            Operation::GotoRoom => ROOM_ONLY,
            Operation::ObjectSelection => OBJECT_SELECTION,
            Operation::GetDungeons => GET_DUNGEONS,
            Operation::GetRooms => GET_ROOMS,
            Operation::Reset
            | Operation::GetCurrentlyEditedRoomId
            | Operation::GetRoomObjects
            | Operation::GetRoomGroups
            | Operation::GetArchetypes
            | Operation::GetFactions
            | Operation::GetTemplates
            | Operation::GetRoomObjectPaletteData => CallSchema::EMPTY,
        }
    }
}

const OBJECT_ONLY: CallSchema = CallSchema::positional(&[int("objectID")]);
const ROOM_ONLY: CallSchema = CallSchema::positional(&[int("roomID")]);
const TEMPLATE_ONLY: CallSchema = CallSchema::positional(&[int("templateID")]);

const ADD_OBJECT: CallSchema = CallSchema::positional(&[
    int("roomID"),
    int("typeID"),
    float("x"),
    float("y"),
    float("z"),
    float("yaw"),
    float("pitch"),
    float("roll"),
    float("radius"),
]);

const COPY_OBJECT: CallSchema = CallSchema::positional(&[
    int("objectID"),
    int("roomID"),
    float("x"),
    float("y"),
    float("z"),
]);

const EDIT_OBJECT_NAME: CallSchema = CallSchema::positional(&[int("objectID"), string("name")]);

const EDIT_OBJECT_RADIUS: CallSchema = CallSchema::named(&[int("objectID"), float("radius")]);

const EDIT_OBJECT_XYZ: CallSchema =
    CallSchema::named(&[int("objectID"), float("x"), float("y"), float("z")]);

const EDIT_OBJECT_YAW_PITCH_ROLL: CallSchema = CallSchema::named(&[
    int("objectID"),
    float("yaw"),
    float("pitch"),
    float("roll"),
]);

const TEMPLATE_ADD: CallSchema = CallSchema::positional(&[string("name"), string("description")]);

const TEMPLATE_EDIT: CallSchema = CallSchema::positional(&[
    int("templateID"),
    string("name"),
    string("description"),
]);

const ADD_TEMPLATE_OBJECTS: CallSchema = CallSchema::positional(&[
    int("roomID"),
    int("templateID"),
    triple("position"),
]);

const TEMPLATE_OBJECT_ADD_LIST: CallSchema =
    CallSchema::positional(&[int("templateID"), int_list("objectIDs")]);

const EDIT_DUNGEON: CallSchema = CallSchema {
    positional: &[int("dungeonID")],
    named: &[optional(int("roomID"))],
};

const OBJECT_SELECTION: CallSchema = CallSchema::positional(&[int_list("objectIDs")]);

/// No arguments, `dungeonID`, or `archetypeID` with `factionID`
const GET_DUNGEONS: CallSchema = CallSchema::named(&[
    optional(int("dungeonID")),
    optional(int("archetypeID")),
    optional(int("factionID")),
]);

const GET_ROOMS: CallSchema = CallSchema::named(&[int("dungeonID")]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
    Str,
    /// A list of exactly three numbers
    Triple,
    IntList,
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Int => "int",
            ParamKind::Float => "float",
            ParamKind::Str => "string",
            ParamKind::Triple => "(x, y, z)",
            ParamKind::IntList => "list of int",
        }
    }

    fn coerce(&self, value: &CallValue) -> Option<ArgValue> {
        match self {
            ParamKind::Int => value.as_i64().map(ArgValue::Int),
            ParamKind::Float => value.as_f64().map(ArgValue::Float),
            ParamKind::Str => value.as_str().map(|s| ArgValue::Str(s.to_string())),
            ParamKind::Triple => value.as_triple().map(ArgValue::Triple),
            ParamKind::IntList => value.as_int_list().map(ArgValue::IntList),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

const fn int(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::Int,
        required: true,
    }
}

const fn float(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::Float,
        required: true,
    }
}

const fn string(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::Str,
        required: true,
    }
}

const fn triple(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::Triple,
        required: true,
    }
}

const fn int_list(name: &'static str) -> Param {
    Param {
        name,
        kind: ParamKind::IntList,
        required: true,
    }
}

const fn optional(param: Param) -> Param {
    Param {
        required: false,
        ..param
    }
}

/// Positional parameters (all required, exact count) and named parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSchema {
    pub positional: &'static [Param],
    pub named: &'static [Param],
}

impl CallSchema {
    pub const EMPTY: CallSchema = CallSchema {
        positional: &[],
        named: &[],
    };

    const fn positional(params: &'static [Param]) -> Self {
        Self {
            positional: params,
            named: &[],
        }
    }

    const fn named(params: &'static [Param]) -> Self {
        Self {
            positional: &[],
            named: params,
        }
    }

    /// Check a call's shape and coerce its values
    ///
    /// Arity is checked before any value, so a call with the wrong number of
    /// arguments always reports `InvalidArgumentCount`. Named arguments the
    /// schema does not declare are ignored; a `null` named value counts as absent.
    pub fn validate(
        &self,
        method: &'static str,
        args: &[CallValue],
        kwargs: &BTreeMap<String, CallValue>,
    ) -> Result<ValidatedArgs, CallError> {
        if args.len() != self.positional.len() {
            return Err(CallError::InvalidArgumentCount {
                method,
                detail: format!(
                    "expected {} positional arguments, got {}",
                    self.positional.len(),
                    args.len()
                ),
            });
        }

        let present = |param: &Param| {
            kwargs
                .get(param.name)
                .filter(|value| !matches!(value, CallValue::None))
        };
        if let Some(missing) = self
            .named
            .iter()
            .find(|param| param.required && present(param).is_none())
        {
            return Err(CallError::InvalidArgumentCount {
                method,
                detail: format!("missing named argument '{}'", missing.name),
            });
        }

        let mut values = BTreeMap::new();
        let supplied = self
            .positional
            .iter()
            .zip(args.iter())
            .chain(self.named.iter().filter_map(|param| present(param).map(|value| (param, value))));
        for (param, value) in supplied {
            let coerced = param
                .kind
                .coerce(value)
                .ok_or(CallError::InvalidArgumentType {
                    method,
                    param: param.name,
                    expected: param.kind.name(),
                    found: value.kind_name(),
                })?;
            values.insert(param.name, coerced);
        }

        Ok(ValidatedArgs { method, values })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Str(String),
    Triple(Vec3),
    IntList(Vec<i64>),
}

impl ArgValue {
    fn kind(&self) -> ParamKind {
        match self {
            ArgValue::Int(_) => ParamKind::Int,
            ArgValue::Float(_) => ParamKind::Float,
            ArgValue::Str(_) => ParamKind::Str,
            ArgValue::Triple(_) => ParamKind::Triple,
            ArgValue::IntList(_) => ParamKind::IntList,
        }
    }
}

/// Arguments that passed schema validation, keyed by parameter name
#[derive(Debug)]
pub struct ValidatedArgs {
    method: &'static str,
    values: BTreeMap<&'static str, ArgValue>,
}

impl ValidatedArgs {
    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn int(&mut self, name: &'static str) -> Result<i64, CallError> {
        match self.values.remove(name) {
            Some(ArgValue::Int(value)) => Ok(value),
            other => Err(self.mismatch(name, ParamKind::Int, other)),
        }
    }

    pub fn opt_int(&mut self, name: &'static str) -> Result<Option<i64>, CallError> {
        if self.has(name) {
            self.int(name).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn float(&mut self, name: &'static str) -> Result<f64, CallError> {
        match self.values.remove(name) {
            Some(ArgValue::Float(value)) => Ok(value),
            other => Err(self.mismatch(name, ParamKind::Float, other)),
        }
    }

    pub fn string(&mut self, name: &'static str) -> Result<String, CallError> {
        match self.values.remove(name) {
            Some(ArgValue::Str(value)) => Ok(value),
            other => Err(self.mismatch(name, ParamKind::Str, other)),
        }
    }

    pub fn triple(&mut self, name: &'static str) -> Result<Vec3, CallError> {
        match self.values.remove(name) {
            Some(ArgValue::Triple(value)) => Ok(value),
            other => Err(self.mismatch(name, ParamKind::Triple, other)),
        }
    }

    pub fn int_list(&mut self, name: &'static str) -> Result<Vec<i64>, CallError> {
        match self.values.remove(name) {
            Some(ArgValue::IntList(value)) => Ok(value),
            other => Err(self.mismatch(name, ParamKind::IntList, other)),
        }
    }

    fn mismatch(&self, name: &'static str, expected: ParamKind, found: Option<ArgValue>) -> CallError {
        match found {
            None => CallError::InvalidArgumentCount {
                method: self.method,
                detail: format!("missing argument '{}'", name),
            },
            Some(value) => CallError::InvalidArgumentType {
                method: self.method,
                param: name,
                expected: expected.name(),
                found: value.kind().name(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kwargs(pairs: &[(&str, CallValue)]) -> BTreeMap<String, CallValue> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_every_operation_round_trips_its_name() {
        for operation in Operation::ALL {
            assert_eq!(Operation::from_name(operation.name()), Some(operation));
        }
        assert_eq!(Operation::from_name("PlayDungeon"), None);
    }

    #[test]
    fn test_positional_arity_is_exact() {
        let schema = Operation::AddObject.schema();
        let eight: Vec<CallValue> = (0..8i64).map(CallValue::from).collect();

        let err = schema.validate("AddObject", &eight, &BTreeMap::new()).unwrap_err();

        assert!(matches!(err, CallError::InvalidArgumentCount { method: "AddObject", .. }));
    }

    #[test]
    fn test_arity_checked_before_types() {
        let schema = Operation::TemplateEdit.schema();
        let args = vec![CallValue::from("not an id")];

        let err = schema.validate("TemplateEdit", &args, &BTreeMap::new()).unwrap_err();

        assert!(matches!(err, CallError::InvalidArgumentCount { .. }));
    }

    #[test]
    fn test_type_mismatch_names_parameter() {
        let schema = Operation::EditObjectName.schema();
        let args = vec![CallValue::from("seven"), CallValue::from("name")];

        let err = schema.validate("EditObjectName", &args, &BTreeMap::new()).unwrap_err();

        match err {
            CallError::InvalidArgumentType {
                param,
                expected,
                found,
                ..
            } => {
                assert_eq!(param, "objectID");
                assert_eq!(expected, "int");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_numeric_coercion_in_schema() {
        let schema = Operation::CopyObject.schema();
        let args = vec![
            CallValue::Float(12.0),
            CallValue::Int(100),
            CallValue::Int(1),
            CallValue::Float(2.5),
            CallValue::Int(-3),
        ];

        let mut validated = schema.validate("CopyObject", &args, &BTreeMap::new()).unwrap();

        assert_eq!(validated.int("objectID").unwrap(), 12);
        assert_eq!(validated.float("x").unwrap(), 1.0);
        assert_eq!(validated.float("z").unwrap(), -3.0);
    }

    #[test]
    fn test_required_named_argument_missing() {
        let schema = Operation::EditObjectRadius.schema();
        let named = kwargs(&[("objectID", 5i64.into())]);

        let err = schema.validate("EditObjectRadius", &[], &named).unwrap_err();

        match err {
            CallError::InvalidArgumentCount { detail, .. } => assert!(detail.contains("radius")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_named_and_extra_keys() {
        let schema = Operation::EditDungeon.schema();
        let named = kwargs(&[("roomID", CallValue::None), ("machoVersion", 1i64.into())]);

        let mut validated = schema.validate("EditDungeon", &[10i64.into()], &named).unwrap();

        assert_eq!(validated.int("dungeonID").unwrap(), 10);
        assert_eq!(validated.opt_int("roomID").unwrap(), None);
    }

    #[test]
    fn test_triple_parameter() {
        let schema = Operation::AddTemplateObjects.schema();
        let args = vec![100i64.into(), 7i64.into(), vec![1.0, 2.0].into()];

        let err = schema
            .validate("AddTemplateObjects", &args, &BTreeMap::new())
            .unwrap_err();

        assert!(matches!(err, CallError::InvalidArgumentType { param: "position", .. }));
    }
}
