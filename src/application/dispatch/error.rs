//! Call errors and their wire codes

use crate::application::ports::outbound::WorldError;
use crate::application::services::EditError;

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("{method}: invalid argument count ({detail})")]
    InvalidArgumentCount { method: &'static str, detail: String },

    #[error("{method}: argument '{param}' must be {expected}, got {found}")]
    InvalidArgumentType {
        method: &'static str,
        param: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0} requires a bound editing session")]
    NoBoundSession(&'static str),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl CallError {
    /// Stable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            CallError::UnknownMethod(_) => "UNKNOWN_METHOD",
            CallError::InvalidArgumentCount { .. } => "INVALID_ARGUMENT_COUNT",
            CallError::InvalidArgumentType { .. } => "INVALID_ARGUMENT_TYPE",
            CallError::NoBoundSession(_) => "NO_BOUND_SESSION",
            CallError::Store(_) => "STORE_ERROR",
            CallError::Edit(err) => match err {
                EditError::NotEditing => "NOT_EDITING",
                EditError::NotFound { .. } | EditError::RoomNotInDungeon { .. } => "NOT_FOUND",
                EditError::NotEditable(_) => "NOT_EDITABLE",
                EditError::DungeonFrozen(_) => "DUNGEON_FROZEN",
                EditError::SpawnFailure(_) => "SPAWN_FAILURE",
                EditError::ObjectLocked(_) => "OBJECT_LOCKED",
                EditError::World(WorldError::NotFound(_)) => "NOT_FOUND",
                EditError::World(WorldError::AlreadyRegistered(_)) => "SPAWN_FAILURE",
                EditError::Store(_) => "STORE_ERROR",
            },
        }
    }

    /// Message safe to show the caller; store failures are not described
    pub fn client_message(&self) -> String {
        match self {
            CallError::Store(_) | CallError::Edit(EditError::Store(_)) => {
                "The dungeon store is unavailable".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether the failure is also shown to the user as a notice
    pub fn notifies_user(&self) -> bool {
        matches!(self, CallError::Edit(EditError::NotEditable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::LockConflict;
    use crate::domain::value_objects::{EntityId, ObjectId, UserId};

    #[test]
    fn test_codes() {
        let not_editable = CallError::from(EditError::NotEditable(EntityId::new(5)));
        let locked = CallError::from(EditError::from(LockConflict {
            object: ObjectId::new(1),
            holder: UserId::new(2),
        }));

        assert_eq!(not_editable.code(), "NOT_EDITABLE");
        assert!(not_editable.notifies_user());
        assert!(!locked.notifies_user());
        assert_eq!(locked.code(), "OBJECT_LOCKED");
        assert_eq!(CallError::NoBoundSession("AddObject").code(), "NO_BOUND_SESSION");
        assert_eq!(
            CallError::UnknownMethod("Nope".to_string()).code(),
            "UNKNOWN_METHOD"
        );
    }

    #[test]
    fn test_store_details_are_hidden() {
        let err = CallError::from(anyhow::anyhow!("disk I/O error at /var/db"));

        assert_eq!(err.code(), "STORE_ERROR");
        assert!(!err.client_message().contains("/var/db"));
        assert!(CallError::from(EditError::NotEditable(EntityId::new(5)))
            .client_message()
            .contains("not an editable dungeon object"));
    }
}
