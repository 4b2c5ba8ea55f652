//! Application services - Use case implementations
//!
//! The stateless dungeon lookups, the shared object lock service and the
//! per-actor editing session. Services accept port dependencies and return
//! domain entities or DTOs.

mod dungeon_service;
mod editing_session;
mod object_lock_service;

pub use dungeon_service::{DungeonService, DungeonServiceImpl};
pub use editing_session::{
    ActorContext, EditError, EditingSession, EditorSettings, PlaceObject, PositionBasis,
};
pub use object_lock_service::ObjectLockService;
