//! Outbound ports - Interfaces that the application requires from external systems

mod repository_port;
mod world_port;

pub use repository_port::{DungeonFilter, DungeonRepositoryPort};
pub use world_port::{
    EntityKind, EntityUpdate, LiveEntity, SpawnError, SpawnRequest, WorldError, WorldPort,
};
