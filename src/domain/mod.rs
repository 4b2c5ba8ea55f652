//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Archetype, Faction, Dungeon, Room, Template, RoomObject
//! - Value Objects: typed ids, positions and orientations
//! - Domain Services: the object lock table

pub mod entities;
pub mod services;
pub mod value_objects;
