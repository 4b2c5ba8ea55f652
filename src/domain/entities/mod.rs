//! Domain entities - Core business objects with identity

mod archetype;
mod dungeon;
mod palette;
mod room_object;
mod template;

pub use archetype::{Archetype, Faction};
pub use dungeon::{Dungeon, DungeonStatus, Room, RoomGroup};
pub use palette::PaletteEntry;
pub use room_object::{NewRoomObject, RoomObject, INITIAL_REVISION};
pub use template::{Template, TemplateObject};
