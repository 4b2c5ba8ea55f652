//! Reference data that classifies dungeons

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ArchetypeId, FactionId};

/// Thematic category grouping dungeons (combat site, relic site, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub id: ArchetypeId,
    pub name: String,
}

/// Owner entity a dungeon is authored for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
}
