//! Object palette entries shown in the placement picker

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ItemTypeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub type_id: ItemTypeId,
    pub name: String,
}
