//! Template entity - Reusable snapshot of room objects

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ItemTypeId, Orientation, RoomId, TemplateId, UserId, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    /// Authoring user
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    /// Room the template was captured from
    pub room_id: RoomId,
}

/// One object captured into a template
///
/// `position` is template-relative; instantiation adds the placement offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateObject {
    pub template_id: TemplateId,
    pub type_id: ItemTypeId,
    pub position: Vec3,
    pub orientation: Orientation,
    pub radius: f64,
}
