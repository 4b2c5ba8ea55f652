//! Value objects - Immutable objects defined by their attributes

mod ids;
mod transform;

pub use ids::*;
pub use transform::{Orientation, Vec3};
