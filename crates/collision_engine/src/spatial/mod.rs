//! Spatial partitioning data structures
//!
//! Provides the loose octree used as collision broad phase, together with
//! the axis-aligned boxes it works on.

mod aabb;
mod entity_source;
mod octree;

pub use aabb::AABB;
pub use entity_source::EntitySource;
pub use octree::{Octant, OctantId, OctantState, Octree};
