//! Physics module for collision detection
//!
//! Bounding volumes with a sphere pre-test, the oriented box SAT test, and
//! the collision system that keeps overlap state between volumes.

pub mod bounding_volume;
pub mod collision_system;
pub mod sat;

pub use bounding_volume::{BoundingVolume, VolumeId};
pub use collision_system::{CollisionPair, CollisionSystem, PhysicsError};
pub use sat::{separating_axis_test, SatResult};
