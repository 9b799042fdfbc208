//! # Collision Engine
//!
//! Oriented bounding box collision detection with a loose octree broad phase.
//!
//! ## Features
//!
//! - **Bounding Volumes**: local box, re-fitted world AABB and bounding sphere
//! - **SAT**: exact 15-axis separating axis test between oriented boxes
//! - **Octree**: loose spatial partition assigning entities to every leaf they touch
//! - **Collision System**: overlap bookkeeping with entered/exited pairs
//! - **Debug Drawing**: renderer-agnostic wire primitives for volumes and octants
//!
//! ## Quick Start
//!
//! ```rust
//! use collision_engine::prelude::*;
//!
//! let mut system = CollisionSystem::new(CollisionConfig::default());
//!
//! let unit = BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
//! let a = system.insert(unit.clone());
//! let b = system.insert(unit);
//! system.set_transform(b, Mat4::new_translation(&Vec3::new(1.5, 0.0, 0.0)))?;
//!
//! let pairs = system.detect_collisions();
//! assert!(pairs.contains(&CollisionPair::new(a, b)));
//! assert!(system.is_colliding(a));
//! # Ok::<(), PhysicsError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod debug;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{CollisionConfig, Config, ConfigError, OctreeConfig},
        debug::{CollisionDebugVisualizer, DebugDrawSystem, DebugRenderer, NullRenderer, OctreeDisplay, VolumeVisibility},
        foundation::math::{Mat4, Mat4Ext, Vec3},
        physics::{separating_axis_test, BoundingVolume, CollisionPair, CollisionSystem, PhysicsError, SatResult, VolumeId},
        spatial::{EntitySource, OctantId, Octree, AABB},
    };
}
