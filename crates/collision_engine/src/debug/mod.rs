//! Debug module for visualization and debugging tools
//!
//! A renderer-agnostic drawing sink plus the collision visualizer that
//! feeds it bounding volumes, octants and separating planes.

pub mod collision_debug;
pub mod draw;

pub use collision_debug::{CollisionDebugColors, CollisionDebugVisualizer, OctreeDisplay, VolumeVisibility};
pub use draw::{colors, DebugDrawSystem, DebugRenderer, DebugShape, DrawCommand, NullRenderer};
