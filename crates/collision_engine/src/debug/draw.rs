//! Debug drawing sink and a recording implementation
//!
//! Collision code never talks to a GPU. It describes what it wants to see as
//! unit primitives placed by a transform (a wire sphere of radius 1, a wire
//! cube of edge 1, a unit plane facing +Z) and hands them to a
//! [`DebugRenderer`]. Drawing is fire-and-forget.

use crate::foundation::math::{Mat4, Vec3};

/// Common debug colors (RGB)
pub mod colors {
    use crate::foundation::math::Vec3;

    /// Pure red
    pub const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    /// Pure white
    pub const WHITE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    /// Cornflower blue
    pub const BLUE_CORNFLOWER: Vec3 = Vec3::new(0.392, 0.584, 0.929);
    /// Pure yellow
    pub const YELLOW: Vec3 = Vec3::new(1.0, 1.0, 0.0);
    /// Pure green
    pub const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
}

/// Sink for debug primitives
///
/// Each primitive is a unit shape mapped into the world by `transform`.
pub trait DebugRenderer {
    /// Wire sphere of radius 1 centered at the origin
    fn draw_wire_sphere(&mut self, transform: Mat4, color: Vec3);

    /// Wire cube of edge 1 centered at the origin
    fn draw_wire_cube(&mut self, transform: Mat4, color: Vec3);

    /// Unit square in the XY plane centered at the origin, facing +Z
    fn draw_plane(&mut self, transform: Mat4, color: Vec3);
}

/// Renderer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl DebugRenderer for NullRenderer {
    fn draw_wire_sphere(&mut self, _transform: Mat4, _color: Vec3) {}

    fn draw_wire_cube(&mut self, _transform: Mat4, _color: Vec3) {}

    fn draw_plane(&mut self, _transform: Mat4, _color: Vec3) {}
}

/// Kind of primitive in a recorded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugShape {
    /// Unit wire sphere
    WireSphere,
    /// Unit wire cube
    WireCube,
    /// Unit plane
    Plane,
}

/// A single recorded draw request
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Primitive to draw
    pub shape: DebugShape,
    /// Placement of the unit primitive
    pub transform: Mat4,
    /// RGB color
    pub color: Vec3,
}

/// Debug drawing system recording every request for later playback
#[derive(Debug, Clone)]
pub struct DebugDrawSystem {
    commands: Vec<DrawCommand>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            enabled: true,
        }
    }

    fn record(&mut self, shape: DebugShape, transform: Mat4, color: Vec3) {
        if !self.enabled {
            return;
        }
        self.commands.push(DrawCommand { shape, transform, color });
    }

    /// Recorded commands, oldest first
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Recorded commands of one kind
    pub fn commands_of(&self, shape: DebugShape) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.commands.iter().filter(move |command| command.shape == shape)
    }

    /// Get the number of recorded commands
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Forward every recorded command to another renderer
    pub fn replay(&self, renderer: &mut dyn DebugRenderer) {
        for command in &self.commands {
            match command.shape {
                DebugShape::WireSphere => renderer.draw_wire_sphere(command.transform, command.color),
                DebugShape::WireCube => renderer.draw_wire_cube(command.transform, command.color),
                DebugShape::Plane => renderer.draw_plane(command.transform, command.color),
            }
        }
    }

    /// Remove all recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugRenderer for DebugDrawSystem {
    fn draw_wire_sphere(&mut self, transform: Mat4, color: Vec3) {
        self.record(DebugShape::WireSphere, transform, color);
    }

    fn draw_wire_cube(&mut self, transform: Mat4, color: Vec3) {
        self.record(DebugShape::WireCube, transform, color);
    }

    fn draw_plane(&mut self, transform: Mat4, color: Vec3) {
        self.record(DebugShape::Plane, transform, color);
    }
}
