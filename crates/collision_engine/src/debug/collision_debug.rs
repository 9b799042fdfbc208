//! Collision-specific debug visualization
//!
//! Turns bounding volumes, octrees and SAT verdicts into primitives for a
//! [`DebugRenderer`]. Nothing here keeps state between frames; callers draw
//! into a sink every frame and clear it themselves.

use nalgebra::Rotation3;

use super::draw::{colors, DebugRenderer};
use crate::foundation::math::{constants::PI, Mat4, Mat4Ext, Vec3, EPSILON};
use crate::physics::{BoundingVolume, CollisionSystem, SatResult};
use crate::spatial::{Octant, OctantId, Octree};

bitflags::bitflags! {
    /// Which parts of a bounding volume are drawn
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VolumeVisibility: u8 {
        /// Bounding sphere
        const SPHERE = 1 << 0;
        /// Oriented box in model space
        const OBB = 1 << 1;
        /// Re-fitted world AABB
        const AABB = 1 << 2;
    }
}

impl Default for VolumeVisibility {
    fn default() -> Self {
        Self::all()
    }
}

/// Which octants of a tree are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OctreeDisplay {
    /// Every octant, subdivided or not
    #[default]
    All,
    /// A single octant by id
    Octant(OctantId),
    /// Leaves holding at least one entity
    Leaves,
}

/// Color scheme for collision visualization
#[derive(Clone, Debug)]
pub struct CollisionDebugColors {
    /// Oriented box while colliding
    pub colliding: Vec3,
    /// Oriented box while not colliding
    pub not_colliding: Vec3,
    /// Bounding sphere
    pub sphere: Vec3,
    /// World AABB
    pub aabb: Vec3,
    /// Octant cubes
    pub octree: Vec3,
    /// Separating plane
    pub plane: Vec3,
}

impl Default for CollisionDebugColors {
    fn default() -> Self {
        Self {
            colliding: colors::RED,
            not_colliding: colors::WHITE,
            sphere: colors::BLUE_CORNFLOWER,
            aabb: colors::YELLOW,
            octree: colors::GREEN,
            plane: colors::WHITE,
        }
    }
}

/// Collision-specific debug visualizer
#[derive(Debug, Clone, Default)]
pub struct CollisionDebugVisualizer {
    colors: CollisionDebugColors,

    /// Parts of each volume to draw
    pub visibility: VolumeVisibility,

    /// Draw the broad-phase octree
    pub show_octree: bool,

    /// Octants to draw when the octree is shown
    pub octree_display: OctreeDisplay,
}

impl CollisionDebugVisualizer {
    /// Create a visualizer showing every volume part and no octree
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom color scheme
    pub fn with_colors(mut self, colors: CollisionDebugColors) -> Self {
        self.colors = colors;
        self
    }

    /// Current color scheme
    pub fn colors(&self) -> &CollisionDebugColors {
        &self.colors
    }

    /// Draw the visible parts of one volume
    ///
    /// The box color follows the volume's overlap set. Sphere and box are
    /// placed by the model matrix; the AABB is axis aligned and centered on
    /// the transformed local center.
    pub fn draw_volume(&self, volume: &BoundingVolume, renderer: &mut dyn DebugRenderer) {
        let to_center = volume.model_matrix() * Mat4::new_translation(&volume.center_local());

        if self.visibility.contains(VolumeVisibility::SPHERE) {
            renderer.draw_wire_sphere(to_center * Mat4::new_scaling(volume.radius()), self.colors.sphere);
        }

        if self.visibility.contains(VolumeVisibility::OBB) {
            let color = if volume.has_collisions() {
                self.colors.colliding
            } else {
                self.colors.not_colliding
            };
            renderer.draw_wire_cube(to_center * Mat4::new_nonuniform_scaling(&(volume.half_width() * 2.0)), color);
        }

        if self.visibility.contains(VolumeVisibility::AABB) {
            let transform = Mat4::translate_scale(volume.center_global(), volume.aabb_size());
            renderer.draw_wire_cube(transform, self.colors.aabb);
        }
    }

    /// Draw every volume of a system, plus its octree when enabled
    pub fn draw_system(&self, system: &CollisionSystem, renderer: &mut dyn DebugRenderer) {
        for (_, volume) in system.iter() {
            self.draw_volume(volume, renderer);
        }
        if self.show_octree {
            if let Some(octree) = system.octree() {
                self.draw_octree(octree, renderer);
            }
        }
    }

    /// Draw the octants selected by `octree_display`
    ///
    /// Returns the number of cubes drawn; an unknown octant id draws nothing.
    pub fn draw_octree(&self, octree: &Octree, renderer: &mut dyn DebugRenderer) -> usize {
        match self.octree_display {
            OctreeDisplay::All => {
                for octant in octree.octants() {
                    self.draw_octant(octant, renderer);
                }
                octree.octant_count()
            }
            OctreeDisplay::Octant(id) => match octree.octant(id) {
                Some(octant) => {
                    self.draw_octant(octant, renderer);
                    1
                }
                None => {
                    log::warn!("No octant {} to draw", id.index());
                    0
                }
            },
            OctreeDisplay::Leaves => {
                let mut drawn = 0;
                for leaf in octree.leaves() {
                    self.draw_octant(leaf, renderer);
                    drawn += 1;
                }
                drawn
            }
        }
    }

    fn draw_octant(&self, octant: &Octant, renderer: &mut dyn DebugRenderer) {
        let transform = Mat4::new_translation(&octant.center()) * Mat4::new_scaling(octant.size());
        renderer.draw_wire_cube(transform, self.colors.octree);
    }

    /// Draw the plane perpendicular to a separating axis
    ///
    /// The plane sits halfway between the two volume centers with its +Z
    /// normal along the axis. Nothing is drawn for overlapping volumes or a
    /// degenerate axis (parallel edges); returns whether a plane was drawn.
    pub fn draw_separating_plane(
        &self,
        a: &BoundingVolume,
        b: &BoundingVolume,
        result: SatResult,
        renderer: &mut dyn DebugRenderer,
    ) -> bool {
        let Some(axis) = result.axis(a, b).and_then(|axis| axis.try_normalize(EPSILON)) else {
            return false;
        };

        let rotation = Rotation3::rotation_between(&Vec3::z(), &axis)
            .unwrap_or_else(|| Rotation3::from_axis_angle(&Vec3::x_axis(), PI));
        let midpoint = (a.center_global() + b.center_global()) * 0.5;
        let size = 2.0 * a.radius().max(b.radius());

        let transform = Mat4::new_translation(&midpoint) * rotation.to_homogeneous() * Mat4::new_scaling(size);
        renderer.draw_plane(transform, self.colors.plane);
        true
    }
}
