//! Per-entity bounding volume
//!
//! A bounding volume stores an axis-aligned box in model space together with
//! the model matrix that places it in the world. From those it derives:
//! - the world-space AABB re-fitted around the 8 transformed corners,
//! - a bounding sphere used as an O(1) pre-test,
//! - the oriented box consumed by the SAT engine.
//!
//! The sphere radius is measured in model space and is not scaled by the
//! model matrix. Under a uniform scale of 1 it is exact; under any other
//! scale the pre-test may both over- and under-approximate, so it is only
//! meant as a fast reject in front of SAT.

use std::collections::HashSet;

use super::sat::{separating_axis_test, SatResult};
use crate::foundation::math::{utils, Mat4, Vec3};
use crate::spatial::AABB;

slotmap::new_key_type! {
    /// Handle of a bounding volume registered with a collision system
    pub struct VolumeId;
}

/// Bounding volume of a single entity
#[derive(Debug, Clone)]
pub struct BoundingVolume {
    /// Bounding sphere radius (model space)
    radius: f32,

    /// Center of the box in model space
    center: Vec3,
    /// Minimum corner in model space
    min_local: Vec3,
    /// Maximum corner in model space
    max_local: Vec3,

    /// Minimum corner of the re-fitted world AABB
    min_global: Vec3,
    /// Maximum corner of the re-fitted world AABB
    max_global: Vec3,

    /// Half of the model-space box size on each axis
    half_width: Vec3,
    /// Edge lengths of the world AABB
    aabb_size: Vec3,

    /// Model to world transform
    to_world: Mat4,

    /// Volumes this one was last classified as overlapping
    colliding: HashSet<VolumeId>,
}

impl Default for BoundingVolume {
    fn default() -> Self {
        Self {
            radius: 0.0,
            center: Vec3::zeros(),
            min_local: Vec3::zeros(),
            max_local: Vec3::zeros(),
            min_global: Vec3::zeros(),
            max_global: Vec3::zeros(),
            half_width: Vec3::zeros(),
            aabb_size: Vec3::zeros(),
            to_world: Mat4::identity(),
            colliding: HashSet::new(),
        }
    }
}

impl BoundingVolume {
    /// Fit a volume around a point cloud given in model space
    ///
    /// An empty slice produces a zero-sized volume at the origin.
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::default();
        };

        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)));

        Self::from_min_max(min, max)
    }

    /// Volume for a box given by its model-space center and half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        let extents = extents.abs();
        Self::from_min_max(center - extents, center + extents)
    }

    fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let center = (min + max) / 2.0;
        Self {
            radius: (center - min).norm(),
            center,
            min_local: min,
            max_local: max,
            // Identity transform: global equals local
            min_global: min,
            max_global: max,
            half_width: (max - min) / 2.0,
            aabb_size: max - min,
            to_world: Mat4::identity(),
            colliding: HashSet::new(),
        }
    }

    /// Bounding sphere radius
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Center in model space
    pub fn center_local(&self) -> Vec3 {
        self.center
    }

    /// Minimum corner in model space
    pub fn min_local(&self) -> Vec3 {
        self.min_local
    }

    /// Maximum corner in model space
    pub fn max_local(&self) -> Vec3 {
        self.max_local
    }

    /// Center transformed into world space
    ///
    /// This is the model matrix applied to the local center, which is not
    /// necessarily the center of the re-fitted world AABB.
    pub fn center_global(&self) -> Vec3 {
        utils::transform_point(&self.to_world, self.center)
    }

    /// Minimum corner of the world AABB
    pub fn min_global(&self) -> Vec3 {
        self.min_global
    }

    /// Maximum corner of the world AABB
    pub fn max_global(&self) -> Vec3 {
        self.max_global
    }

    /// World AABB as a value
    pub fn global_aabb(&self) -> AABB {
        AABB::new(self.min_global, self.max_global)
    }

    /// Half of the model-space box size
    pub fn half_width(&self) -> Vec3 {
        self.half_width
    }

    /// Edge lengths of the world AABB
    pub fn aabb_size(&self) -> Vec3 {
        self.aabb_size
    }

    /// Model to world transform
    pub fn model_matrix(&self) -> &Mat4 {
        &self.to_world
    }

    /// Replace the model matrix and re-fit the world AABB
    pub fn set_model_matrix(&mut self, model: Mat4) {
        if model == self.to_world {
            return;
        }
        self.to_world = model;

        let corners = self.local_corners().map(|c| utils::transform_point(&self.to_world, c));
        let (min, max) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(min, max), c| (min.inf(c), max.sup(c)));

        self.min_global = min;
        self.max_global = max;
        self.aabb_size = max - min;
    }

    /// The 8 corners of the model-space box
    ///
    /// Bit 0 of the index selects max X, bit 1 max Y, bit 2 max Z.
    pub fn local_corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min_local, self.max_local);
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
    }

    /// Bounding sphere pre-test
    ///
    /// Necessary but not sufficient: false positives are resolved by SAT.
    pub fn intersects_broad(&self, other: &Self) -> bool {
        let distance = (self.center_global() - other.center_global()).norm();
        distance < self.radius + other.radius
    }

    /// Run the SAT engine against another volume
    pub fn sat(&self, other: &Self) -> SatResult {
        separating_axis_test(self, other)
    }

    /// Full verdict: sphere pre-test, then SAT
    ///
    /// Does not touch the overlap sets; see
    /// [`CollisionSystem::test_collision`](super::CollisionSystem::test_collision).
    pub fn collides_with(&self, other: &Self) -> bool {
        self.intersects_broad(other) && !self.sat(other).is_separated()
    }

    /// Record an overlap with another volume (idempotent)
    pub fn add_collision_with(&mut self, other: VolumeId) {
        self.colliding.insert(other);
    }

    /// Forget an overlap with another volume (idempotent)
    pub fn remove_collision_with(&mut self, other: VolumeId) {
        self.colliding.remove(&other);
    }

    /// Forget every overlap
    pub fn clear_colliding(&mut self) {
        self.colliding.clear();
    }

    /// Whether an overlap with `other` is recorded
    pub fn is_colliding_with(&self, other: VolumeId) -> bool {
        self.colliding.contains(&other)
    }

    /// Whether any overlap is recorded
    pub fn has_collisions(&self) -> bool {
        !self.colliding.is_empty()
    }

    /// Recorded overlaps, in no particular order
    pub fn colliding(&self) -> impl Iterator<Item = VolumeId> + '_ {
        self.colliding.iter().copied()
    }

    /// Number of recorded overlaps
    pub fn colliding_count(&self) -> usize {
        self.colliding.len()
    }
}
