//! Entity access used by the octree
//!
//! The octree never owns entities. It addresses them by a dense index in
//! `0..entity_count()` and reads their bounding volumes through this trait,
//! so any container that can hand out volumes by index can be partitioned.

use super::AABB;
use crate::physics::BoundingVolume;

/// Indexed access to the bounding volumes of a set of entities
pub trait EntitySource {
    /// Number of entities; valid indices are `0..entity_count()`
    fn entity_count(&self) -> usize;

    /// Bounding volume of the entity at `index`, `None` when out of range
    fn bounding_volume(&self, index: usize) -> Option<&BoundingVolume>;

    /// World AABB of the entity at `index`, `None` when out of range
    fn global_aabb(&self, index: usize) -> Option<AABB> {
        self.bounding_volume(index).map(BoundingVolume::global_aabb)
    }
}

impl EntitySource for [BoundingVolume] {
    fn entity_count(&self) -> usize {
        self.len()
    }

    fn bounding_volume(&self, index: usize) -> Option<&BoundingVolume> {
        self.get(index)
    }
}

impl EntitySource for Vec<BoundingVolume> {
    fn entity_count(&self) -> usize {
        self.len()
    }

    fn bounding_volume(&self, index: usize) -> Option<&BoundingVolume> {
        self.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_out_of_range_index_is_none() {
        let volumes = vec![BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))];

        assert_eq!(volumes.entity_count(), 1);
        assert!(volumes.bounding_volume(0).is_some());
        assert!(volumes.bounding_volume(1).is_none());
        assert!(volumes.as_slice().global_aabb(7).is_none());
    }
}
