//! Core collision detection system
//!
//! Collision detection runs in two phases. The broad phase asks the octree
//! which volumes share a leaf; the narrow phase runs the sphere pre-test
//! and then SAT on each of those candidate pairs. The verdicts are written
//! back into every volume's overlap set, so after a run the overlap sets
//! hold exactly the pairs found to collide.
//!
//! Volumes live in a slot map and are addressed by [`VolumeId`]. Insertion
//! order is also tracked so the octree can address volumes by a dense index.

use std::collections::HashSet;

use slotmap::SlotMap;

use super::bounding_volume::{BoundingVolume, VolumeId};
use crate::config::CollisionConfig;
use crate::foundation::math::Mat4;
use crate::spatial::{EntitySource, Octree};

/// Errors raised by the collision system
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsError {
    /// The handle does not name a live volume
    #[error("Unknown bounding volume: {0:?}")]
    UnknownVolume(VolumeId),
}

/// Collision pair representing two volumes that are colliding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Smaller of the two handles
    pub volume_a: VolumeId,
    /// Larger of the two handles
    pub volume_b: VolumeId,
}

impl CollisionPair {
    /// Create a new collision pair (always stores the smaller handle first)
    pub fn new(volume_a: VolumeId, volume_b: VolumeId) -> Self {
        if volume_a < volume_b {
            Self { volume_a, volume_b }
        } else {
            Self {
                volume_a: volume_b,
                volume_b: volume_a,
            }
        }
    }

    /// Whether the pair involves the given volume
    pub fn contains(&self, volume: VolumeId) -> bool {
        self.volume_a == volume || self.volume_b == volume
    }
}

/// Owns bounding volumes and keeps their overlap sets current
pub struct CollisionSystem {
    /// Volume storage
    volumes: SlotMap<VolumeId, BoundingVolume>,

    /// Live handles in insertion order; position is the octree entity index
    order: Vec<VolumeId>,

    /// Broad-phase tree from the last rebuild
    octree: Option<Octree>,

    config: CollisionConfig,

    /// Collision pairs from the current run
    current_pairs: HashSet<CollisionPair>,

    /// Collision pairs from the previous run
    previous_pairs: HashSet<CollisionPair>,

    /// Colliding pairs dropped by `remove`, reported as exited by the next run
    removed_pairs: HashSet<CollisionPair>,
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

impl CollisionSystem {
    /// Create an empty collision system
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            volumes: SlotMap::with_key(),
            order: Vec::new(),
            octree: None,
            config,
            current_pairs: HashSet::new(),
            previous_pairs: HashSet::new(),
            removed_pairs: HashSet::new(),
        }
    }

    /// Register a volume
    ///
    /// A cloned volume may still carry the overlap set of its source; it is
    /// cleared so the new volume starts out colliding with nothing.
    pub fn insert(&mut self, mut volume: BoundingVolume) -> VolumeId {
        volume.clear_colliding();
        let id = self.volumes.insert(volume);
        self.order.push(id);
        self.octree = None;
        id
    }

    /// Unregister a volume, removing it from every peer's overlap set
    ///
    /// Pairs involving the volume leave the current set, so the next run of
    /// [`detect_collisions`](Self::detect_collisions) reports them as exited.
    pub fn remove(&mut self, id: VolumeId) -> Option<BoundingVolume> {
        let volume = self.volumes.remove(id)?;
        self.order.retain(|&other| other != id);
        for peer in volume.colliding() {
            if let Some(peer) = self.volumes.get_mut(peer) {
                peer.remove_collision_with(id);
            }
        }
        let removed: Vec<CollisionPair> = self.current_pairs.iter().filter(|pair| pair.contains(id)).copied().collect();
        for pair in removed {
            self.current_pairs.remove(&pair);
            self.removed_pairs.insert(pair);
        }
        self.octree = None;
        Some(volume)
    }

    /// Volume by handle
    pub fn get(&self, id: VolumeId) -> Option<&BoundingVolume> {
        self.volumes.get(id)
    }

    /// Whether the handle names a live volume
    pub fn contains(&self, id: VolumeId) -> bool {
        self.volumes.contains_key(id)
    }

    /// Replace a volume's model matrix and re-fit its world AABB
    ///
    /// Invalidates the octree; the next run rebuilds it.
    pub fn set_transform(&mut self, id: VolumeId, model: Mat4) -> Result<(), PhysicsError> {
        let volume = self.volumes.get_mut(id).ok_or_else(|| {
            log::warn!("set_transform on unknown volume {id:?}");
            PhysicsError::UnknownVolume(id)
        })?;
        volume.set_model_matrix(model);
        self.octree = None;
        Ok(())
    }

    /// Test two volumes and record the verdict in both overlap sets
    ///
    /// Runs the sphere pre-test, then SAT. On a hit each volume is added to
    /// the other's overlap set, otherwise each is removed from the other's.
    /// Unknown handles and `a == b` return `false` without touching anything.
    pub fn test_collision(&mut self, a: VolumeId, b: VolumeId) -> bool {
        if a == b {
            return false;
        }
        let Some([volume_a, volume_b]) = self.volumes.get_disjoint_mut([a, b]) else {
            return false;
        };

        let colliding = volume_a.collides_with(volume_b);
        if colliding {
            volume_a.add_collision_with(b);
            volume_b.add_collision_with(a);
        } else {
            volume_a.remove_collision_with(b);
            volume_b.remove_collision_with(a);
        }

        log::trace!("Pair {a:?}/{b:?}: colliding = {colliding}");
        colliding
    }

    /// Build a fresh octree over the current volumes
    pub fn rebuild_octree(&mut self) -> &Octree {
        let tree = Octree::build(&*self, self.config.octree);
        self.octree.insert(tree)
    }

    /// Run broad and narrow phase over every volume
    ///
    /// All overlap sets are reset first, so pairs the broad phase does not
    /// return end up not colliding. Returns the colliding pairs of this run.
    pub fn detect_collisions(&mut self) -> &HashSet<CollisionPair> {
        std::mem::swap(&mut self.current_pairs, &mut self.previous_pairs);
        self.current_pairs.clear();
        self.previous_pairs.extend(self.removed_pairs.drain());

        let candidates = self.broad_phase();

        for volume in self.volumes.values_mut() {
            volume.clear_colliding();
        }
        for pair in &candidates {
            if self.test_collision(pair.volume_a, pair.volume_b) {
                self.current_pairs.insert(*pair);
            }
        }

        log::debug!(
            "Collision detection: {} volumes, {} candidates, {} colliding",
            self.volumes.len(),
            candidates.len(),
            self.current_pairs.len()
        );

        &self.current_pairs
    }

    /// Candidate pairs: volumes sharing an octree leaf, or all pairs when
    /// the octree is disabled
    fn broad_phase(&mut self) -> Vec<CollisionPair> {
        if !self.config.use_octree {
            let mut pairs = Vec::new();
            for (n, &a) in self.order.iter().enumerate() {
                for &b in &self.order[n + 1..] {
                    pairs.push(CollisionPair::new(a, b));
                }
            }
            return pairs;
        }

        self.rebuild_octree();
        let Some(octree) = &self.octree else {
            return Vec::new();
        };
        octree
            .candidate_pairs()
            .into_iter()
            .filter_map(|(i, j)| Some(CollisionPair::new(*self.order.get(i)?, *self.order.get(j)?)))
            .collect()
    }

    /// Pairs that started colliding in the last run
    pub fn get_collision_entered(&self) -> Vec<CollisionPair> {
        self.current_pairs.difference(&self.previous_pairs).copied().collect()
    }

    /// Pairs that stopped colliding in the last run
    pub fn get_collision_exited(&self) -> Vec<CollisionPair> {
        self.previous_pairs.difference(&self.current_pairs).copied().collect()
    }

    /// Colliding pairs from the last run
    pub fn get_current_collisions(&self) -> &HashSet<CollisionPair> {
        &self.current_pairs
    }

    /// Whether the volume currently overlaps anything
    pub fn is_colliding(&self, id: VolumeId) -> bool {
        self.volumes.get(id).is_some_and(BoundingVolume::has_collisions)
    }

    /// Dense index of a volume, as used by the octree
    pub fn entity_index(&self, id: VolumeId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Handle of the volume at a dense index
    pub fn volume_id(&self, index: usize) -> Option<VolumeId> {
        self.order.get(index).copied()
    }

    /// Volumes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (VolumeId, &BoundingVolume)> + '_ {
        self.order.iter().filter_map(|&id| Some((id, self.volumes.get(id)?)))
    }

    /// Octree from the last rebuild, if still valid
    pub fn octree(&self) -> Option<&Octree> {
        self.octree.as_ref()
    }

    /// Current configuration
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Enable or disable the octree broad phase
    ///
    /// Drops the current tree either way.
    pub fn set_use_octree(&mut self, use_octree: bool) {
        self.config.use_octree = use_octree;
        self.octree = None;
    }

    /// Number of registered volumes
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// Whether no volume is registered
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Clear all collision data
    pub fn clear(&mut self) {
        self.volumes.clear();
        self.order.clear();
        self.octree = None;
        self.current_pairs.clear();
        self.previous_pairs.clear();
        self.removed_pairs.clear();
    }
}

impl EntitySource for CollisionSystem {
    fn entity_count(&self) -> usize {
        self.order.len()
    }

    fn bounding_volume(&self, index: usize) -> Option<&BoundingVolume> {
        self.volumes.get(*self.order.get(index)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::PI, Vec3};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn unit_box() -> BoundingVolume {
        BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))
    }

    fn translated(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    fn random_scene(system: &mut CollisionSystem, rng: &mut StdRng, count: usize) -> Vec<VolumeId> {
        (0..count)
            .map(|_| {
                let extents = Vec3::new(rng.gen_range(0.2..1.5), rng.gen_range(0.2..1.5), rng.gen_range(0.2..1.5));
                let id = system.insert(BoundingVolume::from_center_extents(Vec3::zeros(), extents));
                let position = Vec3::new(rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0));
                let rotation = Mat4::from_euler_angles(rng.gen_range(0.0..PI), rng.gen_range(0.0..PI), rng.gen_range(0.0..PI));
                system
                    .set_transform(id, Mat4::new_translation(&position) * rotation)
                    .unwrap();
                id
            })
            .collect()
    }

    #[test]
    fn test_collision_pair_is_normalized() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());

        assert_eq!(CollisionPair::new(a, b), CollisionPair::new(b, a));
        assert!(CollisionPair::new(b, a).contains(a));
    }

    #[test]
    fn test_overlap_recorded_on_both_sides() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());
        system.set_transform(b, translated(1.5, 0.0, 0.0)).unwrap();

        assert!(system.test_collision(a, b));
        assert!(system.get(a).unwrap().is_colliding_with(b));
        assert!(system.get(b).unwrap().is_colliding_with(a));

        system.set_transform(b, translated(5.0, 0.0, 0.0)).unwrap();
        assert!(!system.test_collision(a, b));
        assert!(!system.is_colliding(a));
        assert!(!system.is_colliding(b));
    }

    #[test]
    fn test_self_and_unknown_pairs_are_rejected() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());
        system.remove(b);

        assert!(!system.test_collision(a, a));
        assert!(!system.test_collision(a, b));
        assert!(!system.is_colliding(a));
        assert_eq!(
            system.set_transform(b, Mat4::identity()),
            Err(PhysicsError::UnknownVolume(b))
        );
    }

    #[test]
    fn test_verdict_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut system = CollisionSystem::default();
        let ids = random_scene(&mut system, &mut rng, 40);

        for &a in &ids {
            for &b in &ids {
                if a == b {
                    continue;
                }
                let forward = system.test_collision(a, b);
                let backward = system.test_collision(b, a);
                assert_eq!(forward, backward);
                assert_eq!(system.get(a).unwrap().is_colliding_with(b), forward);
                assert_eq!(system.get(b).unwrap().is_colliding_with(a), forward);
            }
        }
    }

    #[test]
    fn test_remove_cleans_peers() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());
        let c = system.insert(unit_box());
        system.set_transform(c, translated(0.5, 0.5, 0.0)).unwrap();

        system.detect_collisions();
        assert!(system.get(a).unwrap().is_colliding_with(b));
        assert!(system.get(c).unwrap().is_colliding_with(b));

        let removed = system.remove(b).unwrap();
        assert!(removed.is_colliding_with(a));
        assert!(!system.get(a).unwrap().is_colliding_with(b));
        assert!(!system.get(c).unwrap().is_colliding_with(b));
        assert!(system.get(a).unwrap().is_colliding_with(c));
        assert_eq!(system.entity_index(c), Some(1));
        assert!(system.remove(b).is_none());
    }

    #[test]
    fn test_removed_pair_is_reported_as_exited() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());
        let c = system.insert(unit_box());
        system.set_transform(c, translated(20.0, 0.0, 0.0)).unwrap();

        system.detect_collisions();
        assert_eq!(system.get_collision_entered(), vec![CollisionPair::new(a, b)]);

        system.remove(b);
        assert!(system.get_current_collisions().is_empty());

        system.detect_collisions();
        assert!(system.get_collision_entered().is_empty());
        assert_eq!(system.get_collision_exited(), vec![CollisionPair::new(a, b)]);

        // Reported once only
        system.detect_collisions();
        assert!(system.get_collision_exited().is_empty());
    }

    #[test]
    fn test_octree_invalidated_by_changes() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        system.insert(unit_box());

        system.detect_collisions();
        assert!(system.octree().is_some());

        system.set_transform(a, translated(3.0, 0.0, 0.0)).unwrap();
        assert!(system.octree().is_none());

        system.detect_collisions();
        assert!(system.octree().is_some());

        system.set_use_octree(false);
        assert!(system.octree().is_none());
        system.detect_collisions();
        assert!(system.octree().is_none());
        assert!(!system.config().use_octree);
    }

    #[test]
    fn test_inserted_clone_starts_without_overlaps() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());
        assert!(system.test_collision(a, b));

        let copy = system.get(a).unwrap().clone();
        assert!(copy.has_collisions());
        let c = system.insert(copy);
        assert!(!system.is_colliding(c));
    }

    #[test]
    fn test_octree_and_brute_force_agree() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut with_tree = CollisionSystem::default();
        let ids = random_scene(&mut with_tree, &mut rng, 60);

        let mut brute = CollisionSystem::new(CollisionConfig {
            use_octree: false,
            ..CollisionConfig::default()
        });
        for &id in &ids {
            let volume = with_tree.get(id).unwrap().clone();
            brute.insert(volume);
        }

        let expected: HashSet<(usize, usize)> = brute
            .detect_collisions()
            .clone()
            .into_iter()
            .map(|p| (brute.entity_index(p.volume_a).unwrap(), brute.entity_index(p.volume_b).unwrap()))
            .map(|(i, j)| (i.min(j), i.max(j)))
            .collect();
        let actual: HashSet<(usize, usize)> = with_tree
            .detect_collisions()
            .clone()
            .into_iter()
            .map(|p| (with_tree.entity_index(p.volume_a).unwrap(), with_tree.entity_index(p.volume_b).unwrap()))
            .map(|(i, j)| (i.min(j), i.max(j)))
            .collect();

        assert!(!expected.is_empty());
        assert_eq!(actual, expected);
        assert!(with_tree.octree().is_some());
        assert!(brute.octree().is_none());
    }

    #[test]
    fn test_entered_and_exited_pairs() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());
        system.set_transform(b, translated(1.0, 1.0, 0.0)).unwrap();

        system.detect_collisions();
        assert_eq!(system.get_collision_entered(), vec![CollisionPair::new(a, b)]);
        assert!(system.get_collision_exited().is_empty());

        system.detect_collisions();
        assert!(system.get_collision_entered().is_empty());
        assert_eq!(system.get_current_collisions().len(), 1);

        system.set_transform(b, translated(10.0, 0.0, 0.0)).unwrap();
        system.detect_collisions();
        assert!(system.get_collision_entered().is_empty());
        assert_eq!(system.get_collision_exited(), vec![CollisionPair::new(a, b)]);
        assert!(!system.is_colliding(a));
    }

    #[test]
    fn test_detect_drops_stale_overlaps() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(unit_box());
        assert!(system.test_collision(a, b));

        system.set_transform(b, translated(20.0, 0.0, 0.0)).unwrap();
        assert!(system.is_colliding(a));

        system.detect_collisions();
        assert!(!system.is_colliding(a));
        assert!(!system.is_colliding(b));
    }

    #[test]
    fn test_entity_source_follows_insertion_order() {
        let mut system = CollisionSystem::default();
        let a = system.insert(unit_box());
        let b = system.insert(BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0)));

        assert_eq!(system.entity_count(), 2);
        assert_eq!(system.volume_id(0), Some(a));
        assert_eq!(system.volume_id(1), Some(b));
        assert_eq!(system.bounding_volume(1).unwrap().half_width(), Vec3::new(2.0, 2.0, 2.0));
        assert!(system.bounding_volume(2).is_none());

        let ids: Vec<VolumeId> = system.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
