//! Loose octree spatial partitioning structure
//!
//! Divides a cubical region of space into 8 octants whenever more entities
//! overlap a node than the configured ideal count, down to a maximum depth.
//! Entities are then assigned to every leaf their world AABB overlaps, so an
//! entity straddling a split plane lives in several leaves. Two entities only
//! need a narrow-phase test when they share at least one leaf.
//!
//! The tree is rebuilt from scratch whenever the scene changes; there is no
//! incremental insert or removal. Octants live in an arena owned by the tree
//! and refer to each other by [`OctantId`], the root always being
//! [`OctantId::ROOT`].

use std::collections::BTreeSet;

use super::{EntitySource, AABB};
use crate::config::OctreeConfig;
use crate::foundation::math::Vec3;

/// Identifier of an octant inside its tree
///
/// Ids are handed out in creation order during a build, so they double as
/// a debug counter: the root is 0 and the tree holds `octant_count()` ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OctantId(usize);

impl OctantId {
    /// The root octant of every tree
    pub const ROOT: Self = Self(0);

    /// Position in the tree's arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// Build state of an octant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OctantState {
    /// Created but no construction pass has run yet
    Unbuilt,
    /// No children; may hold entities
    Leaf,
    /// Exactly 8 children; holds no entities
    Subdivided,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct Octant {
    id: OctantId,
    center: Vec3,
    half_size: f32,
    level: u32,
    parent: Option<OctantId>,
    children: Option<[OctantId; 8]>,
    entities: Vec<usize>,
    state: OctantState,
}

impl Octant {
    fn new(id: OctantId, center: Vec3, half_size: f32, level: u32, parent: Option<OctantId>) -> Self {
        Self {
            id,
            center,
            half_size,
            level,
            parent,
            children: None,
            entities: Vec::new(),
            state: if parent.is_some() { OctantState::Leaf } else { OctantState::Unbuilt },
        }
    }

    /// Identifier within the owning tree
    pub fn id(&self) -> OctantId {
        self.id
    }

    /// World-space center of the cube
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half of the cube's edge length
    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    /// Full edge length of the cube
    pub fn size(&self) -> f32 {
        self.half_size * 2.0
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.center - Vec3::repeat(self.half_size)
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.center + Vec3::repeat(self.half_size)
    }

    /// Cube as an AABB
    pub fn bounds(&self) -> AABB {
        AABB::from_center_extents(self.center, Vec3::repeat(self.half_size))
    }

    /// Depth in the tree (0 = root)
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Parent octant, `None` for the root
    pub fn parent(&self) -> Option<OctantId> {
        self.parent
    }

    /// The 8 children, or an empty slice for a leaf
    pub fn children(&self) -> &[OctantId] {
        match &self.children {
            Some(children) => children,
            None => &[],
        }
    }

    /// Child in the given octant slot (0-7)
    pub fn child(&self, octant: usize) -> Option<OctantId> {
        self.children.and_then(|c| c.get(octant).copied())
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Current build state
    pub fn state(&self) -> OctantState {
        self.state
    }

    /// Indices of the entities assigned to this leaf
    pub fn entities(&self) -> &[usize] {
        &self.entities
    }
}

/// Octree spatial partitioning structure
#[derive(Debug, Clone)]
pub struct Octree {
    /// Arena of octants; index 0 is the root
    octants: Vec<Octant>,

    /// Leaves holding at least one entity, in traversal order
    leaves: Vec<OctantId>,

    /// For each entity index, the leaves it was assigned to
    dimensions: Vec<Vec<OctantId>>,

    /// Configuration
    config: OctreeConfig,
}

impl Octree {
    /// Create an unbuilt tree over an explicit cubical region
    pub fn new(center: Vec3, half_size: f32, config: OctreeConfig) -> Self {
        Self {
            octants: vec![Octant::new(OctantId::ROOT, center, half_size.abs(), 0, None)],
            leaves: Vec::new(),
            dimensions: Vec::new(),
            config,
        }
    }

    /// Build a tree whose root encloses every entity
    ///
    /// The root is centered on the union of all world AABBs and its half
    /// size is the largest half extent of that union, so the region is
    /// always a cube. An empty entity set gives a zero-sized root at the
    /// origin.
    pub fn build<S>(entities: &S, config: OctreeConfig) -> Self
    where
        S: EntitySource + ?Sized,
    {
        let (center, half_size) = Self::enclosing_cube(entities);
        let mut tree = Self::new(center, half_size, config);
        tree.construct_tree(entities, config.max_depth);
        tree
    }

    fn enclosing_cube<S>(entities: &S) -> (Vec3, f32)
    where
        S: EntitySource + ?Sized,
    {
        let union = AABB::union_all((0..entities.entity_count()).filter_map(|i| entities.global_aabb(i)))
            .unwrap_or_else(AABB::zero);
        (union.center(), union.extents().max())
    }

    /// Rebuild the whole tree for the given entities
    ///
    /// Destroys every existing octant below the root, subdivides while
    /// occupancy exceeds the ideal count, assigns entities to leaves and
    /// collects the non-empty leaves. Running it twice on unchanged input
    /// yields the same assignment.
    pub fn construct_tree<S>(&mut self, entities: &S, max_depth: u32)
    where
        S: EntitySource + ?Sized,
    {
        self.config.max_depth = max_depth;
        self.destroy_subtree();
        self.octants[OctantId::ROOT.0].state = OctantState::Leaf;
        self.dimensions = vec![Vec::new(); entities.entity_count()];

        if self.contains_more_than(OctantId::ROOT, self.config.ideal_entity_count, entities) {
            self.subdivide(OctantId::ROOT, entities);
        }
        self.assign_entities(OctantId::ROOT, entities);
        self.construct_list(OctantId::ROOT);

        log::debug!(
            "Octree built: {} octants, {} occupied leaves, {} entities, depth {}/{}",
            self.octants.len(),
            self.leaves.len(),
            entities.entity_count(),
            self.depth(),
            self.config.max_depth
        );
    }

    /// Rebuild using the configured maximum depth
    pub fn rebuild<S>(&mut self, entities: &S)
    where
        S: EntitySource + ?Sized,
    {
        self.construct_tree(entities, self.config.max_depth);
    }

    /// Drop every octant below the root and all assignments
    pub fn destroy_subtree(&mut self) {
        self.octants.truncate(1);
        let root = &mut self.octants[OctantId::ROOT.0];
        root.children = None;
        root.entities.clear();
        root.state = OctantState::Unbuilt;
        self.leaves.clear();
        self.dimensions.clear();
    }

    /// Split an octant into 8 equal cubes, recursing into crowded children
    ///
    /// No-op at the maximum depth or when already subdivided.
    fn subdivide<S>(&mut self, id: OctantId, entities: &S)
    where
        S: EntitySource + ?Sized,
    {
        let node = &self.octants[id.0];
        if node.level >= self.config.max_depth || node.children.is_some() {
            return;
        }

        let center = node.center;
        let level = node.level + 1;
        let quarter = node.half_size * 0.5;
        let first = self.octants.len();

        // Octant layout:
        // 0: -X, -Y, -Z    4: -X, -Y, +Z
        // 1: +X, -Y, -Z    5: +X, -Y, +Z
        // 2: -X, +Y, -Z    6: -X, +Y, +Z
        // 3: +X, +Y, -Z    7: +X, +Y, +Z
        let children: [OctantId; 8] = std::array::from_fn(|octant| OctantId(first + octant));
        for (octant, &child) in children.iter().enumerate() {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let offset = Vec3::new(sign(1), sign(2), sign(4)) * quarter;
            self.octants.push(Octant::new(child, center + offset, quarter, level, Some(id)));
        }

        let node = &mut self.octants[id.0];
        node.children = Some(children);
        node.entities.clear();
        node.state = OctantState::Subdivided;

        log::trace!("Subdivided octant {} at level {}", id.0, level - 1);

        for child in children {
            if self.contains_more_than(child, self.config.ideal_entity_count, entities) {
                self.subdivide(child, entities);
            }
        }
    }

    /// Whether more than `count` entities overlap the given octant
    pub fn contains_more_than<S>(&self, id: OctantId, count: usize, entities: &S) -> bool
    where
        S: EntitySource + ?Sized,
    {
        let mut overlapping = 0;
        for index in 0..entities.entity_count() {
            if self.is_colliding(id, index, entities) {
                overlapping += 1;
            }
            if overlapping > count {
                return true;
            }
        }
        false
    }

    /// Whether the entity's world AABB overlaps the octant
    ///
    /// Out-of-range entity indices and unknown octants return `false`.
    pub fn is_colliding<S>(&self, id: OctantId, index: usize, entities: &S) -> bool
    where
        S: EntitySource + ?Sized,
    {
        let (Some(octant), Some(aabb)) = (self.octant(id), entities.global_aabb(index)) else {
            return false;
        };
        octant.bounds().intersects(&aabb)
    }

    fn assign_entities<S>(&mut self, id: OctantId, entities: &S)
    where
        S: EntitySource + ?Sized,
    {
        if let Some(children) = self.octants[id.0].children {
            for child in children {
                self.assign_entities(child, entities);
            }
            return;
        }

        for index in 0..entities.entity_count() {
            if self.is_colliding(id, index, entities) {
                self.octants[id.0].entities.push(index);
                self.dimensions[index].push(id);
            }
        }
    }

    fn construct_list(&mut self, id: OctantId) {
        if let Some(children) = self.octants[id.0].children {
            for child in children {
                self.construct_list(child);
            }
        } else if !self.octants[id.0].entities.is_empty() {
            self.leaves.push(id);
        }
    }

    /// Empty every entity list while keeping the tree shape
    pub fn clear_entity_list(&mut self) {
        for octant in &mut self.octants {
            octant.entities.clear();
        }
        self.leaves.clear();
        for dimension in &mut self.dimensions {
            dimension.clear();
        }
    }

    /// The root octant
    pub fn root(&self) -> &Octant {
        &self.octants[OctantId::ROOT.0]
    }

    /// Octant by id
    pub fn octant(&self, id: OctantId) -> Option<&Octant> {
        self.octants.get(id.0)
    }

    /// Every octant, in creation order
    pub fn octants(&self) -> &[Octant] {
        &self.octants
    }

    /// Number of octants created by the last build
    pub fn octant_count(&self) -> usize {
        self.octants.len()
    }

    /// Leaves holding at least one entity
    pub fn leaves(&self) -> impl Iterator<Item = &Octant> + '_ {
        self.leaves.iter().map(|id| &self.octants[id.0])
    }

    /// Ids of the leaves holding at least one entity
    pub fn leaf_ids(&self) -> &[OctantId] {
        &self.leaves
    }

    /// Leaves the entity was assigned to; empty for unknown indices
    pub fn dimensions(&self, index: usize) -> &[OctantId] {
        match self.dimensions.get(index) {
            Some(leaves) => leaves,
            None => &[],
        }
    }

    /// Whether two entities were assigned to at least one common leaf
    pub fn share_leaf(&self, a: usize, b: usize) -> bool {
        let other = self.dimensions(b);
        self.dimensions(a).iter().any(|id| other.contains(id))
    }

    /// Every pair of entity indices sharing a leaf, each pair once as `(low, high)`
    pub fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for leaf in self.leaves() {
            for (n, &a) in leaf.entities.iter().enumerate() {
                for &b in &leaf.entities[n + 1..] {
                    pairs.insert((a.min(b), a.max(b)));
                }
            }
        }
        pairs.into_iter().collect()
    }

    /// Deepest level present in the tree
    pub fn depth(&self) -> u32 {
        self.octants.iter().map(Octant::level).max().unwrap_or(0)
    }

    /// Configuration used by the last build
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }
}
