//! End-to-end checks of octree broad phase plus SAT narrow phase

use std::collections::HashSet;

use collision_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_model(rng: &mut StdRng, spread: f32) -> Mat4 {
    let position = Vec3::new(
        rng.gen_range(-spread..spread),
        rng.gen_range(-spread..spread),
        rng.gen_range(-spread..spread),
    );
    Mat4::new_translation(&position) * Mat4::rotation_x(rng.gen_range(0.0..3.0)) * Mat4::rotation_y(rng.gen_range(0.0..3.0))
}

fn populate(system: &mut CollisionSystem, rng: &mut StdRng, count: usize) -> Vec<VolumeId> {
    (0..count)
        .map(|_| {
            let extents = Vec3::new(rng.gen_range(0.3..2.0), rng.gen_range(0.3..2.0), rng.gen_range(0.3..2.0));
            system.insert(BoundingVolume::from_center_extents(Vec3::zeros(), extents))
        })
        .collect()
}

#[test]
fn octree_pairs_match_exhaustive_search_over_frames() {
    let config = CollisionConfig::from_toml_str(
        r#"
        use_octree = true

        [octree]
        max_depth = 4
        ideal_entity_count = 3
        "#,
    )
    .unwrap();
    assert_eq!(config.octree.max_depth, 4);

    let mut rng = StdRng::seed_from_u64(2024);
    let mut system = CollisionSystem::new(config);
    let ids = populate(&mut system, &mut rng, 80);

    for frame in 0..4 {
        for &id in &ids {
            system.set_transform(id, random_model(&mut rng, 12.0)).unwrap();
        }
        let found: HashSet<CollisionPair> = system.detect_collisions().clone();

        let mut expected = HashSet::new();
        for (n, &a) in ids.iter().enumerate() {
            for &b in &ids[n + 1..] {
                if system.get(a).unwrap().collides_with(system.get(b).unwrap()) {
                    expected.insert(CollisionPair::new(a, b));
                }
            }
        }

        assert_eq!(found, expected, "frame {frame}");

        // Overlap sets mirror the reported pairs
        for &id in &ids {
            let volume = system.get(id).unwrap();
            let partners = found.iter().filter(|pair| pair.contains(id)).count();
            assert_eq!(volume.colliding_count(), partners);
        }

        // Every colliding pair shares a leaf
        let octree = system.octree().unwrap();
        for pair in &found {
            let a = system.entity_index(pair.volume_a).unwrap();
            let b = system.entity_index(pair.volume_b).unwrap();
            assert!(octree.share_leaf(a, b));
        }
    }
}

#[test]
fn octree_over_plain_volume_list() {
    let mut rng = StdRng::seed_from_u64(5);
    let volumes: Vec<BoundingVolume> = (0..50)
        .map(|_| {
            let mut volume = BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::repeat(0.5));
            volume.set_model_matrix(random_model(&mut rng, 20.0));
            volume
        })
        .collect();

    let octree = Octree::build(&volumes, OctreeConfig::default());
    let root = octree.root();

    // The root cube encloses every world AABB
    let bounds = AABB::from_center_extents(root.center(), Vec3::repeat(root.half_size() + 1e-4));
    for volume in &volumes {
        assert!(bounds.contains_point(volume.min_global()));
        assert!(bounds.contains_point(volume.max_global()));
    }

    for (a, b) in octree.candidate_pairs() {
        assert!(a < b);
        assert!(octree.share_leaf(a, b));
    }
    for leaf in octree.leaves() {
        assert!(leaf.level() <= OctreeConfig::default().max_depth);
        assert!(!leaf.entities().is_empty());
    }
}

#[test]
fn separating_axis_reports_first_axis_found() {
    let a = BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
    let mut b = a.clone();

    b.set_model_matrix(Mat4::new_translation(&Vec3::new(0.0, 0.0, -5.0)));
    assert_eq!(separating_axis_test(&a, &b), SatResult::Az);

    b.set_model_matrix(Mat4::new_translation(&Vec3::new(0.0, 0.5, 0.0)));
    assert_eq!(separating_axis_test(&a, &b), SatResult::NoSeparatingAxis);
}
