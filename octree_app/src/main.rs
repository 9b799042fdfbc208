//! Octree collision demo
//!
//! Scatters oriented boxes inside a cubic arena, tumbles them around for a
//! fixed number of frames and runs octree-accelerated SAT collision detection
//! every frame. Debug draw commands are recorded instead of rendered, and
//! per-frame statistics go to the log.
//!
//! Usage: `octree_demo [scene.toml | scene.ron]`

use collision_engine::config::{CollisionConfig, Config, ConfigError};
use collision_engine::debug::{CollisionDebugVisualizer, DebugDrawSystem, DebugShape, OctreeDisplay};
use collision_engine::foundation::logging;
use collision_engine::foundation::math::{Mat4, Vec3};
use collision_engine::physics::{BoundingVolume, CollisionSystem, PhysicsError, VolumeId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Errors surfaced by the demo
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Scene file could not be loaded
    #[error("Scene configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Collision system rejected an operation
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),
}

/// Scene parameters, loadable from TOML or RON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for the scene generator
    pub seed: u64,
    /// Number of boxes
    pub entity_count: usize,
    /// Half size of the cubic arena the boxes bounce in
    pub arena_half_size: f32,
    /// Smallest half extent of a box
    pub min_extent: f32,
    /// Largest half extent of a box
    pub max_extent: f32,
    /// Largest linear speed
    pub max_speed: f32,
    /// Largest angular speed in radians per second
    pub max_spin: f32,
    /// Frames to simulate
    pub frames: u32,
    /// Fixed time step
    pub delta_time: f32,
    /// Collision system settings
    pub collision: CollisionConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            entity_count: 60,
            arena_half_size: 25.0,
            min_extent: 0.5,
            max_extent: 2.5,
            max_speed: 6.0,
            max_spin: 1.5,
            frames: 240,
            delta_time: 1.0 / 60.0,
            collision: CollisionConfig::default(),
        }
    }
}

impl Config for SceneConfig {}

/// A tumbling box
struct Body {
    id: VolumeId,
    position: Vec3,
    velocity: Vec3,
    spin_axis: Vec3,
    spin_speed: f32,
    angle: f32,
}

impl Body {
    fn model_matrix(&self) -> Mat4 {
        let axis = nalgebra::Unit::new_normalize(self.spin_axis);
        Mat4::new_translation(&self.position) * Mat4::from_axis_angle(&axis, self.angle)
    }
}

struct OctreeDemoApp {
    config: SceneConfig,
    system: CollisionSystem,
    bodies: Vec<Body>,
    visualizer: CollisionDebugVisualizer,
    debug_draw: DebugDrawSystem,
    frame: u32,
}

impl OctreeDemoApp {
    fn new(config: SceneConfig) -> Result<Self, AppError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut system = CollisionSystem::new(config.collision);
        let mut bodies = Vec::with_capacity(config.entity_count);

        let arena = config.arena_half_size;
        let extent_range = config.min_extent..=config.max_extent.max(config.min_extent);
        let random_vec = |rng: &mut StdRng, range: f32| {
            Vec3::new(rng.gen_range(-range..=range), rng.gen_range(-range..=range), rng.gen_range(-range..=range))
        };

        for _ in 0..config.entity_count {
            let extents = Vec3::new(
                rng.gen_range(extent_range.clone()),
                rng.gen_range(extent_range.clone()),
                rng.gen_range(extent_range.clone()),
            );
            let id = system.insert(BoundingVolume::from_center_extents(Vec3::zeros(), extents));

            let mut spin_axis = random_vec(&mut rng, 1.0);
            if spin_axis.norm_squared() < 1e-6 {
                spin_axis = Vec3::y();
            }
            let body = Body {
                id,
                position: random_vec(&mut rng, arena),
                velocity: random_vec(&mut rng, config.max_speed),
                spin_axis,
                spin_speed: rng.gen_range(-config.max_spin..=config.max_spin),
                angle: 0.0,
            };
            system.set_transform(id, body.model_matrix())?;
            bodies.push(body);
        }

        log::info!("Created {} boxes in a {}-unit arena", bodies.len(), arena * 2.0);

        let mut visualizer = CollisionDebugVisualizer::new();
        visualizer.show_octree = true;
        visualizer.octree_display = OctreeDisplay::Leaves;

        Ok(Self {
            config,
            system,
            bodies,
            visualizer,
            debug_draw: DebugDrawSystem::new(),
            frame: 0,
        })
    }

    fn update(&mut self, delta_time: f32) -> Result<(), AppError> {
        let bound = self.config.arena_half_size;
        for body in &mut self.bodies {
            body.position += body.velocity * delta_time;
            body.angle += body.spin_speed * delta_time;

            // Bounce off arena walls
            for axis in 0..3 {
                if body.position[axis].abs() > bound {
                    body.position[axis] = body.position[axis].clamp(-bound, bound);
                    body.velocity[axis] = -body.velocity[axis];
                }
            }

            self.system.set_transform(body.id, body.model_matrix())?;
        }

        let colliding = self.system.detect_collisions().len();
        let entered = self.system.get_collision_entered();
        let exited = self.system.get_collision_exited();
        for pair in &entered {
            log::debug!("Frame {}: {:?} hit {:?}", self.frame, pair.volume_a, pair.volume_b);
        }

        if let Some(octree) = self.system.octree() {
            log::info!(
                "Frame {:>4}: {} colliding pairs (+{} -{}), {} octants, {} occupied leaves",
                self.frame,
                colliding,
                entered.len(),
                exited.len(),
                octree.octant_count(),
                octree.leaf_ids().len()
            );
        } else {
            log::info!(
                "Frame {:>4}: {} colliding pairs (+{} -{}), brute force",
                self.frame,
                colliding,
                entered.len(),
                exited.len()
            );
        }

        self.frame += 1;
        Ok(())
    }

    fn render(&mut self) {
        self.debug_draw.clear();
        self.visualizer.draw_system(&self.system, &mut self.debug_draw);
        log::trace!(
            "Frame {}: {} spheres, {} cubes",
            self.frame,
            self.debug_draw.commands_of(DebugShape::WireSphere).count(),
            self.debug_draw.commands_of(DebugShape::WireCube).count()
        );
    }

    fn run(mut self) -> Result<(), AppError> {
        let delta_time = self.config.delta_time;
        for _ in 0..self.config.frames {
            self.update(delta_time)?;
            self.render();
        }

        let colliding = self.bodies.iter().filter(|body| self.system.is_colliding(body.id)).count();
        log::info!(
            "Finished {} frames: {} of {} boxes colliding, {} draw commands in last frame",
            self.frame,
            colliding,
            self.bodies.len(),
            self.debug_draw.command_count()
        );
        Ok(())
    }
}

fn main() -> Result<(), AppError> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading scene from {path}");
            SceneConfig::load_from_file(path)?
        }
        None => SceneConfig::default(),
    };

    OctreeDemoApp::new(config)?.run()
}
