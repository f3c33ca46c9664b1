//! User-placed obstacle boxes.

use glam::{EulerRot, Mat4, Quat, Vec3};
use tracing::debug;

use crate::collision::NamedObb;
use crate::geometry::Obb;

/// Full size of a freshly added obstacle.
pub const DEFAULT_OBSTACLE_SIZE: Vec3 = Vec3::splat(0.55);

/// Clearance kept around the robot base when spawning.
const ROBOT_AVOID_RADIUS: f32 = 0.95;
/// Gap kept between spawned obstacle footprints.
const SPAWN_GAP: f32 = 0.08;
const SPAWN_ATTEMPTS: usize = 32;
const SPAWN_RING_RADIUS: f32 = 1.2;
const SPAWN_RING_GROWTH: f32 = 0.1;
const SPAWN_RING_WIDTH: f32 = 0.6;
const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// A box obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: String,
    pub name: String,
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    /// Full box dimensions, each `>= 0`.
    pub size: Vec3,
}

impl Obstacle {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: Vec3, size: Vec3) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            rotation: Vec3::ZERO,
            size: size.max(Vec3::ZERO),
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size * 0.5
    }

    pub fn world_transform(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_rotation_translation(rotation, self.position)
    }

    /// World OBB. `None` when the pose is not finite.
    pub fn world_obb(&self) -> Option<Obb> {
        let half = self.half_extents();
        Obb::from_world_transform(-half, half, self.world_transform())
    }

    /// Footprint radius on the ground plane.
    fn footprint_radius(&self) -> f32 {
        self.size.x.max(self.size.z) * 0.5
    }
}

/// The set of obstacles in the scene.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    next_id: u64,
    revision: u64,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    /// Bumped on every add, remove or edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add a default obstacle resting on the floor near the robot, clear of
    /// the robot base and of other obstacles where possible. Returns its id.
    pub fn add(&mut self, robot_position: Vec3) -> String {
        self.next_id += 1;
        let id = format!("obstacle-{}", self.next_id);
        let name = format!("Obstacle {}", self.obstacles.len() + 1);
        let size = DEFAULT_OBSTACLE_SIZE;
        let (x, z) = self.choose_spawn_xz(size, robot_position);
        let obstacle = Obstacle::new(id.clone(), name, Vec3::new(x, size.y * 0.5, z), size);
        debug!(id = %obstacle.id, position = ?obstacle.position, "obstacle added");
        self.obstacles.push(obstacle);
        self.revision += 1;
        id
    }

    /// Insert a fully specified obstacle, replacing one with the same id.
    pub fn insert(&mut self, obstacle: Obstacle) {
        let obstacle = Obstacle {
            size: obstacle.size.max(Vec3::ZERO),
            ..obstacle
        };
        match self.obstacles.iter_mut().find(|o| o.id == obstacle.id) {
            Some(existing) => *existing = obstacle,
            None => self.obstacles.push(obstacle),
        }
        self.revision += 1;
    }

    pub fn remove(&mut self, id: &str) -> Option<Obstacle> {
        let index = self.obstacles.iter().position(|o| o.id == id)?;
        self.revision += 1;
        Some(self.obstacles.remove(index))
    }

    /// Update position and/or rotation. Returns `false` for an unknown id.
    pub fn update_pose(&mut self, id: &str, position: Option<Vec3>, rotation: Option<Vec3>) -> bool {
        let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        if let Some(position) = position {
            obstacle.position = position;
        }
        if let Some(rotation) = rotation {
            obstacle.rotation = rotation;
        }
        self.revision += 1;
        true
    }

    /// Resize, clamping each dimension to `>= 0`. Returns `false` for an unknown id.
    pub fn update_size(&mut self, id: &str, size: Vec3) -> bool {
        let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.id == id) else {
            return false;
        };
        obstacle.size = size.max(Vec3::ZERO);
        self.revision += 1;
        true
    }

    /// World OBBs keyed by obstacle id.
    pub fn world_obbs(&self) -> Vec<NamedObb<'_>> {
        self.obstacles
            .iter()
            .map(|o| NamedObb::new(&o.id, o.world_obb()))
            .collect()
    }

    /// Sample a ring around the robot and take the first safe spot. The ring
    /// grows with the obstacle count. Sampling follows the golden angle so
    /// placement is deterministic.
    fn choose_spawn_xz(&self, size: Vec3, robot_position: Vec3) -> (f32, f32) {
        let base_radius = SPAWN_RING_RADIUS + self.obstacles.len() as f32 * SPAWN_RING_GROWTH;
        let phase = self.next_id as f32 * GOLDEN_ANGLE;
        for k in 0..SPAWN_ATTEMPTS {
            let angle = phase + k as f32 * GOLDEN_ANGLE;
            let radius = base_radius + SPAWN_RING_WIDTH * ((k as f32 * 0.618_034).fract());
            let x = robot_position.x + angle.cos() * radius;
            let z = robot_position.z + angle.sin() * radius;
            if self.is_spawn_safe(x, z, size, robot_position) {
                return (x, z);
            }
        }
        (robot_position.x + base_radius, robot_position.z)
    }

    fn is_spawn_safe(&self, x: f32, z: f32, size: Vec3, robot_position: Vec3) -> bool {
        let my_radius = size.x.max(size.z) * 0.5;

        let dx = x - robot_position.x;
        let dz = z - robot_position.z;
        let avoid = ROBOT_AVOID_RADIUS + my_radius;
        if dx * dx + dz * dz < avoid * avoid {
            return false;
        }

        self.obstacles.iter().all(|o| {
            let dx = x - o.position.x;
            let dz = z - o.position.z;
            let min = o.footprint_radius() + my_radius + SPAWN_GAP;
            dx * dx + dz * dz >= min * min
        })
    }
}
