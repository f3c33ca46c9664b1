//! Shared setup helpers for armsim benchmarks.
//!
//! ## Running
//!
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench collision
//!
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench collision -- sat
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench collision -- playback

use armsim::animation::{AnimTarget, AnimationDefinition, KeyframeNode, LoopMode};
use armsim::playback::PlaybackOptions;
use armsim::robot::{BodyPart, RigJoint, Robot, RobotRig};
use armsim::scene::{Obstacle, ObstacleField};
use armsim::sim::{Simulation, SimulationConfig};
use glam::{Mat4, Vec3};

fn up(y: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, y, 0.0))
}

/// A serial arm with `links` revolute joints alternating about Y and X, each
/// link 0.3 m long with one box body part.
pub fn setup_arm(links: usize) -> RobotRig {
    let mut builder = RobotRig::builder(format!("bench_arm_{links}"))
        .body_part(BodyPart::cuboid("base_box", "link0", up(0.1), Vec3::new(0.4, 0.2, 0.4)));
    for i in 0..links {
        let axis = if i % 2 == 0 { Vec3::Y } else { Vec3::X };
        let offset = if i == 0 { 0.2 } else { 0.3 };
        builder = builder
            .joint(RigJoint::revolute(
                format!("j{}", i + 1),
                format!("link{i}"),
                format!("link{}", i + 1),
                up(offset),
                axis,
            ))
            .body_part(BodyPart::cuboid(
                format!("link{}_box", i + 1),
                format!("link{}", i + 1),
                up(0.15),
                Vec3::new(0.08, 0.3, 0.08),
            ));
    }
    builder
        .joint(RigJoint::fixed(
            "tip",
            format!("link{links}"),
            "tool",
            up(0.3),
        ))
        .build()
        .expect("bench rig is valid")
}

/// `n` box obstacles on a ring around the origin, roughly half of them
/// inside the arm's reach.
pub fn setup_obstacles(n: usize) -> ObstacleField {
    let mut field = ObstacleField::new();
    for i in 0..n {
        let angle = i as f32 * 2.399_963;
        let radius = 0.3 + (i % 8) as f32 * 0.2;
        let position = Vec3::new(angle.cos() * radius, 0.4 + (i % 3) as f32 * 0.3, angle.sin() * radius);
        field.insert(
            Obstacle::new(format!("obstacle-{}", i + 1), format!("Obstacle {}", i + 1), position, Vec3::splat(0.25))
                .with_rotation(Vec3::new(0.0, angle, 0.0)),
        );
    }
    field
}

/// A robot posed with every joint bent, so link segments are not collinear.
pub fn posed_robot(links: usize) -> Robot {
    let mut robot = Robot::new(setup_arm(links));
    for i in 0..links {
        robot.set_joint_angle(&format!("j{}", i + 1), 0.6);
    }
    robot
}

/// A ping-pong animation driving every joint, one joint per layer.
pub fn sweep_animation(links: usize) -> AnimationDefinition {
    let mut animation = AnimationDefinition::new("sweep", "Sweep").with_loop_mode(LoopMode::PingPong);
    for i in 0..links {
        let layer = i as i32 + 1;
        animation = animation
            .with_node(KeyframeNode::new(format!("n{layer}"), AnimTarget::joint(format!("j{layer}")), layer, 45.0))
            .with_node(KeyframeNode::new(format!("y{layer}"), AnimTarget::BaseYaw, layer, layer as f32 * 15.0));
    }
    animation
}

/// A simulation playing [`sweep_animation`] among `obstacles` boxes. Contacts
/// are logged but never stop playback.
pub fn setup_playing_simulation(links: usize, obstacles: usize) -> Simulation {
    let config = SimulationConfig::default()
        .with_playback(PlaybackOptions::default().with_stop_on_collision(false));
    let mut sim = Simulation::new(Robot::new(setup_arm(links)), config);
    *sim.obstacles_mut() = setup_obstacles(obstacles);
    let id = sim
        .save_animation(sweep_animation(links))
        .expect("bench animation is valid");
    sim.start_playback(&id).expect("bench animation starts");
    sim
}
