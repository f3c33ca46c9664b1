use std::path::PathBuf;

use anyhow::{Context, Result};
use armsim::animation::{AnimTarget, AnimationDefinition, KeyframeNode, LoopMode};
use armsim::collision::Severity;
use armsim::playback::{PlaybackOptions, TickOutcome};
use armsim::robot::{Robot, UrdfLoader};
use armsim::scene::Obstacle;
use armsim::sim::{Simulation, SimulationConfig};
use glam::Vec3;

/// Fixed frame step of the headless loop.
const FRAME_DT: f64 = 1.0 / 60.0;
/// Give up after this many simulated seconds.
const MAX_SECONDS: f64 = 30.0;

fn demo_animation() -> AnimationDefinition {
    let joint = AnimTarget::joint;
    AnimationDefinition::new("sweep", "Sweep and reach")
        .with_loop_mode(LoopMode::None)
        .with_node(KeyframeNode::new("yaw-out", AnimTarget::BaseYaw, 1, 60.0).with_label("turn"))
        .with_node(KeyframeNode::new("shoulder-out", joint("shoulder"), 1, 35.0))
        .with_node(KeyframeNode::new("elbow-out", joint("elbow"), 2, 70.0).with_label("reach"))
        .with_node(KeyframeNode::new("wrist-out", joint("wrist_pitch"), 2, 40.0))
        // Layer 3 is a rest slot.
        .with_node(KeyframeNode::new("yaw-back", AnimTarget::BaseYaw, 4, -30.0))
        .with_node(KeyframeNode::new("elbow-back", joint("elbow"), 4, 0.0))
        .with_node(KeyframeNode::new("shoulder-back", joint("shoulder"), 5, 0.0))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let urdf_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/arm.urdf")));
    let rig = UrdfLoader::load(&urdf_path)
        .with_context(|| format!("Failed to load robot from {}", urdf_path.display()))?;

    let config = SimulationConfig::default().with_playback(
        PlaybackOptions::default()
            .with_stop_on_collision(false)
            .with_self_collision(true),
    );
    let mut sim = Simulation::new(Robot::new(rig), config);

    for _ in 0..3 {
        let id = sim.add_obstacle();
        log::info!("spawned {id}");
    }
    // One obstacle right in the sweep path.
    sim.obstacles_mut().insert(
        Obstacle::new("obstacle-pillar", "Pillar", Vec3::new(0.55, 0.6, 0.55), Vec3::new(0.2, 1.2, 0.2))
            .with_rotation(Vec3::new(0.0, 0.4, 0.0)),
    );

    let id = sim.save_animation(demo_animation())?;
    sim.start_playback(&id)?;

    let mut elapsed = 0.0;
    let mut last_severity = Severity::None;
    while elapsed < MAX_SECONDS {
        let frame = sim.tick(FRAME_DT);
        elapsed += FRAME_DT;

        let severity = sim.collision().severity;
        if severity != last_severity {
            log::info!(
                "t={elapsed:.2}s severity {last_severity} -> {severity} (parts: {:?})",
                sim.collision().colliding_parts
            );
            last_severity = severity;
        }
        if frame.self_collision.changed() && !sim.self_collision().is_empty() {
            log::warn!("self-collision: {}", sim.self_collision().signature());
        }

        match frame.playback {
            TickOutcome::Stopped(reason) => {
                log::info!("playback stopped ({reason}) after {elapsed:.2}s");
                break;
            }
            TickOutcome::Idle => break,
            TickOutcome::Playing { .. } => {}
        }
    }

    if sim.take_report_request() {
        println!("Collision report:");
        println!("{}", sim.report());
    }
    Ok(())
}
