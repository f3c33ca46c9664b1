//! Frame-driven simulation facade.
//!
//! [`Simulation`] owns every piece of mutable state and advances it in one
//! call per host frame. Within a frame the playback pose is always written
//! before either detector reads it.

use tracing::{debug, info};

use crate::animation::{AnimTarget, AnimationDefinition, AnimationLibrary, TimelineError};
use crate::collision::{
    CollisionConfig, CollisionResult, DetectorTick, ObstacleCollisionDetector, SelfCollisionConfig,
    SelfCollisionDetector, SelfCollisionResult,
};
use crate::playback::{
    Contacts, PlaybackError, PlaybackOptions, PlaybackReport, PlaybackScheduler, PlaybackWorld,
    PoseSink, StopReason, TickOutcome,
};
use crate::robot::{Robot, RobotRig};
use crate::scene::ObstacleField;

/// Settings for every subsystem of a [`Simulation`].
#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    pub collision: CollisionConfig,
    pub self_collision: SelfCollisionConfig,
    pub playback: PlaybackOptions,
}

impl SimulationConfig {
    pub fn with_collision(mut self, collision: CollisionConfig) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_self_collision(mut self, self_collision: SelfCollisionConfig) -> Self {
        self.self_collision = self_collision;
        self
    }

    pub fn with_playback(mut self, playback: PlaybackOptions) -> Self {
        self.playback = playback;
        self
    }
}

/// What happened during one [`Simulation::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutput {
    pub playback: TickOutcome,
    pub obstacle: DetectorTick,
    pub self_collision: DetectorTick,
    /// Playback stopped this frame in a way that should show the report.
    pub open_report: bool,
}

/// Robot, obstacles, animations, detectors and the playback scheduler.
#[derive(Debug, Clone)]
pub struct Simulation {
    robot: Robot,
    obstacles: ObstacleField,
    library: AnimationLibrary,
    obstacle_detector: ObstacleCollisionDetector,
    self_detector: SelfCollisionDetector,
    scheduler: PlaybackScheduler,
}

impl Simulation {
    pub fn new(robot: Robot, config: SimulationConfig) -> Self {
        info!(
            robot = %robot.rig().name(),
            joints = robot.joints().len(),
            body_parts = robot.rig().body_parts().len(),
            "simulation created"
        );
        Self {
            robot,
            obstacles: ObstacleField::new(),
            library: AnimationLibrary::new(),
            obstacle_detector: ObstacleCollisionDetector::new(config.collision),
            self_detector: SelfCollisionDetector::new(config.self_collision),
            scheduler: PlaybackScheduler::new(config.playback),
        }
    }

    pub fn from_rig(rig: RobotRig) -> Self {
        Self::new(Robot::new(rig), SimulationConfig::default())
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// Direct pose access for manual control.
    pub fn robot_mut(&mut self) -> &mut Robot {
        &mut self.robot
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut ObstacleField {
        &mut self.obstacles
    }

    /// Spawn a default obstacle near the robot. Returns its id.
    pub fn add_obstacle(&mut self) -> String {
        self.obstacles.add(self.robot.position())
    }

    pub fn library(&self) -> &AnimationLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut AnimationLibrary {
        &mut self.library
    }

    /// Validate and store an animation. Returns its id.
    pub fn save_animation(&mut self, animation: AnimationDefinition) -> Result<String, TimelineError> {
        self.library.save(animation)
    }

    pub fn collision(&self) -> &CollisionResult {
        self.obstacle_detector.result()
    }

    pub fn self_collision(&self) -> &SelfCollisionResult {
        self.self_detector.result()
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn report(&self) -> &PlaybackReport {
        self.scheduler.report()
    }

    pub fn clear_report(&mut self) {
        self.scheduler.clear_report();
    }

    /// Acknowledge a pending request to show the report.
    pub fn take_report_request(&mut self) -> bool {
        self.scheduler.take_report_request()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Start playing a saved animation from the beginning.
    pub fn start_playback(&mut self, animation_id: &str) -> Result<(), PlaybackError> {
        self.scheduler.start(animation_id, &self.library, &mut self.robot)?;
        // The first playback frame must sense the freshly reset pose.
        self.obstacle_detector.prime();
        self.self_detector.prime();
        Ok(())
    }

    /// Start the library's selected animation.
    pub fn start_selected(&mut self) -> Result<(), PlaybackError> {
        let id = self
            .library
            .selected_id()
            .map(str::to_string)
            .ok_or_else(|| PlaybackError::AnimationNotFound(String::new()))?;
        self.start_playback(&id)
    }

    pub fn stop_playback(&mut self) {
        self.scheduler.stop(StopReason::User);
    }

    /// Run both detectors now, ignoring their rate gates.
    pub fn refresh_collisions(&mut self) -> (DetectorTick, DetectorTick) {
        let parts = self.robot.body_part_obbs();
        let obstacles = self.obstacles.world_obbs();
        let obstacle = self.obstacle_detector.detect_now(&parts, &obstacles);
        let base = self.robot.base_proxy();
        let pivots = self.robot.pivot_positions();
        let self_collision = self.self_detector.detect_now(&pivots, base.as_ref());
        (obstacle, self_collision)
    }

    /// Advance everything by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> FrameOutput {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

        let mut world = SimWorld {
            robot: &mut self.robot,
            obstacles: &self.obstacles,
            obstacle_detector: &mut self.obstacle_detector,
            self_detector: &mut self.self_detector,
            obstacle_tick: DetectorTick::Skipped,
            self_tick: DetectorTick::Skipped,
            sensed: false,
        };
        let playback = self.scheduler.tick(dt, &self.library, &mut world);
        if !world.sensed {
            world.sense(dt);
        }

        let open_report = matches!(playback, TickOutcome::Stopped(reason) if reason.opens_report());
        if open_report {
            debug!(events = self.scheduler.report().len(), "report ready");
        }
        FrameOutput {
            playback,
            obstacle: world.obstacle_tick,
            self_collision: world.self_tick,
            open_report,
        }
    }
}

/// Borrowed view the scheduler drives during one frame.
struct SimWorld<'a> {
    robot: &'a mut Robot,
    obstacles: &'a ObstacleField,
    obstacle_detector: &'a mut ObstacleCollisionDetector,
    self_detector: &'a mut SelfCollisionDetector,
    obstacle_tick: DetectorTick,
    self_tick: DetectorTick,
    sensed: bool,
}

impl SimWorld<'_> {
    fn sense(&mut self, dt: f64) {
        let parts = self.robot.body_part_obbs();
        let obstacles = self.obstacles.world_obbs();
        self.obstacle_tick = self.obstacle_detector.update(dt, &parts, &obstacles);

        let pivots = self.robot.pivot_positions();
        let base = self.robot.base_proxy();
        self.self_tick = self.self_detector.update(dt, &pivots, base.as_ref());
        self.sensed = true;
    }
}

impl PoseSink for SimWorld<'_> {
    fn apply_target(&mut self, target: &AnimTarget, degrees: f32) {
        self.robot.apply_target(target, degrees);
    }

    fn reset_targets(&mut self) {
        self.robot.reset_targets();
    }
}

impl PlaybackWorld for SimWorld<'_> {
    fn sense_collisions(&mut self, dt: f64) -> Contacts<'_> {
        self.sense(dt);
        Contacts {
            obstacle: &self.obstacle_detector.result().colliding_pairs,
            self_collision: &self.self_detector.result().pairs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::KeyframeNode;
    use crate::robot::{BodyPart, RigJoint};
    use crate::scene::Obstacle;
    use glam::{Mat4, Vec3};

    fn column() -> Simulation {
        let up = |y: f32| Mat4::from_translation(Vec3::new(0.0, y, 0.0));
        let rig = RobotRig::builder("column")
            .joint(RigJoint::revolute("yaw", "base", "mast", up(0.2), Vec3::Y))
            .body_part(BodyPart::cuboid("base_box", "base", up(0.1), Vec3::new(0.4, 0.2, 0.4)))
            .body_part(BodyPart::cuboid("mast_box", "mast", up(0.5), Vec3::new(0.1, 1.0, 0.1)))
            .chain(["yaw"])
            .build()
            .unwrap();
        Simulation::from_rig(rig)
    }

    #[test]
    fn test_idle_tick_still_senses() {
        let mut sim = column();
        sim.obstacles_mut().insert(Obstacle::new(
            "crate",
            "Crate",
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::splat(0.3),
        ));

        let frame = sim.tick(0.05);
        assert_eq!(frame.playback, TickOutcome::Idle);
        assert_eq!(frame.obstacle, DetectorTick::Changed);
        assert!(sim.collision().colliding_obstacles.contains("crate"));
        assert!(!frame.open_report);

        // Too soon for the 20 Hz gate.
        assert_eq!(sim.tick(0.01).obstacle, DetectorTick::Skipped);
    }

    #[test]
    fn test_start_unknown_animation() {
        let mut sim = column();
        assert!(matches!(
            sim.start_playback("nope"),
            Err(PlaybackError::AnimationNotFound(_))
        ));
        assert!(sim.start_selected().is_err());
    }

    #[test]
    fn test_yaw_animation_ends() {
        let mut sim = column();
        let id = sim
            .save_animation(
                AnimationDefinition::new("spin", "Spin")
                    .with_node(KeyframeNode::new("n1", AnimTarget::BaseYaw, 1, 90.0)),
            )
            .unwrap();
        sim.start_selected().unwrap();
        assert!(sim.is_playing());

        let first = sim.tick(0.5);
        assert_eq!(first.playback, TickOutcome::Playing { new_events: 0 });
        assert_eq!(first.obstacle, DetectorTick::Unchanged);
        assert!((sim.robot().yaw_rad() - 45f32.to_radians()).abs() < 1e-6);

        let last = sim.tick(0.5);
        assert_eq!(last.playback, TickOutcome::Stopped(StopReason::Ended));
        assert!(last.open_report);
        assert!(sim.take_report_request());
        assert_eq!(sim.report().to_text(), "(no collisions recorded)");
        assert_eq!(sim.library().selected_id(), Some(id.as_str()));
    }

    #[test]
    fn test_user_stop() {
        let mut sim = column();
        sim.save_animation(
            AnimationDefinition::new("spin", "Spin")
                .with_node(KeyframeNode::new("n1", AnimTarget::BaseYaw, 1, 90.0)),
        )
        .unwrap();
        sim.start_playback("spin").unwrap();
        sim.tick(0.1);
        sim.stop_playback();
        let frame = sim.tick(0.1);
        assert_eq!(frame.playback, TickOutcome::Idle);
        assert!(!sim.take_report_request());
    }
}
