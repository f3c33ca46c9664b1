//! armsim
//!
//! Collision sensing and keyframe playback for a single articulated robot arm
//! standing among box obstacles.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **geometry** - AABB, OBB with SAT overlap, segment distances
//! 2. **collision** - Rate-limited obstacle and self-collision detectors
//! 3. **robot** - Rig description, URDF loading (feature = "urdf"), posed robot
//! 4. **scene** - Obstacle field
//! 5. **animation** - Keyframe definitions, timelines, saved library
//! 6. **playback** - Scheduler, stop policy, collision report
//! 7. **sim** - One-call-per-frame facade tying it all together

pub mod animation;
pub mod collision;
pub mod geometry;
pub mod playback;
pub mod robot;
pub mod scene;
pub mod sim;

// Re-export commonly used types
pub use animation::{
    resolve_timeline, AnimTarget, AnimationDefinition, AnimationLibrary, KeyframeNode, LoopMode,
    Timeline, TimelineError,
};
pub use collision::{
    CollisionConfig, CollisionResult, DetectorTick, ObstacleCollisionDetector, ObstaclePair,
    SelfCollisionConfig, SelfCollisionDetector, SelfCollisionPair, SelfCollisionResult, Severity,
};
pub use geometry::{Aabb, Obb, Segment};
pub use playback::{
    PlaybackError, PlaybackOptions, PlaybackReport, PlaybackScheduler, PlaybackState, ReportEvent,
    StopReason, TickOutcome,
};
#[cfg(feature = "urdf")]
pub use robot::UrdfLoader;
pub use robot::{BodyPart, JointState, RigError, RigJoint, Robot, RobotRig};
pub use scene::{Obstacle, ObstacleField};
pub use sim::{FrameOutput, Simulation, SimulationConfig};

// Re-export glam for convenience
pub use glam;
