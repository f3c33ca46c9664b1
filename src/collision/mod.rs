//! Collision detection against obstacles and against the robot itself.
//!
//! # Architecture
//!
//! Both detectors are pure functions over world-space snapshots wrapped in a
//! small stateful shell:
//!
//! 1. [`FixedRate`] gates the run to 20 Hz
//! 2. The pure pass builds a fresh result from current geometry
//! 3. The shell swaps the new result in wholesale and reports whether it changed

pub mod cadence;
pub mod obstacle;
pub mod result;
pub mod self_collision;

pub use cadence::{DetectorTick, FixedRate};
pub use obstacle::{detect_obstacle_collisions, CollisionConfig, NamedObb, ObstacleCollisionDetector};
pub use result::{
    link_label, CollisionResult, ObstaclePair, SelfCollisionPair, SelfCollisionResult, Severity,
    BASE_LABEL,
};
pub use self_collision::{
    base_radius_from_parts, detect_self_collisions, BaseProxy, SelfCollisionConfig,
    SelfCollisionDetector,
};
