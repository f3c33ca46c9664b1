//! Animation playback.
//!
//! # Architecture
//!
//! Each scheduler tick runs in a fixed order:
//!
//! 1. Advance the playhead (clamping or bouncing at the ends)
//! 2. Write interpolated values for the active layer through [`PoseSink`]
//! 3. Ask the [`PlaybackWorld`] for contacts against the updated pose
//! 4. Log newly entering contacts and apply the stop policy

pub mod report;
pub mod scheduler;
pub mod state;

pub use report::{CollisionKind, ContactKey, EdgeTracker, PlaybackReport, ReportEvent};
pub use scheduler::{PlaybackError, PlaybackScheduler, TickOutcome};
pub use state::{Direction, PlaybackOptions, PlaybackState, PlaybackStatus, StopReason};

use crate::animation::AnimTarget;
use crate::collision::{ObstaclePair, SelfCollisionPair};

/// Receives animated values.
pub trait PoseSink {
    /// Drive `target` to `degrees`.
    fn apply_target(&mut self, target: &AnimTarget, degrees: f32);

    /// Drive every animatable target to zero.
    fn reset_targets(&mut self);
}

/// Contacts active after the latest pose write.
#[derive(Debug, Clone, Copy, Default)]
pub struct Contacts<'a> {
    /// Body parts overlapping obstacles. Near misses are not contacts.
    pub obstacle: &'a [ObstaclePair],
    pub self_collision: &'a [SelfCollisionPair],
}

/// What the scheduler drives and observes.
pub trait PlaybackWorld: PoseSink {
    /// Run collision sensing for a tick of `dt` seconds against the current
    /// pose and return the active contacts.
    fn sense_collisions(&mut self, dt: f64) -> Contacts<'_>;
}
