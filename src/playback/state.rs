//! Playback state and policy.

use std::fmt;

/// Whether an animation is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
}

/// Travel direction of the playhead. Only ping-pong ever reverses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// Live playback state. Reset to the default whenever playback stops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub animation_id: Option<String>,
    /// Seconds from the start of the timeline.
    pub playhead: f64,
    pub direction: Direction,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}

/// Why playback stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stopped by the user.
    User,
    /// Reached the end, or the animation disappeared.
    Ended,
    /// Stopped by the stop-on-collision policy.
    Collision,
    /// Stopped by the host for its own reasons.
    System,
}

impl StopReason {
    /// Whether this stop should bring up the report.
    pub fn opens_report(self) -> bool {
        matches!(self, StopReason::Ended | StopReason::Collision)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::User => "user",
            StopReason::Ended => "ended",
            StopReason::Collision => "collision",
            StopReason::System => "system",
        };
        f.write_str(s)
    }
}

/// Playback policy.
#[derive(Debug, Clone)]
pub struct PlaybackOptions {
    /// Stop as soon as any contact is active. Default: true.
    pub stop_on_collision: bool,
    /// Treat self-collision as a contact. Default: false.
    pub include_self_collision: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            stop_on_collision: true,
            include_self_collision: false,
        }
    }
}

impl PlaybackOptions {
    pub fn with_stop_on_collision(mut self, stop: bool) -> Self {
        self.stop_on_collision = stop;
        self
    }

    pub fn with_self_collision(mut self, include: bool) -> Self {
        self.include_self_collision = include;
        self
    }
}
