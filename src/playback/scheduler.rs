//! Playback scheduler state machine.

use thiserror::Error;
use tracing::{debug, info};

use super::report::{CollisionKind, ContactKey, EdgeTracker, PlaybackReport, ReportEvent};
use super::state::{Direction, PlaybackOptions, PlaybackState, PlaybackStatus, StopReason};
use super::{PlaybackWorld, PoseSink};
use crate::animation::{
    resolve_timeline, AnimationDefinition, AnimationLibrary, LoopMode, Timeline, TimelineError,
    SLOT_DURATION,
};

/// A playhead this close to the end counts as the end.
const END_SNAP_EPSILON: f64 = 1e-9;

/// Errors returned by [`PlaybackScheduler::start`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("animation `{0}` not found")]
    AnimationNotFound(String),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

/// Result of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is playing.
    Idle,
    /// Still playing; `new_events` contacts were logged this tick.
    Playing { new_events: usize },
    /// Playback stopped during this tick.
    Stopped(StopReason),
}

/// Snapshot taken when a run starts. Later library edits do not reach it.
#[derive(Debug, Clone)]
struct ActiveRun {
    animation: AnimationDefinition,
    timeline: Timeline,
}

/// Drives a saved animation through its timeline.
#[derive(Debug, Clone, Default)]
pub struct PlaybackScheduler {
    options: PlaybackOptions,
    state: PlaybackState,
    run: Option<ActiveRun>,
    sim_time: f64,
    edges: EdgeTracker,
    report: PlaybackReport,
    report_requested: bool,
    last_stop: Option<StopReason>,
}

impl PlaybackScheduler {
    pub fn new(options: PlaybackOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &PlaybackOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: PlaybackOptions) {
        self.options = options;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// The animation being played, as it was when the run started.
    pub fn animation(&self) -> Option<&AnimationDefinition> {
        self.run.as_ref().map(|run| &run.animation)
    }

    /// Timeline of the current run.
    pub fn timeline(&self) -> Option<&Timeline> {
        self.run.as_ref().map(|run| &run.timeline)
    }

    /// Seconds of simulated playback since the last start.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn report(&self) -> &PlaybackReport {
        &self.report
    }

    pub fn clear_report(&mut self) {
        self.report.clear();
    }

    pub fn last_stop_reason(&self) -> Option<StopReason> {
        self.last_stop
    }

    /// Whether a stop asked for the report to be shown and nobody has
    /// acknowledged it yet.
    pub fn report_requested(&self) -> bool {
        self.report_requested
    }

    /// Acknowledge the report request. Returns whether one was pending.
    pub fn take_report_request(&mut self) -> bool {
        std::mem::take(&mut self.report_requested)
    }

    /// Start playing `animation_id` from the beginning.
    ///
    /// The animation is copied, so editing the library mid-run does not
    /// change what plays. On success every target is reset to zero, the
    /// previous report is cleared, and the playhead starts at 0 moving forward.
    pub fn start(
        &mut self,
        animation_id: &str,
        library: &AnimationLibrary,
        sink: &mut impl PoseSink,
    ) -> Result<(), PlaybackError> {
        let animation = library
            .get(animation_id)
            .ok_or_else(|| PlaybackError::AnimationNotFound(animation_id.to_string()))?
            .clone();
        let timeline = resolve_timeline(&animation)?;

        self.report.clear();
        self.report_requested = false;
        self.edges.reset();
        self.sim_time = 0.0;
        sink.reset_targets();

        self.state = PlaybackState {
            status: PlaybackStatus::Playing,
            animation_id: Some(animation_id.to_string()),
            playhead: 0.0,
            direction: Direction::Forward,
        };

        info!(
            animation = %animation_id,
            slots = timeline.slot_count(),
            loop_mode = ?animation.loop_mode,
            "playback started"
        );
        self.run = Some(ActiveRun { animation, timeline });
        Ok(())
    }

    /// Stop playback. Does nothing when already idle.
    pub fn stop(&mut self, reason: StopReason) {
        if !self.state.is_playing() {
            return;
        }
        info!(
            %reason,
            sim_time = self.sim_time,
            events = self.report.len(),
            "playback stopped"
        );
        self.state = PlaybackState::default();
        self.run = None;
        self.last_stop = Some(reason);
        if reason.opens_report() {
            self.report_requested = true;
        }
    }

    /// Advance playback by `dt` seconds.
    ///
    /// `library` is only consulted to notice that the playing animation was
    /// deleted, which ends the run.
    pub fn tick(
        &mut self,
        dt: f64,
        library: &AnimationLibrary,
        world: &mut impl PlaybackWorld,
    ) -> TickOutcome {
        if !self.state.is_playing() {
            return TickOutcome::Idle;
        }

        let still_saved = self
            .state
            .animation_id
            .as_deref()
            .is_some_and(|id| library.get(id).is_some());
        let Some(run) = self.run.as_ref().filter(|_| still_saved) else {
            return self.stop_with(StopReason::Ended);
        };

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let total = run.timeline.total_duration();
        let loop_mode = run.animation.loop_mode;
        let (playhead, direction) = advance(
            self.state.playhead,
            self.state.direction,
            dt,
            total,
            loop_mode,
        );

        let from = run.timeline.locate(self.state.playhead);
        let slot = run.timeline.locate(playhead);
        settle_left_layers(&run.animation, from.index, slot.index, world);
        for node in run.animation.nodes_on_layer(slot.layer) {
            world.apply_target(&node.target, node.value_at(slot.alpha));
        }
        self.sim_time += dt;

        let contacts = world.sense_collisions(dt);
        let mut active: Vec<ContactKey> = contacts
            .obstacle
            .iter()
            .map(|p| ContactKey::new(CollisionKind::Obstacle, &p.body_part, &p.obstacle_id))
            .collect();
        if self.options.include_self_collision {
            active.extend(
                contacts
                    .self_collision
                    .iter()
                    .map(|p| ContactKey::new(CollisionKind::SelfCollision, &p.a, &p.b)),
            );
        }

        let entered = self.edges.rising(active.iter().cloned());
        let new_events = entered.len();
        for key in entered {
            debug!(
                sim_time = self.sim_time,
                layer = slot.layer,
                kind = %key.kind,
                a = %key.a,
                b = %key.b,
                "contact entered"
            );
            self.report.push(ReportEvent {
                sim_time: self.sim_time,
                layer: slot.layer,
                kind: key.kind,
                a: key.a,
                b: key.b,
            });
        }

        if self.options.stop_on_collision && !active.is_empty() {
            return self.stop_with(StopReason::Collision);
        }
        if loop_mode == LoopMode::None && playhead >= total {
            return self.stop_with(StopReason::Ended);
        }

        self.state.playhead = playhead;
        self.state.direction = direction;
        TickOutcome::Playing { new_events }
    }

    fn stop_with(&mut self, reason: StopReason) -> TickOutcome {
        self.stop(reason);
        TickOutcome::Stopped(reason)
    }
}

/// Write the boundary value of every layer the playhead left this tick: the
/// end value when moving forward, the start value when moving backward. A
/// target on a layer that is not active keeps exactly that value.
fn settle_left_layers(
    animation: &AnimationDefinition,
    from: usize,
    to: usize,
    sink: &mut impl PoseSink,
) {
    let (indices, alpha): (Vec<usize>, f64) = if to > from {
        ((from..to).collect(), 1.0)
    } else {
        ((to + 1..=from).rev().collect(), 0.0)
    };
    for index in indices {
        for node in animation.nodes_on_layer(index as i32 + 1) {
            sink.apply_target(&node.target, node.value_at(alpha));
        }
    }
}

/// Move the playhead by `dt`. Ping-pong bounces off both ends, clamping to
/// the bound and flipping direction; otherwise the playhead clamps at `total`.
fn advance(
    playhead: f64,
    direction: Direction,
    dt: f64,
    total: f64,
    loop_mode: LoopMode,
) -> (f64, Direction) {
    match loop_mode {
        LoopMode::PingPong => {
            let next = playhead + dt * direction.sign();
            if next >= total {
                (total, Direction::Backward)
            } else if next <= 0.0 {
                (0.0, Direction::Forward)
            } else {
                (next, direction)
            }
        }
        LoopMode::None => {
            let next = playhead + dt;
            if next >= total - END_SNAP_EPSILON * SLOT_DURATION {
                (total, Direction::Forward)
            } else {
                (next, Direction::Forward)
            }
        }
    }
}
