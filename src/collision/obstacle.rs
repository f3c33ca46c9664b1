//! Robot-versus-obstacle detection.

use tracing::{debug, trace};

use super::cadence::{DetectorTick, FixedRate};
use super::result::{CollisionResult, ObstaclePair, Severity};
use crate::geometry::Obb;

/// Configuration for the obstacle detector.
#[derive(Debug, Clone)]
pub struct CollisionConfig {
    /// Near-miss distance added to obstacle half-extents. Default: 0.03.
    pub warning_margin: f32,
    /// Detector runs per second. Default: 20.
    pub rate_hz: f64,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            warning_margin: 0.03,
            rate_hz: 20.0,
        }
    }
}

impl CollisionConfig {
    pub fn with_warning_margin(mut self, margin: f32) -> Self {
        self.warning_margin = margin.max(0.0);
        self
    }

    pub fn with_rate_hz(mut self, hz: f64) -> Self {
        self.rate_hz = hz;
        self
    }
}

/// A named world OBB. `obb` is `None` when the owner has no valid geometry
/// this tick.
#[derive(Debug, Clone, Copy)]
pub struct NamedObb<'a> {
    pub name: &'a str,
    pub obb: Option<Obb>,
}

impl<'a> NamedObb<'a> {
    pub fn new(name: &'a str, obb: Option<Obb>) -> Self {
        Self { name, obb }
    }
}

/// Test every body part against every obstacle and classify the result.
///
/// Entries without geometry are skipped. With no obstacles the result is the
/// all-clear.
pub fn detect_obstacle_collisions(
    body_parts: &[NamedObb<'_>],
    obstacles: &[NamedObb<'_>],
    warning_margin: f32,
) -> CollisionResult {
    let mut result = CollisionResult::clear();
    if obstacles.is_empty() {
        return result;
    }

    // Obstacles are expanded once per run rather than once per pair.
    let obstacles: Vec<(&str, Obb, Obb)> = obstacles
        .iter()
        .filter_map(|o| match o.obb {
            Some(obb) => Some((o.name, obb, obb.expanded(warning_margin))),
            None => {
                trace!(obstacle = o.name, "obstacle has no world geometry, skipping");
                None
            }
        })
        .collect();

    for part in body_parts {
        let Some(part_obb) = part.obb else {
            trace!(body_part = part.name, "body part has no world geometry, skipping");
            continue;
        };

        for (id, obb, expanded) in &obstacles {
            if part_obb.intersects(obb) {
                result.colliding_parts.insert(part.name.to_string());
                result.colliding_obstacles.insert(id.to_string());
                push_unique(&mut result.colliding_pairs, part.name, id);
            } else if part_obb.intersects(expanded) {
                result.warning_parts.insert(part.name.to_string());
                result.warning_obstacles.insert(id.to_string());
                push_unique(&mut result.warning_pairs, part.name, id);
            }
        }
    }

    result.severity = if !result.colliding_pairs.is_empty() {
        Severity::Collision
    } else if !result.warning_pairs.is_empty() {
        Severity::Warning
    } else {
        Severity::None
    };
    result
}

fn push_unique(pairs: &mut Vec<ObstaclePair>, body_part: &str, obstacle_id: &str) {
    let exists = pairs
        .iter()
        .any(|p| p.body_part == body_part && p.obstacle_id == obstacle_id);
    if !exists {
        pairs.push(ObstaclePair::new(body_part, obstacle_id));
    }
}

/// Rate-limited obstacle detector holding the latest result.
#[derive(Debug, Clone)]
pub struct ObstacleCollisionDetector {
    config: CollisionConfig,
    rate: FixedRate,
    result: CollisionResult,
}

impl ObstacleCollisionDetector {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            rate: FixedRate::new(config.rate_hz),
            config,
            result: CollisionResult::clear(),
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// The latest result. Stays current between runs.
    pub fn result(&self) -> &CollisionResult {
        &self.result
    }

    /// Advance the rate gate by `dt` and run if it is due.
    pub fn update(
        &mut self,
        dt: f64,
        body_parts: &[NamedObb<'_>],
        obstacles: &[NamedObb<'_>],
    ) -> DetectorTick {
        if !self.rate.tick(dt) {
            return DetectorTick::Skipped;
        }
        self.detect_now(body_parts, obstacles)
    }

    /// Run immediately, ignoring the rate gate.
    pub fn detect_now(
        &mut self,
        body_parts: &[NamedObb<'_>],
        obstacles: &[NamedObb<'_>],
    ) -> DetectorTick {
        let next = detect_obstacle_collisions(body_parts, obstacles, self.config.warning_margin);
        if next.severity != self.result.severity {
            debug!(from = %self.result.severity, to = %next.severity, "obstacle severity changed");
        }
        if next == self.result {
            return DetectorTick::Unchanged;
        }
        self.result = next;
        DetectorTick::Changed
    }

    /// Make the next [`ObstacleCollisionDetector::update`] run regardless of
    /// accumulated time.
    pub fn prime(&mut self) {
        self.rate.prime();
    }

    /// Drop the result and accumulated time.
    pub fn reset(&mut self) {
        self.rate.reset();
        self.result = CollisionResult::clear();
    }
}

impl Default for ObstacleCollisionDetector {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn cube(center: Vec3, half: f32) -> Option<Obb> {
        Some(Obb::new(center, [Vec3::X, Vec3::Y, Vec3::Z], Vec3::splat(half)))
    }

    #[test]
    fn test_no_obstacles_all_clear() {
        let parts = [NamedObb::new("link1", cube(Vec3::ZERO, 0.5))];
        let result = detect_obstacle_collisions(&parts, &[], 0.03);
        assert_eq!(result, CollisionResult::clear());
    }

    #[test]
    fn test_collision_and_warning() {
        let parts = [
            NamedObb::new("link1", cube(Vec3::ZERO, 0.5)),
            NamedObb::new("link2", cube(Vec3::new(0.0, 3.0, 0.0), 0.5)),
        ];
        let obstacles = [
            // Overlaps link1.
            NamedObb::new("obstacle-1", cube(Vec3::new(0.9, 0.0, 0.0), 0.5)),
            // 0.02 gap from link2: inside the margin.
            NamedObb::new("obstacle-2", cube(Vec3::new(1.02, 3.0, 0.0), 0.5)),
        ];
        let result = detect_obstacle_collisions(&parts, &obstacles, 0.03);
        assert_eq!(result.severity, Severity::Collision);
        assert_eq!(result.colliding_pairs, vec![ObstaclePair::new("link1", "obstacle-1")]);
        assert_eq!(result.warning_pairs, vec![ObstaclePair::new("link2", "obstacle-2")]);
        assert_eq!(result.tint_for("link1"), Severity::Collision);
        assert_eq!(result.tint_for("link2"), Severity::Warning);
        assert_eq!(result.obstacle_tint("obstacle-2"), Severity::Warning);
    }

    #[test]
    fn test_warning_only() {
        let parts = [NamedObb::new("link1", cube(Vec3::ZERO, 0.5))];
        let obstacles = [NamedObb::new("obstacle-1", cube(Vec3::new(1.02, 0.0, 0.0), 0.5))];
        let result = detect_obstacle_collisions(&parts, &obstacles, 0.03);
        assert_eq!(result.severity, Severity::Warning);

        let far = [NamedObb::new("obstacle-1", cube(Vec3::new(1.2, 0.0, 0.0), 0.5))];
        assert!(detect_obstacle_collisions(&parts, &far, 0.03).is_clear());
    }

    #[test]
    fn test_missing_geometry_skipped() {
        let parts = [
            NamedObb::new("broken", None),
            NamedObb::new("link1", cube(Vec3::ZERO, 0.5)),
        ];
        let obstacles = [
            NamedObb::new("obstacle-1", cube(Vec3::ZERO, 0.5)),
            NamedObb::new("obstacle-2", None),
        ];
        let result = detect_obstacle_collisions(&parts, &obstacles, 0.03);
        assert_eq!(result.colliding_pairs, vec![ObstaclePair::new("link1", "obstacle-1")]);
        assert!(!result.colliding_parts.contains("broken"));
    }

    #[test]
    fn test_detector_rate_limit_and_change() {
        let mut detector = ObstacleCollisionDetector::default();
        let parts = [NamedObb::new("link1", cube(Vec3::ZERO, 0.5))];
        let obstacles = [NamedObb::new("obstacle-1", cube(Vec3::ZERO, 0.5))];

        assert_eq!(detector.update(0.01, &parts, &obstacles), DetectorTick::Skipped);
        assert!(detector.result().is_clear());

        assert_eq!(detector.update(0.05, &parts, &obstacles), DetectorTick::Changed);
        assert_eq!(detector.result().severity, Severity::Collision);

        assert_eq!(detector.update(0.05, &parts, &obstacles), DetectorTick::Unchanged);

        detector.prime();
        assert_eq!(detector.update(0.0, &parts, &[]), DetectorTick::Changed);
        assert!(detector.result().is_clear());
    }
}
