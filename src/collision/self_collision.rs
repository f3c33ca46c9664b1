//! Robot self-collision via a capsule proxy.
//!
//! Each link is the segment between two consecutive joint pivots with a
//! uniform thickness. Link pairs closer than the thickness collide. The base is
//! a sphere around its pivot, tested against links far enough down the chain.

use glam::Vec3;
use tracing::debug;

use super::cadence::{DetectorTick, FixedRate};
use super::result::{SelfCollisionPair, SelfCollisionResult};
use crate::geometry::{point_segment_distance_squared, segment_segment_distance_squared, Aabb};

/// Configuration for the self-collision detector.
#[derive(Debug, Clone)]
pub struct SelfCollisionConfig {
    /// Link diameter in world units. Default: 0.08.
    pub link_thickness: f32,
    /// Pairs with `|i - j| <= min_index_gap` are never tested. Default: 2.
    pub min_index_gap: usize,
    /// Added to the base radius. Default: 0.02.
    pub base_padding: f32,
    /// Links below this index are never tested against the base. Default: 3.
    pub base_min_link_index: usize,
    /// Base radius used when the base has no usable geometry. Default: 0.22.
    pub default_base_radius: f32,
    /// Detector runs per second. Default: 20.
    pub rate_hz: f64,
}

impl Default for SelfCollisionConfig {
    fn default() -> Self {
        Self {
            link_thickness: 0.08,
            min_index_gap: 2,
            base_padding: 0.02,
            base_min_link_index: 3,
            default_base_radius: 0.22,
            rate_hz: 20.0,
        }
    }
}

impl SelfCollisionConfig {
    pub fn with_link_thickness(mut self, thickness: f32) -> Self {
        self.link_thickness = thickness.max(0.0);
        self
    }

    pub fn with_min_index_gap(mut self, gap: usize) -> Self {
        self.min_index_gap = gap;
        self
    }

    pub fn with_base_padding(mut self, padding: f32) -> Self {
        self.base_padding = padding;
        self
    }

    pub fn with_base_min_link_index(mut self, index: usize) -> Self {
        self.base_min_link_index = index;
        self
    }

    pub fn with_rate_hz(mut self, hz: f64) -> Self {
        self.rate_hz = hz;
        self
    }
}

/// World-space description of the robot base for the sphere proxy.
#[derive(Debug, Clone, Default)]
pub struct BaseProxy {
    /// Base pivot in world space.
    pub center: Vec3,
    /// World AABBs of the body parts that belong to the base itself.
    pub parts: Vec<Aabb>,
}

/// Bounding radius of the base: half the largest side of the merged part
/// boxes, or `fallback` when that is empty or degenerate.
pub fn base_radius_from_parts(parts: &[Aabb], fallback: f32) -> f32 {
    let merged = parts.iter().fold(Aabb::empty(), |acc, p| acc.merge(p));
    if merged.is_empty() {
        return fallback;
    }
    let r = 0.5 * merged.size().max_element();
    if r.is_finite() && r > 0.0 {
        r
    } else {
        fallback
    }
}

/// Find link pairs and link-base pairs within contact distance.
///
/// `pivots` holds the N+1 chain pivots defining N links. `base` is the base
/// center and its padded radius. Link-base pairs come first in the output.
pub fn detect_self_collisions(
    pivots: &[Vec3],
    base: Option<(Vec3, f32)>,
    config: &SelfCollisionConfig,
) -> SelfCollisionResult {
    let mut pairs = Vec::new();
    if pivots.len() < 2 {
        return SelfCollisionResult { pairs };
    }

    let link_count = pivots.len() - 1;
    let radius = config.link_thickness * 0.5;

    if let Some((center, base_radius)) = base {
        let threshold = base_radius + radius;
        let threshold_sq = threshold * threshold;
        for i in config.base_min_link_index..link_count {
            let d2 = point_segment_distance_squared(center, pivots[i], pivots[i + 1]);
            if d2 <= threshold_sq {
                pairs.push(SelfCollisionPair::with_base(i));
            }
        }
    }

    let radius_sq = radius * radius;
    for i in 0..link_count {
        for j in (i + 1)..link_count {
            if j - i <= config.min_index_gap {
                continue;
            }
            let d2 = segment_segment_distance_squared(
                pivots[i],
                pivots[i + 1],
                pivots[j],
                pivots[j + 1],
            );
            if d2 <= radius_sq {
                pairs.push(SelfCollisionPair::links(i, j));
            }
        }
    }

    SelfCollisionResult { pairs }
}

/// Rate-limited self-collision detector holding the latest result.
#[derive(Debug, Clone)]
pub struct SelfCollisionDetector {
    config: SelfCollisionConfig,
    rate: FixedRate,
    base_radius: Option<f32>,
    result: SelfCollisionResult,
    signature: String,
}

impl SelfCollisionDetector {
    pub fn new(config: SelfCollisionConfig) -> Self {
        Self {
            rate: FixedRate::new(config.rate_hz),
            config,
            base_radius: None,
            result: SelfCollisionResult::default(),
            signature: String::new(),
        }
    }

    pub fn config(&self) -> &SelfCollisionConfig {
        &self.config
    }

    /// The latest result. Stays current between runs.
    pub fn result(&self) -> &SelfCollisionResult {
        &self.result
    }

    /// Padded base radius, once a base proxy has been seen.
    pub fn base_radius(&self) -> Option<f32> {
        self.base_radius
    }

    /// Advance the rate gate by `dt` and run if it is due.
    pub fn update(&mut self, dt: f64, pivots: &[Vec3], base: Option<&BaseProxy>) -> DetectorTick {
        if !self.rate.tick(dt) {
            return DetectorTick::Skipped;
        }
        self.detect_now(pivots, base)
    }

    /// Run immediately, ignoring the rate gate.
    ///
    /// The result is always replaced. The return value reports whether the
    /// pair signature changed since the previous run.
    pub fn detect_now(&mut self, pivots: &[Vec3], base: Option<&BaseProxy>) -> DetectorTick {
        let base = match base {
            Some(proxy) => {
                let radius = *self.base_radius.get_or_insert_with(|| {
                    let r = base_radius_from_parts(&proxy.parts, self.config.default_base_radius)
                        + self.config.base_padding;
                    debug!(radius = r, "computed base collision radius");
                    r
                });
                Some((proxy.center, radius))
            }
            None => {
                self.base_radius = None;
                None
            }
        };

        self.result = detect_self_collisions(pivots, base, &self.config);
        let signature = self.result.signature();
        if signature == self.signature {
            return DetectorTick::Unchanged;
        }
        debug!(pairs = %signature, "self-collision pairs changed");
        self.signature = signature;
        DetectorTick::Changed
    }

    pub fn prime(&mut self) {
        self.rate.prime();
    }

    /// Drop the result, the cached base radius and accumulated time.
    pub fn reset(&mut self) {
        self.rate.reset();
        self.base_radius = None;
        self.result = SelfCollisionResult::default();
        self.signature.clear();
    }
}

impl Default for SelfCollisionDetector {
    fn default() -> Self {
        Self::new(SelfCollisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A chain that folds back on itself: links 0 and 3 run side by side.
    fn folded_chain(gap: f32) -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.5, 1.0, 0.0),
            Vec3::new(gap, 1.0, 0.0),
            Vec3::new(gap, 0.0, 0.0),
        ]
    }

    #[test]
    fn test_short_chain_is_empty() {
        let config = SelfCollisionConfig::default();
        assert!(detect_self_collisions(&[], None, &config).is_empty());
        assert!(detect_self_collisions(&[Vec3::ZERO], None, &config).is_empty());
    }

    #[test]
    fn test_folded_links_collide() {
        let config = SelfCollisionConfig::default();
        let result = detect_self_collisions(&folded_chain(0.03), None, &config);
        assert_eq!(result.pairs, vec![SelfCollisionPair::links(0, 3)]);
        assert_eq!(result.signature(), "0-3");

        let apart = detect_self_collisions(&folded_chain(0.2), None, &config);
        assert!(apart.is_empty());
    }

    #[test]
    fn test_adjacent_links_ignored() {
        // Links 0 and 2 overlap but are within the index gap.
        let pivots = vec![
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.02, 1.0, 0.0),
            Vec3::new(0.02, 0.0, 0.0),
        ];
        let config = SelfCollisionConfig::default();
        assert!(detect_self_collisions(&pivots, None, &config).is_empty());

        let tight = config.with_min_index_gap(1);
        assert_eq!(
            detect_self_collisions(&pivots, None, &tight).pairs,
            vec![SelfCollisionPair::links(0, 2)]
        );
    }

    #[test]
    fn test_base_pairs_first_and_gated_by_index() {
        // Links 3 and 4 dip back down past the base center.
        let pivots = vec![
            Vec3::ZERO,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 0.1, 0.0),
            Vec3::new(0.1, 0.1, 0.0),
            Vec3::new(0.1, 0.1, 1.0),
        ];
        let config = SelfCollisionConfig::default();
        let result = detect_self_collisions(&pivots, Some((Vec3::ZERO, 0.24)), &config);
        assert_eq!(result.pairs[0], SelfCollisionPair::with_base(3));
        assert_eq!(result.pairs[1], SelfCollisionPair::with_base(4));
        // Link 0 passes straight through the base but sits below the index gate.
        assert!(!result.pairs.iter().any(|p| p.a_index == 0 && p.involves_base()));
    }

    #[test]
    fn test_base_radius_from_parts() {
        let parts = [
            Aabb::new(Vec3::new(-0.2, 0.0, -0.2), Vec3::new(0.2, 0.1, 0.2)),
            Aabb::new(Vec3::new(-0.1, 0.1, -0.1), Vec3::new(0.1, 0.3, 0.1)),
        ];
        assert!((base_radius_from_parts(&parts, 0.22) - 0.2).abs() < 1e-6);
        assert_eq!(base_radius_from_parts(&[], 0.22), 0.22);
        let point = [Aabb::new(Vec3::ONE, Vec3::ONE)];
        assert_eq!(base_radius_from_parts(&point, 0.22), 0.22);
    }

    #[test]
    fn test_detector_caches_base_radius() {
        let mut detector = SelfCollisionDetector::default();
        let pivots = folded_chain(0.03);
        let proxy = BaseProxy {
            center: Vec3::new(10.0, 0.0, 0.0),
            parts: vec![],
        };

        assert_eq!(detector.detect_now(&pivots, Some(&proxy)), DetectorTick::Changed);
        assert!((detector.base_radius().unwrap() - 0.24).abs() < 1e-6);

        // A bigger base later on does not change the cached radius.
        let bigger = BaseProxy {
            center: proxy.center,
            parts: vec![Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))],
        };
        assert_eq!(detector.detect_now(&pivots, Some(&bigger)), DetectorTick::Unchanged);
        assert!((detector.base_radius().unwrap() - 0.24).abs() < 1e-6);

        // Losing the base drops the cache.
        detector.detect_now(&pivots, None);
        assert!(detector.base_radius().is_none());
        detector.detect_now(&pivots, Some(&bigger));
        assert!((detector.base_radius().unwrap() - 1.02).abs() < 1e-6);
    }

    #[test]
    fn test_detector_rate_limit() {
        let mut detector = SelfCollisionDetector::default();
        let pivots = folded_chain(0.03);
        assert_eq!(detector.update(0.02, &pivots, None), DetectorTick::Skipped);
        assert!(detector.result().is_empty());
        assert_eq!(detector.update(0.04, &pivots, None), DetectorTick::Changed);
        assert_eq!(detector.result().pairs.len(), 1);
    }
}
