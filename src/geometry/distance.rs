//! Closest-point distances between points and line segments.

use glam::Vec3;

/// Below this, a length² or parameter numerator is treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-9;

/// `a*c - b²` at or under this fraction of `a*c` means the segments are
/// parallel. The relative form keeps the test scale-independent in `f32`.
const PARALLEL_EPSILON: f32 = 1e-6;

/// A line segment between two world points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).length()
    }

    /// Squared distance from `point` to this segment.
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        point_segment_distance_squared(point, self.start, self.end)
    }

    /// Squared distance between the closest points of two segments.
    pub fn distance_squared(&self, other: &Segment) -> f32 {
        segment_segment_distance_squared(self.start, self.end, other.start, other.end)
    }
}

/// Squared distance from `p` to segment `a-b`.
///
/// A degenerate segment falls back to the distance to `a`.
pub fn point_segment_distance_squared(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < DEGENERATE_EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Squared distance between segments `p0-p1` and `p2-p3`.
///
/// Solves the two-parameter closest-point system and clamps both parameters
/// onto their segments. Near-parallel segments pin the first parameter to 0
/// and project onto the second segment instead of dividing by ~0.
pub fn segment_segment_distance_squared(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> f32 {
    let u = p1 - p0;
    let v = p3 - p2;
    let w0 = p0 - p2;

    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(w0);
    let e = v.dot(w0);

    if a < DEGENERATE_EPSILON && c < DEGENERATE_EPSILON {
        return p0.distance_squared(p2);
    }
    if a < DEGENERATE_EPSILON {
        return point_segment_distance_squared(p0, p2, p3);
    }
    if c < DEGENERATE_EPSILON {
        return point_segment_distance_squared(p2, p0, p1);
    }

    let denom = a * c - b * b;

    // s = sn / sd on the first segment, t = tn / td on the second.
    let (mut sn, mut sd);
    let (mut tn, mut td);

    if denom <= PARALLEL_EPSILON * a * c {
        sn = 0.0;
        sd = 1.0;
        tn = e;
        td = c;
    } else {
        sd = denom;
        td = denom;
        sn = b * e - c * d;
        tn = a * e - b * d;
        if sn < 0.0 {
            sn = 0.0;
            tn = e;
            td = c;
        } else if sn > sd {
            sn = sd;
            tn = e + b;
            td = c;
        }
    }

    if tn < 0.0 {
        tn = 0.0;
        if -d < 0.0 {
            sn = 0.0;
        } else if -d > a {
            sn = sd;
        } else {
            sn = -d;
            sd = a;
        }
    } else if tn > td {
        tn = td;
        if -d + b < 0.0 {
            sn = 0.0;
        } else if -d + b > a {
            sn = sd;
        } else {
            sn = -d + b;
            sd = a;
        }
    }

    let sc = if sn.abs() < DEGENERATE_EPSILON { 0.0 } else { sn / sd };
    let tc = if tn.abs() < DEGENERATE_EPSILON { 0.0 } else { tn / td };

    (w0 + u * sc - v * tc).length_squared()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_point_segment() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert!((point_segment_distance_squared(Vec3::new(1.0, 1.0, 0.0), a, b) - 1.0).abs() < EPS);
        // Beyond the end clamps onto the endpoint.
        assert!((point_segment_distance_squared(Vec3::new(3.0, 0.0, 0.0), a, b) - 1.0).abs() < EPS);
        assert!((point_segment_distance_squared(Vec3::new(-1.0, 1.0, 0.0), a, b) - 2.0).abs() < EPS);
    }

    #[test]
    fn test_point_degenerate_segment() {
        let p = Vec3::new(0.0, 3.0, 4.0);
        assert!((point_segment_distance_squared(p, Vec3::ZERO, Vec3::ZERO) - 25.0).abs() < EPS);
    }

    #[test]
    fn test_parallel_segments_gap() {
        let d = segment_segment_distance_squared(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        );
        assert!((d - 1.0).abs() < EPS);

        // Overlapping in X, offset in Y by 0.5.
        let d = segment_segment_distance_squared(
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 0.5, 0.0),
            Vec3::new(3.0, 0.5, 0.0),
        );
        assert!((d - 0.25).abs() < EPS);
    }

    #[test]
    fn test_parallel_disjoint_along_axis() {
        // Collinear-direction segments that do not overlap: gap is endpoint to endpoint.
        let d = segment_segment_distance_squared(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(3.0, 1.0, 0.0),
            Vec3::new(4.0, 1.0, 0.0),
        );
        assert!((d - 5.0).abs() < EPS);
    }

    #[test]
    fn test_crossing_segments() {
        let d = segment_segment_distance_squared(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.5),
            Vec3::new(0.0, 1.0, 0.5),
        );
        assert!((d - 0.25).abs() < EPS);
    }

    #[test]
    fn test_skew_clamped_endpoints() {
        // Closest points sit at the segment ends.
        let d = segment_segment_distance_squared(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(2.0, 0.0, 3.0),
        );
        assert!((d - 2.0).abs() < EPS);
    }

    #[test]
    fn test_symmetry_and_degenerate() {
        let s1 = Segment::new(Vec3::new(0.2, 0.1, -0.4), Vec3::new(1.3, 0.8, 0.2));
        let s2 = Segment::new(Vec3::new(-0.5, 1.0, 0.3), Vec3::new(0.7, -0.2, 0.9));
        assert!((s1.distance_squared(&s2) - s2.distance_squared(&s1)).abs() < EPS);

        let point = Segment::new(Vec3::new(0.5, 2.0, 0.0), Vec3::new(0.5, 2.0, 0.0));
        let line = Segment::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        assert!((point.distance_squared(&line) - 4.0).abs() < EPS);
        assert!((line.distance_squared(&point) - 4.0).abs() < EPS);
    }
}
