//! Geometry primitives shared by the collision detectors.

mod aabb;
mod distance;
mod obb;

pub use aabb::Aabb;
pub use distance::{point_segment_distance_squared, segment_segment_distance_squared, Segment};
pub use obb::{Obb, SAT_EPSILON};
