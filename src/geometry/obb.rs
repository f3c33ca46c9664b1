//! Oriented bounding boxes and the SAT overlap test.

use glam::{Mat4, Vec3, Vec4};

use super::Aabb;

/// Padding added to every `|R[i][j]|` term of the SAT test.
///
/// Without it, near-parallel edges produce near-zero cross-product axes whose
/// rounding noise reports boxes as separated when they are not.
pub const SAT_EPSILON: f32 = 1e-6;

/// Oriented bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    /// Box center.
    pub center: Vec3,
    /// Orthonormal box axes.
    pub axes: [Vec3; 3],
    /// Non-negative half-extents along each axis.
    pub half_extents: Vec3,
}

impl Obb {
    /// Create an OBB from its components.
    pub fn new(center: Vec3, axes: [Vec3; 3], half_extents: Vec3) -> Self {
        Self {
            center,
            axes,
            half_extents,
        }
    }

    /// Create an axis-aligned OBB. Returns `None` for an empty box.
    pub fn from_aabb(aabb: &Aabb) -> Option<Self> {
        if aabb.is_empty() {
            return None;
        }
        Some(Self {
            center: aabb.center(),
            axes: [Vec3::X, Vec3::Y, Vec3::Z],
            half_extents: aabb.size() * 0.5,
        })
    }

    /// Build a world-space OBB from a local box `[local_min, local_max]` and a
    /// world matrix.
    ///
    /// The matrix columns give the box axes; their lengths scale the local
    /// half-extents so non-uniform scale is kept. Returns `None` when a column
    /// is zero-length or non-finite.
    pub fn from_world_transform(local_min: Vec3, local_max: Vec3, world: Mat4) -> Option<Self> {
        let columns = [
            world.x_axis.truncate(),
            world.y_axis.truncate(),
            world.z_axis.truncate(),
        ];

        let mut axes = [Vec3::ZERO; 3];
        let mut scale = Vec3::ZERO;
        for (i, column) in columns.iter().enumerate() {
            let len = column.length();
            if !len.is_finite() || len <= 0.0 {
                return None;
            }
            axes[i] = *column / len;
            scale[i] = len;
        }

        let center = world.transform_point3((local_min + local_max) * 0.5);
        if !center.is_finite() {
            return None;
        }
        let half_extents = ((local_max - local_min) * 0.5).abs() * scale;

        Some(Self {
            center,
            axes,
            half_extents,
        })
    }

    /// A copy with every half-extent grown by `margin`.
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            half_extents: self.half_extents + Vec3::splat(margin),
            ..*self
        }
    }

    /// SAT overlap test (Gottschalk / Eberly) over the 15 candidate axes.
    ///
    /// Touching boxes count as intersecting.
    pub fn intersects(&self, other: &Obb) -> bool {
        let ea = self.half_extents.to_array();
        let eb = other.half_extents.to_array();

        // Rotation of `other` expressed in `self`'s frame.
        let mut r = [[0.0f32; 3]; 3];
        let mut abs_r = [[0.0f32; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                r[i][j] = self.axes[i].dot(other.axes[j]);
                abs_r[i][j] = r[i][j].abs() + SAT_EPSILON;
            }
        }

        let d = other.center - self.center;
        let t = [d.dot(self.axes[0]), d.dot(self.axes[1]), d.dot(self.axes[2])];

        // Axes of A
        for i in 0..3 {
            let ra = ea[i];
            let rb = eb[0] * abs_r[i][0] + eb[1] * abs_r[i][1] + eb[2] * abs_r[i][2];
            if t[i].abs() > ra + rb {
                return false;
            }
        }

        // Axes of B
        for j in 0..3 {
            let ra = ea[0] * abs_r[0][j] + ea[1] * abs_r[1][j] + ea[2] * abs_r[2][j];
            let rb = eb[j];
            let tj = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if tj.abs() > ra + rb {
                return false;
            }
        }

        // A_i x B_j
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = ea[i1] * abs_r[i2][j] + ea[i2] * abs_r[i1][j];
                let rb = eb[j1] * abs_r[i][j2] + eb[j2] * abs_r[i][j1];
                let tl = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if tl.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }

    /// The 8 world-space corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let [u0, u1, u2] = self.axes;
        let h = self.half_extents;
        let mut out = [Vec3::ZERO; 8];
        for (k, corner) in out.iter_mut().enumerate() {
            let sx = if k & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if k & 2 == 0 { -1.0 } else { 1.0 };
            let sz = if k & 4 == 0 { -1.0 } else { 1.0 };
            *corner = self.center + u0 * (sx * h.x) + u1 * (sy * h.y) + u2 * (sz * h.z);
        }
        out
    }

    /// World matrix mapping the unit cube `[-0.5, 0.5]^3` onto this box.
    ///
    /// Handy for drawing debug wire boxes.
    pub fn to_matrix(&self) -> Mat4 {
        let size = self.half_extents * 2.0;
        Mat4::from_cols(
            (self.axes[0] * size.x).extend(0.0),
            (self.axes[1] * size.y).extend(0.0),
            (self.axes[2] * size.z).extend(0.0),
            Vec4::from((self.center, 1.0)),
        )
    }

    /// The world AABB that encloses this box.
    pub fn aabb(&self) -> Aabb {
        let extent = self.axes[0].abs() * self.half_extents.x
            + self.axes[1].abs() * self.half_extents.y
            + self.axes[2].abs() * self.half_extents.z;
        Aabb::new(self.center - extent, self.center + extent)
    }
}
