//! Controllable joint state.

use glam::Vec3;

/// Default jog step: 0.5 degrees.
pub const DEFAULT_JOINT_STEP_RAD: f32 = 0.5 * std::f32::consts::PI / 180.0;

/// State of one revolute joint exposed for control.
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    /// Joint name as it appears in the rig.
    pub name: String,
    /// Display label, `J{n} {name}`.
    pub label: String,
    /// Unit rotation axis in the joint frame.
    pub axis: Vec3,
    /// Current angle in radians.
    pub angle_rad: f32,
    /// Angle restored by a pose reset.
    pub home_angle_rad: f32,
    pub min_rad: Option<f32>,
    pub max_rad: Option<f32>,
    /// Amount moved by one [`JointState::nudge`].
    pub step_rad: f32,
}

impl JointState {
    /// Create a joint at its home angle of zero. `index` is the 0-based
    /// position in the control list and feeds the label.
    pub fn new(name: impl Into<String>, index: usize, axis: Vec3) -> Self {
        let name = name.into();
        Self {
            label: format!("J{} {}", index + 1, name),
            name,
            axis: axis.normalize_or(Vec3::Z),
            angle_rad: 0.0,
            home_angle_rad: 0.0,
            min_rad: None,
            max_rad: None,
            step_rad: DEFAULT_JOINT_STEP_RAD,
        }
    }

    pub fn with_limits(mut self, min_rad: Option<f32>, max_rad: Option<f32>) -> Self {
        self.min_rad = min_rad;
        self.max_rad = max_rad;
        self.angle_rad = self.clamp(self.angle_rad);
        self
    }

    pub fn with_home(mut self, home_rad: f32) -> Self {
        self.home_angle_rad = self.clamp(home_rad);
        self.angle_rad = self.home_angle_rad;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Clamp `angle` into the joint limits. Either bound may be absent.
    pub fn clamp(&self, angle: f32) -> f32 {
        let mut angle = angle;
        if let Some(min) = self.min_rad {
            angle = angle.max(min);
        }
        if let Some(max) = self.max_rad {
            angle = angle.min(max);
        }
        angle
    }

    /// Set the angle, clamped to the limits. Returns the applied angle.
    pub fn set_angle(&mut self, angle_rad: f32) -> f32 {
        if angle_rad.is_finite() {
            self.angle_rad = self.clamp(angle_rad);
        }
        self.angle_rad
    }

    /// Move by one step in the sign of `direction`.
    pub fn nudge(&mut self, direction: f32) -> f32 {
        if direction == 0.0 {
            return self.angle_rad;
        }
        self.set_angle(self.angle_rad + direction.signum() * self.step_rad)
    }

    pub fn reset(&mut self) {
        self.angle_rad = self.home_angle_rad;
    }

    pub fn angle_deg(&self) -> f32 {
        self.angle_rad.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_and_defaults() {
        let joint = JointState::new("shoulder", 1, Vec3::Y);
        assert_eq!(joint.label, "J2 shoulder");
        assert_eq!(joint.angle_rad, 0.0);
        assert!((joint.step_rad - 0.5f32.to_radians()).abs() < 1e-7);
    }

    #[test]
    fn test_set_angle_clamps() {
        let mut joint =
            JointState::new("elbow", 0, Vec3::X).with_limits(Some(-1.0), Some(1.0));
        assert_eq!(joint.set_angle(2.0), 1.0);
        assert_eq!(joint.set_angle(-3.0), -1.0);
        assert_eq!(joint.set_angle(0.25), 0.25);
        // Non-finite input is ignored.
        assert_eq!(joint.set_angle(f32::NAN), 0.25);
    }

    #[test]
    fn test_one_sided_limit() {
        let mut joint = JointState::new("wrist", 0, Vec3::Z).with_limits(None, Some(0.5));
        assert_eq!(joint.set_angle(-10.0), -10.0);
        assert_eq!(joint.set_angle(10.0), 0.5);
    }

    #[test]
    fn test_nudge_and_reset() {
        let mut joint = JointState::new("tip", 0, Vec3::Z).with_home(0.1);
        joint.nudge(1.0);
        assert!((joint.angle_rad - (0.1 + DEFAULT_JOINT_STEP_RAD)).abs() < 1e-6);
        joint.nudge(-1.0);
        joint.nudge(-1.0);
        assert!((joint.angle_rad - (0.1 - DEFAULT_JOINT_STEP_RAD)).abs() < 1e-6);
        joint.reset();
        assert_eq!(joint.angle_rad, 0.1);
    }
}
