//! Robot runtime: joint state, base pose and forward kinematics.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use tracing::trace;

use super::joint::{JointState, DEFAULT_JOINT_STEP_RAD};
use super::rig::RobotRig;
use crate::animation::AnimTarget;
use crate::collision::{BaseProxy, NamedObb};
use crate::geometry::{Aabb, Obb};
use crate::playback::PoseSink;

/// A posed robot built from a [`RobotRig`].
///
/// World transforms are refreshed eagerly whenever the pose changes, so every
/// reader sees the latest write.
#[derive(Debug, Clone)]
pub struct Robot {
    rig: RobotRig,
    joints: Vec<JointState>,
    /// For each rig joint, its index in `joints` when it is controllable.
    controls: Vec<Option<usize>>,
    position: Vec3,
    yaw_rad: f32,
    joint_frames: Vec<Mat4>,
    link_transforms: HashMap<String, Mat4>,
}

impl Robot {
    pub fn new(rig: RobotRig) -> Self {
        let mut joints = Vec::new();
        let mut controls = Vec::with_capacity(rig.joints().len());
        for joint in rig.joints() {
            if joint.is_movable() {
                let state = JointState::new(joint.name.clone(), joints.len(), joint.axis)
                    .with_limits(joint.min_rad, joint.max_rad)
                    .with_home(joint.home_rad);
                controls.push(Some(joints.len()));
                joints.push(state);
            } else {
                controls.push(None);
            }
        }

        let mut robot = Self {
            joint_frames: vec![Mat4::IDENTITY; rig.joints().len()],
            rig,
            joints,
            controls,
            position: Vec3::ZERO,
            yaw_rad: 0.0,
            link_transforms: HashMap::new(),
        };
        robot.update_transforms();
        robot
    }

    pub fn rig(&self) -> &RobotRig {
        &self.rig
    }

    /// Controllable joints in parent-before-child order.
    pub fn joints(&self) -> &[JointState] {
        &self.joints
    }

    pub fn joint(&self, name: &str) -> Option<&JointState> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn yaw_rad(&self) -> f32 {
        self.yaw_rad
    }

    /// Set a joint angle, clamped to its limits. Returns the applied angle,
    /// or `None` for an unknown joint.
    pub fn set_joint_angle(&mut self, name: &str, angle_rad: f32) -> Option<f32> {
        let joint = self.joints.iter_mut().find(|j| j.name == name)?;
        let applied = joint.set_angle(angle_rad);
        self.update_transforms();
        Some(applied)
    }

    /// Move a joint by one jog step.
    pub fn nudge_joint(&mut self, name: &str, direction: f32) -> Option<f32> {
        let joint = self.joints.iter_mut().find(|j| j.name == name)?;
        let applied = joint.nudge(direction);
        self.update_transforms();
        Some(applied)
    }

    /// Replace a joint's rotation axis.
    pub fn set_joint_axis(&mut self, name: &str, axis: Vec3) -> bool {
        let Some(joint) = self.joints.iter_mut().find(|j| j.name == name) else {
            return false;
        };
        joint.axis = axis.normalize_or(joint.axis);
        self.update_transforms();
        true
    }

    /// Move the robot on the ground plane. Height is kept.
    pub fn set_position_xz(&mut self, x: f32, z: f32) {
        self.position = Vec3::new(x, self.position.y, z);
        self.update_transforms();
    }

    pub fn set_yaw(&mut self, yaw_rad: f32) {
        if yaw_rad.is_finite() {
            self.yaw_rad = yaw_rad;
            self.update_transforms();
        }
    }

    pub fn nudge_yaw(&mut self, direction: f32) {
        if direction != 0.0 {
            self.set_yaw(self.yaw_rad + direction.signum() * DEFAULT_JOINT_STEP_RAD);
        }
    }

    pub fn reset_position(&mut self) {
        self.position = Vec3::ZERO;
        self.update_transforms();
    }

    /// Return to the origin, zero yaw and every joint's home angle.
    pub fn reset_pose(&mut self) {
        self.position = Vec3::ZERO;
        self.yaw_rad = 0.0;
        for joint in &mut self.joints {
            joint.reset();
        }
        self.update_transforms();
    }

    /// World transform of the robot root.
    pub fn root_transform(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_rotation_y(self.yaw_rad)
    }

    /// World transform of a link frame.
    pub fn link_transform(&self, link: &str) -> Option<Mat4> {
        self.link_transforms.get(link).copied()
    }

    /// World OBB of every body part. Degenerate parts map to `None`.
    pub fn body_part_obbs(&self) -> Vec<NamedObb<'_>> {
        self.rig
            .body_parts()
            .iter()
            .map(|part| {
                let obb = self.link_transforms.get(&part.link).and_then(|link| {
                    Obb::from_world_transform(
                        part.local_min,
                        part.local_max,
                        *link * part.local_transform,
                    )
                });
                NamedObb::new(&part.name, obb)
            })
            .collect()
    }

    /// World positions of the pivot chain joints.
    pub fn pivot_positions(&self) -> Vec<Vec3> {
        self.rig
            .chain()
            .iter()
            .map(|&i| self.joint_frames[i].w_axis.truncate())
            .collect()
    }

    /// Base center and the world boxes of the base's own parts.
    pub fn base_proxy(&self) -> Option<BaseProxy> {
        let link = self.rig.base_link()?;
        let center = self.link_transforms.get(link)?.w_axis.truncate();
        let parts = self
            .rig
            .base_parts()
            .iter()
            .filter_map(|&i| {
                let part = &self.rig.body_parts()[i];
                let link = self.link_transforms.get(&part.link)?;
                Some(
                    Aabb::new(part.local_min, part.local_max)
                        .transform(*link * part.local_transform),
                )
            })
            .collect();
        Some(BaseProxy { center, parts })
    }

    fn update_transforms(&mut self) {
        let root = self.root_transform();
        self.link_transforms.clear();
        self.link_transforms
            .insert(self.rig.root_link().to_string(), root);

        for (i, joint) in self.rig.joints().iter().enumerate() {
            // Joints are parent-first, so the parent frame is always ready.
            let parent = self
                .link_transforms
                .get(&joint.parent_link)
                .copied()
                .unwrap_or(root);
            let frame = parent * joint.origin;
            self.joint_frames[i] = frame;

            let motion = match self.controls[i] {
                Some(c) => {
                    let state = &self.joints[c];
                    Mat4::from_quat(Quat::from_axis_angle(state.axis, state.angle_rad))
                }
                None => Mat4::IDENTITY,
            };
            self.link_transforms
                .insert(joint.child_link.clone(), frame * motion);
        }
    }
}

impl PoseSink for Robot {
    fn apply_target(&mut self, target: &AnimTarget, degrees: f32) {
        match target {
            AnimTarget::BaseYaw => self.set_yaw(degrees.to_radians()),
            AnimTarget::Joint(name) => {
                if self.set_joint_angle(name, degrees.to_radians()).is_none() {
                    trace!(joint = %name, "animation targets unknown joint, ignoring");
                }
            }
        }
    }

    fn reset_targets(&mut self) {
        self.yaw_rad = 0.0;
        for joint in &mut self.joints {
            joint.set_angle(0.0);
        }
        self.update_transforms();
    }
}
