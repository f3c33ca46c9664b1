//! URDF loader
//!
//! Builds a [`RobotRig`] from a URDF document. Only the kinematic tree and
//! primitive collision extents are read; mesh geometry is skipped.

use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec3};
use std::path::Path;
use tracing::{info, warn};

use super::rig::{BodyPart, RigBuilder, RigJoint, RobotRig};

/// URDF loader utility.
pub struct UrdfLoader;

impl UrdfLoader {
    /// Load a URDF file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RobotRig> {
        let path = path.as_ref();
        info!("Loading URDF from {:?}", path);

        let robot = urdf_rs::read_file(path)
            .with_context(|| format!("Failed to load URDF from {:?}", path))?;
        Self::build(&robot).with_context(|| format!("Invalid robot rig in {:?}", path))
    }

    /// Parse a URDF document held in memory.
    pub fn load_from_str(xml: &str) -> Result<RobotRig> {
        let robot = urdf_rs::read_from_string(xml).context("Failed to parse URDF")?;
        Self::build(&robot).context("Invalid robot rig")
    }

    fn build(robot: &urdf_rs::Robot) -> Result<RobotRig> {
        let mut builder = RigBuilder::new(robot.name.clone());
        let mut part_count = 0usize;

        for link in &robot.links {
            // Collision geometry wins; visuals are the fallback.
            let shapes: Vec<(Option<&String>, &urdf_rs::Pose, &urdf_rs::Geometry)> =
                if link.collision.is_empty() {
                    link.visual
                        .iter()
                        .map(|v| (v.name.as_ref(), &v.origin, &v.geometry))
                        .collect()
                } else {
                    link.collision
                        .iter()
                        .map(|c| (c.name.as_ref(), &c.origin, &c.geometry))
                        .collect()
                };

            let multiple = shapes.len() > 1;
            for (k, (name, origin, geometry)) in shapes.into_iter().enumerate() {
                let Some(half) = Self::half_extents(geometry) else {
                    warn!(link = %link.name, "skipping mesh geometry");
                    continue;
                };
                let name = match name {
                    Some(name) if !name.is_empty() => name.clone(),
                    _ if multiple => format!("{}_{}", link.name, k),
                    _ => link.name.clone(),
                };
                builder = builder.body_part(BodyPart::new(
                    name,
                    link.name.clone(),
                    Self::pose_to_mat4(origin),
                    -half,
                    half,
                ));
                part_count += 1;
            }
        }

        for joint in &robot.joints {
            let origin = Self::pose_to_mat4(&joint.origin);
            let axis = Vec3::new(
                joint.axis.xyz[0] as f32,
                joint.axis.xyz[1] as f32,
                joint.axis.xyz[2] as f32,
            );
            let parent = joint.parent.link.clone();
            let child = joint.child.link.clone();

            let rig_joint = match joint.joint_type {
                urdf_rs::JointType::Revolute => {
                    RigJoint::revolute(joint.name.clone(), parent, child, origin, axis)
                        .with_limits(
                            Some(joint.limit.lower as f32),
                            Some(joint.limit.upper as f32),
                        )
                }
                urdf_rs::JointType::Continuous => {
                    RigJoint::revolute(joint.name.clone(), parent, child, origin, axis)
                }
                urdf_rs::JointType::Fixed => {
                    RigJoint::fixed(joint.name.clone(), parent, child, origin)
                }
                _ => {
                    warn!(
                        joint = %joint.name,
                        "unsupported joint type {:?}, treating as fixed",
                        joint.joint_type
                    );
                    RigJoint::fixed(joint.name.clone(), parent, child, origin)
                }
            };
            builder = builder.joint(rig_joint);
        }

        let rig = builder.build()?;
        info!(
            "Loaded rig {:?}: {} body parts, {} joints ({} in pivot chain)",
            rig.name(),
            part_count,
            rig.joints().len(),
            rig.chain().len()
        );
        Ok(rig)
    }

    /// Local half-extents of a primitive. `None` for meshes.
    fn half_extents(geometry: &urdf_rs::Geometry) -> Option<Vec3> {
        let half = match geometry {
            urdf_rs::Geometry::Box { size } => {
                Vec3::new(size[0] as f32, size[1] as f32, size[2] as f32) * 0.5
            }
            // URDF cylinders and capsules run along local Z.
            urdf_rs::Geometry::Cylinder { radius, length } => {
                Vec3::new(*radius as f32, *radius as f32, *length as f32 * 0.5)
            }
            urdf_rs::Geometry::Capsule { radius, length } => {
                let r = *radius as f32;
                Vec3::new(r, r, *length as f32 * 0.5 + r)
            }
            urdf_rs::Geometry::Sphere { radius } => Vec3::splat(*radius as f32),
            urdf_rs::Geometry::Mesh { .. } => return None,
        };
        Some(half.abs())
    }

    fn pose_to_mat4(pose: &urdf_rs::Pose) -> Mat4 {
        let translation = Vec3::new(pose.xyz[0] as f32, pose.xyz[1] as f32, pose.xyz[2] as f32);

        // URDF RPY is fixed-axis roll, pitch, yaw: R = Rz(yaw) * Ry(pitch) * Rx(roll).
        let roll = pose.rpy[0] as f32;
        let pitch = pose.rpy[1] as f32;
        let yaw = pose.rpy[2] as f32;

        let rotation = Quat::from_euler(glam::EulerRot::ZYX, yaw, pitch, roll);

        Mat4::from_rotation_translation(rotation, translation)
    }
}
