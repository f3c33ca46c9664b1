//! Robot description and runtime pose.

pub mod joint;
#[cfg(feature = "urdf")]
pub mod loader;
pub mod model;
pub mod rig;

pub use joint::{JointState, DEFAULT_JOINT_STEP_RAD};
#[cfg(feature = "urdf")]
pub use loader::UrdfLoader;
pub use model::Robot;
pub use rig::{BodyPart, JointKind, RigBuilder, RigError, RigJoint, RobotRig};
