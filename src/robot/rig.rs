//! Static kinematic description of a robot.
//!
//! A [`RobotRig`] is built and validated once, either by hand through
//! [`RigBuilder`] or from a URDF document. It names every body part, fixes
//! the parent-before-child joint order, the pivot chain used for
//! self-collision and the set of body parts that make up the base.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::{Mat4, Vec3};
use thiserror::Error;

/// Errors raised while validating a rig.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RigError {
    #[error("rig has no links")]
    Empty,
    #[error("duplicate joint name `{0}`")]
    DuplicateJoint(String),
    #[error("duplicate body part name `{0}`")]
    DuplicateBodyPart(String),
    #[error("link `{0}` is the child of more than one joint")]
    MultipleParents(String),
    #[error("rig has no root link")]
    NoRoot,
    #[error("rig has more than one root link: {0:?}")]
    MultipleRoots(Vec<String>),
    #[error("joint `{0}` is not connected to the root link")]
    Disconnected(String),
    #[error("body part `{part}` is attached to unknown link `{link}`")]
    UnknownLink { part: String, link: String },
    #[error("pivot chain names unknown joint `{0}`")]
    UnknownChainJoint(String),
    #[error("base proxy names unknown link `{0}`")]
    UnknownBaseLink(String),
    #[error("base proxy names unknown body part `{0}`")]
    UnknownBasePart(String),
}

/// How a joint moves its child link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    /// Rotates about `axis`, optionally within limits.
    Revolute,
    /// Rigidly attaches the child link.
    Fixed,
}

/// One joint connecting a parent link to a child link.
#[derive(Debug, Clone, PartialEq)]
pub struct RigJoint {
    pub name: String,
    pub parent_link: String,
    pub child_link: String,
    /// Joint frame relative to the parent link frame.
    pub origin: Mat4,
    /// Rotation axis in the joint frame.
    pub axis: Vec3,
    pub kind: JointKind,
    pub min_rad: Option<f32>,
    pub max_rad: Option<f32>,
    pub home_rad: f32,
}

impl RigJoint {
    pub fn revolute(
        name: impl Into<String>,
        parent_link: impl Into<String>,
        child_link: impl Into<String>,
        origin: Mat4,
        axis: Vec3,
    ) -> Self {
        Self {
            name: name.into(),
            parent_link: parent_link.into(),
            child_link: child_link.into(),
            origin,
            axis,
            kind: JointKind::Revolute,
            min_rad: None,
            max_rad: None,
            home_rad: 0.0,
        }
    }

    pub fn fixed(
        name: impl Into<String>,
        parent_link: impl Into<String>,
        child_link: impl Into<String>,
        origin: Mat4,
    ) -> Self {
        Self {
            kind: JointKind::Fixed,
            ..Self::revolute(name, parent_link, child_link, origin, Vec3::Z)
        }
    }

    pub fn with_limits(mut self, min_rad: Option<f32>, max_rad: Option<f32>) -> Self {
        self.min_rad = min_rad;
        self.max_rad = max_rad;
        self
    }

    pub fn with_home(mut self, home_rad: f32) -> Self {
        self.home_rad = home_rad;
        self
    }

    pub fn is_movable(&self) -> bool {
        self.kind == JointKind::Revolute
    }
}

/// A rigid collision box attached to a link.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPart {
    pub name: String,
    pub link: String,
    /// Box frame relative to the link frame.
    pub local_transform: Mat4,
    pub local_min: Vec3,
    pub local_max: Vec3,
}

impl BodyPart {
    pub fn new(
        name: impl Into<String>,
        link: impl Into<String>,
        local_transform: Mat4,
        local_min: Vec3,
        local_max: Vec3,
    ) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            local_transform,
            local_min,
            local_max,
        }
    }

    /// A box of full size `size` centered on the box frame origin.
    pub fn cuboid(
        name: impl Into<String>,
        link: impl Into<String>,
        local_transform: Mat4,
        size: Vec3,
    ) -> Self {
        let half = size.abs() * 0.5;
        Self::new(name, link, local_transform, -half, half)
    }
}

/// Validated kinematic description of a robot.
#[derive(Debug, Clone)]
pub struct RobotRig {
    name: String,
    root_link: String,
    joints: Vec<RigJoint>,
    body_parts: Vec<BodyPart>,
    chain: Vec<usize>,
    base_link: Option<String>,
    base_parts: Vec<usize>,
}

impl RobotRig {
    pub fn builder(name: impl Into<String>) -> RigBuilder {
        RigBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_link(&self) -> &str {
        &self.root_link
    }

    /// Joints in parent-before-child order.
    pub fn joints(&self) -> &[RigJoint] {
        &self.joints
    }

    pub fn body_parts(&self) -> &[BodyPart] {
        &self.body_parts
    }

    /// Indices into [`RobotRig::joints`] whose frames form the pivot chain.
    pub fn chain(&self) -> &[usize] {
        &self.chain
    }

    /// Link whose origin is the base sphere center, if the rig has a base.
    pub fn base_link(&self) -> Option<&str> {
        self.base_link.as_deref()
    }

    /// Indices into [`RobotRig::body_parts`] that belong to the base.
    pub fn base_parts(&self) -> &[usize] {
        &self.base_parts
    }

    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }
}

#[derive(Debug, Clone)]
enum BaseChoice {
    Structural,
    Link {
        link: String,
        parts: Option<Vec<String>>,
    },
    Disabled,
}

/// Builder for [`RobotRig`].
#[derive(Debug, Clone)]
pub struct RigBuilder {
    name: String,
    joints: Vec<RigJoint>,
    body_parts: Vec<BodyPart>,
    chain: Option<Vec<String>>,
    base: BaseChoice,
}

impl RigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            joints: Vec::new(),
            body_parts: Vec::new(),
            chain: None,
            base: BaseChoice::Structural,
        }
    }

    pub fn joint(mut self, joint: RigJoint) -> Self {
        self.joints.push(joint);
        self
    }

    pub fn body_part(mut self, part: BodyPart) -> Self {
        self.body_parts.push(part);
        self
    }

    /// Override the pivot chain. Defaults to every movable joint in
    /// parent-before-child order.
    pub fn chain<I, S>(mut self, joint_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chain = Some(joint_names.into_iter().map(Into::into).collect());
        self
    }

    /// Use `link` as the base center. `parts` names the base's own body
    /// parts; `None` keeps the structural default.
    pub fn base_proxy(mut self, link: impl Into<String>, parts: Option<Vec<String>>) -> Self {
        self.base = BaseChoice::Link {
            link: link.into(),
            parts,
        };
        self
    }

    /// Build a rig without a base proxy.
    pub fn without_base(mut self) -> Self {
        self.base = BaseChoice::Disabled;
        self
    }

    pub fn build(self) -> Result<RobotRig, RigError> {
        let mut joint_names = HashSet::new();
        for joint in &self.joints {
            if !joint_names.insert(joint.name.as_str()) {
                return Err(RigError::DuplicateJoint(joint.name.clone()));
            }
        }
        let mut part_names = HashSet::new();
        for part in &self.body_parts {
            if !part_names.insert(part.name.as_str()) {
                return Err(RigError::DuplicateBodyPart(part.name.clone()));
            }
        }

        let root_link = self.find_root()?;
        let joints = self.order_joints(&root_link)?;

        let mut links: HashSet<&str> = joints.iter().map(|j| j.child_link.as_str()).collect();
        links.insert(root_link.as_str());
        for part in &self.body_parts {
            if !links.contains(part.link.as_str()) {
                return Err(RigError::UnknownLink {
                    part: part.name.clone(),
                    link: part.link.clone(),
                });
            }
        }

        let chain = match &self.chain {
            Some(names) => names
                .iter()
                .map(|name| {
                    joints
                        .iter()
                        .position(|j| &j.name == name)
                        .ok_or_else(|| RigError::UnknownChainJoint(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => joints
                .iter()
                .enumerate()
                .filter(|(_, j)| j.is_movable())
                .map(|(i, _)| i)
                .collect(),
        };

        let (base_link, base_parts) = match &self.base {
            BaseChoice::Disabled => (None, Vec::new()),
            BaseChoice::Structural => {
                let parts = self.rigid_parts(&joints, &root_link);
                (Some(root_link.clone()), parts)
            }
            BaseChoice::Link { link, parts } => {
                if !links.contains(link.as_str()) {
                    return Err(RigError::UnknownBaseLink(link.clone()));
                }
                let parts = match parts {
                    Some(names) => names
                        .iter()
                        .map(|name| {
                            self.body_parts
                                .iter()
                                .position(|p| &p.name == name)
                                .ok_or_else(|| RigError::UnknownBasePart(name.clone()))
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    None => self.rigid_parts(&joints, link),
                };
                (Some(link.clone()), parts)
            }
        };

        Ok(RobotRig {
            name: self.name,
            root_link,
            joints,
            body_parts: self.body_parts,
            chain,
            base_link,
            base_parts,
        })
    }

    /// The single link that is never a joint's child.
    fn find_root(&self) -> Result<String, RigError> {
        if self.joints.is_empty() {
            return self
                .body_parts
                .first()
                .map(|p| p.link.clone())
                .ok_or(RigError::Empty);
        }

        let mut children = HashSet::new();
        for joint in &self.joints {
            if !children.insert(joint.child_link.as_str()) {
                return Err(RigError::MultipleParents(joint.child_link.clone()));
            }
        }

        let mut roots: Vec<String> = Vec::new();
        for joint in &self.joints {
            let parent = joint.parent_link.as_str();
            if !children.contains(parent) && !roots.iter().any(|r| r == parent) {
                roots.push(parent.to_string());
            }
        }

        match roots.len() {
            0 => Err(RigError::NoRoot),
            1 => Ok(roots.remove(0)),
            _ => Err(RigError::MultipleRoots(roots)),
        }
    }

    /// Breadth-first joint order from the root, keeping declaration order
    /// among siblings.
    fn order_joints(&self, root_link: &str) -> Result<Vec<RigJoint>, RigError> {
        let mut by_parent: HashMap<&str, Vec<&RigJoint>> = HashMap::new();
        for joint in &self.joints {
            by_parent.entry(joint.parent_link.as_str()).or_default().push(joint);
        }

        let mut ordered = Vec::with_capacity(self.joints.len());
        let mut queue = VecDeque::from([root_link]);
        while let Some(link) = queue.pop_front() {
            for joint in by_parent.get(link).into_iter().flatten() {
                ordered.push((*joint).clone());
                queue.push_back(joint.child_link.as_str());
            }
        }

        if ordered.len() != self.joints.len() {
            let placed: HashSet<&str> = ordered.iter().map(|j| j.name.as_str()).collect();
            let missing = self
                .joints
                .iter()
                .find(|j| !placed.contains(j.name.as_str()))
                .map(|j| j.name.clone())
                .unwrap_or_default();
            return Err(RigError::Disconnected(missing));
        }
        Ok(ordered)
    }

    /// Body parts on `link` and on every link reachable from it through fixed
    /// joints only.
    fn rigid_parts(&self, joints: &[RigJoint], link: &str) -> Vec<usize> {
        let mut rigid: HashSet<&str> = HashSet::from([link]);
        // Joints are parent-first, so one pass reaches the whole fixed subtree.
        for joint in joints {
            if !joint.is_movable() && rigid.contains(joint.parent_link.as_str()) {
                rigid.insert(joint.child_link.as_str());
            }
        }
        self.body_parts
            .iter()
            .enumerate()
            .filter(|(_, p)| rigid.contains(p.link.as_str()))
            .map(|(i, _)| i)
            .collect()
    }
}
