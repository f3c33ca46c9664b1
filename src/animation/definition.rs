//! Keyframe animation definitions.

use std::collections::HashMap;
use std::fmt;

/// What a keyframe node drives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnimTarget {
    /// Yaw of the whole robot about the world up axis.
    BaseYaw,
    /// One named joint.
    Joint(String),
}

impl AnimTarget {
    pub fn joint(name: impl Into<String>) -> Self {
        AnimTarget::Joint(name.into())
    }

    /// Stable key: `baseYaw` or `joint:{name}`.
    pub fn key(&self) -> String {
        match self {
            AnimTarget::BaseYaw => "baseYaw".to_string(),
            AnimTarget::Joint(name) => format!("joint:{name}"),
        }
    }
}

impl fmt::Display for AnimTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimTarget::BaseYaw => f.write_str("base yaw"),
            AnimTarget::Joint(name) => f.write_str(name),
        }
    }
}

/// What happens when the playhead reaches the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Stop at the end.
    #[default]
    None,
    /// Reverse direction at either end, forever.
    PingPong,
}

/// One timed move of one target.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeNode {
    pub id: String,
    pub target: AnimTarget,
    /// 1-based time slot.
    pub layer: i32,
    /// Derived from the previous layer. See [`compute_start_degrees`].
    pub start_deg: f32,
    pub end_deg: f32,
    pub label: Option<String>,
}

impl KeyframeNode {
    pub fn new(id: impl Into<String>, target: AnimTarget, layer: i32, end_deg: f32) -> Self {
        Self {
            id: id.into(),
            target,
            layer,
            start_deg: 0.0,
            end_deg,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Interpolated value at `alpha` in `[0, 1]`. Exact at both ends.
    pub fn value_at(&self, alpha: f64) -> f32 {
        let t = alpha.clamp(0.0, 1.0);
        (self.start_deg as f64 * (1.0 - t) + self.end_deg as f64 * t) as f32
    }
}

/// A saved keyframe animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDefinition {
    pub id: String,
    pub name: String,
    pub loop_mode: LoopMode,
    pub nodes: Vec<KeyframeNode>,
}

impl AnimationDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            loop_mode: LoopMode::None,
            nodes: Vec::new(),
        }
    }

    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    pub fn with_node(mut self, node: KeyframeNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Rewrite every node's `start_deg` from the layer order.
    pub fn normalize_start_deg(&mut self) {
        let starts = compute_start_degrees(&self.nodes);
        for node in &mut self.nodes {
            node.start_deg = starts.get(&node.id).copied().unwrap_or(0.0);
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize_start_deg();
        self
    }

    /// Nodes on `layer`.
    pub fn nodes_on_layer(&self, layer: i32) -> impl Iterator<Item = &KeyframeNode> {
        self.nodes.iter().filter(move |n| n.layer == layer)
    }
}

/// Derived start value of each node, keyed by node id.
///
/// Nodes are walked by layer, ties broken by id. A target's first node starts
/// at 0; every later node starts where the previous one for that target ended.
pub fn compute_start_degrees(nodes: &[KeyframeNode]) -> HashMap<String, f32> {
    let mut ordered: Vec<&KeyframeNode> = nodes.iter().collect();
    ordered.sort_by(|a, b| a.layer.cmp(&b.layer).then_with(|| a.id.cmp(&b.id)));

    let mut last_end: HashMap<&AnimTarget, f32> = HashMap::new();
    let mut starts = HashMap::with_capacity(nodes.len());
    for node in ordered {
        let start = last_end.get(&node.target).copied().unwrap_or(0.0);
        starts.insert(node.id.clone(), start);
        last_end.insert(&node.target, node.end_deg);
    }
    starts
}
