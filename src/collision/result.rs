//! Detector output types.

use std::collections::BTreeSet;
use std::fmt;

/// Aggregate obstacle-proximity state for one detector run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Nothing within the warning margin.
    #[default]
    None,
    /// At least one body part is within the warning margin of an obstacle.
    Warning,
    /// At least one body part overlaps an obstacle.
    Collision,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::None => "none",
            Severity::Warning => "warning",
            Severity::Collision => "collision",
        };
        f.write_str(s)
    }
}

/// One body part paired with one obstacle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObstaclePair {
    pub body_part: String,
    pub obstacle_id: String,
}

impl ObstaclePair {
    pub fn new(body_part: impl Into<String>, obstacle_id: impl Into<String>) -> Self {
        Self {
            body_part: body_part.into(),
            obstacle_id: obstacle_id.into(),
        }
    }
}

/// Result of one obstacle detector run. Always replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionResult {
    pub severity: Severity,
    pub colliding_parts: BTreeSet<String>,
    pub warning_parts: BTreeSet<String>,
    pub colliding_obstacles: BTreeSet<String>,
    pub warning_obstacles: BTreeSet<String>,
    pub colliding_pairs: Vec<ObstaclePair>,
    pub warning_pairs: Vec<ObstaclePair>,
}

impl CollisionResult {
    /// The explicit all-clear result.
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn is_clear(&self) -> bool {
        self.severity == Severity::None
    }

    /// Highlight class for one body part. Collision beats warning.
    pub fn tint_for(&self, body_part: &str) -> Severity {
        if self.colliding_parts.contains(body_part) {
            Severity::Collision
        } else if self.warning_parts.contains(body_part) {
            Severity::Warning
        } else {
            Severity::None
        }
    }

    /// Highlight class for one obstacle. Collision beats warning.
    pub fn obstacle_tint(&self, obstacle_id: &str) -> Severity {
        if self.colliding_obstacles.contains(obstacle_id) {
            Severity::Collision
        } else if self.warning_obstacles.contains(obstacle_id) {
            Severity::Warning
        } else {
            Severity::None
        }
    }
}

/// Label used for the base proxy in self-collision pairs.
pub const BASE_LABEL: &str = "Base";

/// Display label for link segment `index` (0-based).
pub fn link_label(index: usize) -> String {
    format!("Link{}", index + 1)
}

/// Two robot links, or a link and the base, that are too close.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelfCollisionPair {
    pub a: String,
    pub b: String,
    pub a_index: usize,
    /// `None` when `b` is the base proxy.
    pub b_index: Option<usize>,
}

impl SelfCollisionPair {
    pub fn links(i: usize, j: usize) -> Self {
        Self {
            a: link_label(i),
            b: link_label(j),
            a_index: i,
            b_index: Some(j),
        }
    }

    pub fn with_base(i: usize) -> Self {
        Self {
            a: link_label(i),
            b: BASE_LABEL.to_string(),
            a_index: i,
            b_index: None,
        }
    }

    /// Stable key: `"{i}-{j}"` or `"{i}-base"`.
    pub fn key(&self) -> String {
        match self.b_index {
            Some(j) => format!("{}-{}", self.a_index, j),
            None => format!("{}-base", self.a_index),
        }
    }

    pub fn involves_base(&self) -> bool {
        self.b_index.is_none()
    }
}

/// Result of one self-collision detector run. Always replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfCollisionResult {
    pub pairs: Vec<SelfCollisionPair>,
}

impl SelfCollisionResult {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Sorted pair keys joined with `|`. Empty when there are no pairs.
    pub fn signature(&self) -> String {
        let mut keys: Vec<String> = self.pairs.iter().map(SelfCollisionPair::key).collect();
        keys.sort();
        keys.join("|")
    }
}
