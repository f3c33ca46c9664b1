//! Timeline resolution: layers to fixed-length time slots.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::definition::{AnimTarget, AnimationDefinition};

/// Length of one layer's time slot in seconds.
pub const SLOT_DURATION: f64 = 1.0;

/// Reasons an animation cannot be played.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("add at least one animation box")]
    Empty,
    #[error("layer must be a positive integer")]
    InvalidLayer { node_id: String, layer: i32 },
    #[error("duplicate target in layer {layer}")]
    DuplicateTarget { layer: i32, target: AnimTarget },
}

/// Where a playhead falls on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPosition {
    /// 0-based slot index.
    pub index: usize,
    /// 1-based layer number of the slot.
    pub layer: i32,
    /// Progress through the slot in `[0, 1]`.
    pub alpha: f64,
}

/// A validated timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    layer_keys: Vec<i32>,
    slot_count: usize,
}

impl Timeline {
    /// Distinct layers that carry nodes, ascending.
    pub fn layer_keys(&self) -> &[i32] {
        &self.layer_keys
    }

    /// Slots played: every layer from 1 to the highest used layer.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn total_duration(&self) -> f64 {
        self.slot_count as f64 * SLOT_DURATION
    }

    /// A slot with no nodes; its targets hold their previous values.
    pub fn is_rest_layer(&self, layer: i32) -> bool {
        self.layer_keys.binary_search(&layer).is_err()
    }

    /// Resolve `playhead` (seconds) to a slot and the progress within it.
    pub fn locate(&self, playhead: f64) -> SlotPosition {
        let last = self.slot_count.saturating_sub(1);
        let slot = (playhead / SLOT_DURATION).floor();
        let index = if slot.is_nan() || slot < 0.0 {
            0
        } else {
            (slot as usize).min(last)
        };
        let alpha = ((playhead - index as f64 * SLOT_DURATION) / SLOT_DURATION).clamp(0.0, 1.0);
        SlotPosition {
            index,
            layer: index as i32 + 1,
            alpha: if alpha.is_nan() { 0.0 } else { alpha },
        }
    }
}

/// Validate `animation` and build its timeline.
///
/// Fails on an empty animation, a non-positive layer, or a target written
/// twice on the same layer.
pub fn resolve_timeline(animation: &AnimationDefinition) -> Result<Timeline, TimelineError> {
    if animation.nodes.is_empty() {
        return Err(TimelineError::Empty);
    }

    let mut seen: BTreeMap<i32, BTreeSet<&AnimTarget>> = BTreeMap::new();
    for node in &animation.nodes {
        if node.layer <= 0 {
            return Err(TimelineError::InvalidLayer {
                node_id: node.id.clone(),
                layer: node.layer,
            });
        }
        if !seen.entry(node.layer).or_default().insert(&node.target) {
            return Err(TimelineError::DuplicateTarget {
                layer: node.layer,
                target: node.target.clone(),
            });
        }
    }

    let layer_keys: Vec<i32> = seen.into_keys().collect();
    let slot_count = layer_keys.last().copied().unwrap_or(0) as usize;
    Ok(Timeline {
        layer_keys,
        slot_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::KeyframeNode;

    fn anim(nodes: Vec<KeyframeNode>) -> AnimationDefinition {
        nodes
            .into_iter()
            .fold(AnimationDefinition::new("a", "A"), |a, n| a.with_node(n))
    }

    #[test]
    fn test_empty() {
        let err = resolve_timeline(&anim(vec![])).unwrap_err();
        assert_eq!(err, TimelineError::Empty);
        assert_eq!(err.to_string(), "add at least one animation box");
    }

    #[test]
    fn test_invalid_layer() {
        let err = resolve_timeline(&anim(vec![KeyframeNode::new("n", AnimTarget::BaseYaw, 0, 1.0)]))
            .unwrap_err();
        assert_eq!(err.to_string(), "layer must be a positive integer");
    }

    #[test]
    fn test_duplicate_target() {
        let err = resolve_timeline(&anim(vec![
            KeyframeNode::new("a", AnimTarget::joint("elbow"), 2, 10.0),
            KeyframeNode::new("b", AnimTarget::BaseYaw, 2, 10.0),
            KeyframeNode::new("c", AnimTarget::joint("elbow"), 2, 20.0),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "duplicate target in layer 2");

        // The same target on different layers is fine.
        assert!(resolve_timeline(&anim(vec![
            KeyframeNode::new("a", AnimTarget::joint("elbow"), 1, 10.0),
            KeyframeNode::new("b", AnimTarget::joint("elbow"), 2, 20.0),
        ]))
        .is_ok());
    }

    #[test]
    fn test_gap_becomes_rest_slot() {
        let timeline = resolve_timeline(&anim(vec![
            KeyframeNode::new("b", AnimTarget::BaseYaw, 3, 0.0),
            KeyframeNode::new("a", AnimTarget::BaseYaw, 1, 45.0),
        ]))
        .unwrap();
        assert_eq!(timeline.layer_keys(), &[1, 3]);
        assert_eq!(timeline.slot_count(), 3);
        assert_eq!(timeline.total_duration(), 3.0);
        assert!(timeline.is_rest_layer(2));
        assert!(!timeline.is_rest_layer(3));
    }

    #[test]
    fn test_locate() {
        let timeline = resolve_timeline(&anim(vec![KeyframeNode::new(
            "a",
            AnimTarget::BaseYaw,
            2,
            1.0,
        )]))
        .unwrap();

        let start = timeline.locate(0.0);
        assert_eq!((start.index, start.layer, start.alpha), (0, 1, 0.0));

        let mid = timeline.locate(1.25);
        assert_eq!((mid.index, mid.layer), (1, 2));
        assert!((mid.alpha - 0.25).abs() < 1e-12);

        // The very end stays in the last slot at full progress.
        let end = timeline.locate(2.0);
        assert_eq!((end.index, end.alpha), (1, 1.0));

        let before = timeline.locate(-0.5);
        assert_eq!((before.index, before.alpha), (0, 0.0));
    }
}
