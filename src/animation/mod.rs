//! Keyframe animations, their timelines and the saved library.

pub mod definition;
pub mod library;
pub mod timeline;

pub use definition::{compute_start_degrees, AnimTarget, AnimationDefinition, KeyframeNode, LoopMode};
pub use library::AnimationLibrary;
pub use timeline::{resolve_timeline, SlotPosition, Timeline, TimelineError, SLOT_DURATION};
