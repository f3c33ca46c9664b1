//! Saved animations.

use tracing::debug;

use super::definition::AnimationDefinition;
use super::timeline::{resolve_timeline, TimelineError};

/// The set of saved animations plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    animations: Vec<AnimationDefinition>,
    selected: Option<String>,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `animation`, replacing any with the same id.
    ///
    /// Start values are normalized on the way in, the list is kept sorted by
    /// name, and the saved animation becomes the selection.
    pub fn save(&mut self, animation: AnimationDefinition) -> Result<String, TimelineError> {
        resolve_timeline(&animation)?;
        let animation = animation.normalized();
        let id = animation.id.clone();

        self.animations.retain(|a| a.id != id);
        self.animations.push(animation);
        self.animations
            .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        self.selected = Some(id.clone());

        debug!(animation = %id, "animation saved");
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&AnimationDefinition> {
        self.animations.iter().find(|a| a.id == id)
    }

    /// Delete an animation. Clears the selection if it pointed at it.
    pub fn remove(&mut self, id: &str) -> Option<AnimationDefinition> {
        let index = self.animations.iter().position(|a| a.id == id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Some(self.animations.remove(index))
    }

    /// Select an animation by id, or clear the selection with `None`.
    /// Returns `false` if the id is unknown.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.get(id).is_none() => false,
            Some(id) => {
                self.selected = Some(id.to_string());
                true
            }
            None => {
                self.selected = None;
                true
            }
        }
    }

    pub fn selected(&self) -> Option<&AnimationDefinition> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Animations sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &AnimationDefinition> {
        self.animations.iter()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimTarget, KeyframeNode};

    fn simple(id: &str, name: &str) -> AnimationDefinition {
        AnimationDefinition::new(id, name)
            .with_node(KeyframeNode::new("n1", AnimTarget::BaseYaw, 1, 45.0))
            .with_node(KeyframeNode::new("n2", AnimTarget::BaseYaw, 2, -45.0))
    }

    #[test]
    fn test_save_normalizes_sorts_and_selects() {
        let mut library = AnimationLibrary::new();
        library.save(simple("b", "Zigzag")).unwrap();
        library.save(simple("a", "Arc")).unwrap();

        let names: Vec<&str> = library.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Arc", "Zigzag"]);
        assert_eq!(library.selected_id(), Some("a"));

        let saved = library.get("a").unwrap();
        assert_eq!(saved.nodes[1].start_deg, 45.0);
    }

    #[test]
    fn test_save_rejects_invalid() {
        let mut library = AnimationLibrary::new();
        let err = library.save(AnimationDefinition::new("x", "Empty")).unwrap_err();
        assert_eq!(err, TimelineError::Empty);
        assert!(library.is_empty());
        assert!(library.selected().is_none());
    }

    #[test]
    fn test_resave_replaces() {
        let mut library = AnimationLibrary::new();
        library.save(simple("a", "Arc")).unwrap();
        library.save(simple("a", "Arc v2")).unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("a").unwrap().name, "Arc v2");
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut library = AnimationLibrary::new();
        library.save(simple("a", "Arc")).unwrap();
        library.save(simple("b", "Bow")).unwrap();
        assert!(library.select(Some("a")));
        assert!(!library.select(Some("missing")));

        library.remove("b").unwrap();
        assert_eq!(library.selected_id(), Some("a"));
        library.remove("a").unwrap();
        assert!(library.selected_id().is_none());
    }
}
