use std::collections::HashMap;

use tracing::debug;

use super::events::GameEvent;
use super::stage::SpriteId;

/// Per-scene map from a symbolic object name to its sprite. Populated as
/// the scene builds its content; at most one entry per name, last write
/// wins without error. Lookup is exact-string, callers apply
/// [`crate::app::command::normalize_target`] first.
#[derive(Debug, Default)]
pub struct InteractionRegistry {
    by_name: HashMap<String, SpriteId>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, sprite: SpriteId) {
        let name = name.into();
        if let Some(previous) = self.by_name.insert(name.clone(), sprite) {
            debug!(%name, previous = previous.0, replacement = sprite.0, "re-registered object");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SpriteId> {
        self.by_name.get(name).copied()
    }

    /// Registered names in sorted order, for deterministic HUD suggestions.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The typed event the presentation layer publishes when a registered
    /// object is clicked. Unregistered names produce nothing.
    pub fn click(&self, name: &str) -> Option<GameEvent> {
        self.lookup(name).map(|_| GameEvent::ObjectClicked {
            object_name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_name.clear();
    }
}
