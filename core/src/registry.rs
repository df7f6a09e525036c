//! Encounter-scoped actor registry
//!
//! Scripts refer to live entities by tag ("tank_add", "left_pillar") instead
//! of carrying one struct field per actor handle. The registry maps those
//! tags to opaque host handles; lookups return `Option` so callers tolerate
//! being asked about an entity before it exists.

use delve_types::ActorId;
use hashbrown::HashMap;

/// Keyed lookup table from script tags to opaque actor references.
///
/// Owned by one encounter controller and cleared on every disengage.
#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    actors: HashMap<String, ActorId>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an actor under `tag`, replacing any previous holder of the tag.
    pub fn record(&mut self, tag: impl Into<String>, actor: ActorId) {
        self.actors.insert(tag.into(), actor);
    }

    /// Look up the actor recorded under `tag`. None when not present.
    pub fn get(&self, tag: &str) -> Option<ActorId> {
        self.actors.get(tag).copied()
    }

    /// Remove and return the actor recorded under `tag`.
    pub fn take(&mut self, tag: &str) -> Option<ActorId> {
        self.actors.remove(tag)
    }

    /// All recorded actors, for bulk despawn on disengage.
    pub fn drain(&mut self) -> impl Iterator<Item = (String, ActorId)> {
        self.actors.drain()
    }

    pub fn clear(&mut self) {
        self.actors.clear();
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}
