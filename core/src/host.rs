//! Capability traits over the host engine
//!
//! The core runs inside a larger engine that owns maps, pathing, damage math
//! and replication. Everything the scripts need from it is expressed as
//! narrow capability traits: each host type implements only what it needs,
//! and tests substitute recording stubs.
//!
//! Queries that may reference a not-yet-materialized entity return `Option`.
//! Callers branch on the absent case; it is never a hard failure.

use delve_types::{AbilityId, ActorId, AuraId, GameObjectId, NpcId, Position};

/// A door world-object that can be toggled passable/impassable.
pub trait DoorGate {
    fn set_passable(&mut self, passable: bool);
}

/// Ability casting.
pub trait Castable {
    /// Cast `ability` from `caster`. `target` of None means an untargeted or
    /// self-centered cast; the host resolves the difference per ability.
    fn cast_ability(&mut self, caster: ActorId, ability: AbilityId, target: Option<ActorId>);
}

/// Aura/status-effect application.
pub trait Affectable {
    fn apply_aura(&mut self, target: ActorId, aura: AuraId);
    fn remove_aura(&mut self, target: ActorId, aura: AuraId);
}

/// Position queries and movement orders.
pub trait Mobile {
    /// None when the actor is not currently materialized.
    fn position_of(&self, actor: ActorId) -> Option<Position>;
    fn move_actor(&mut self, actor: ActorId, to: Position);
}

/// Spawning and despawning of script-owned world entities.
pub trait Summoner {
    /// Summon a helper NPC. None when the host refuses the spawn.
    fn summon(&mut self, npc: NpcId, at: Position) -> Option<ActorId>;
    fn despawn(&mut self, actor: ActorId);
    /// Restore a consumed side-object to its pre-attempt condition.
    fn restore_object(&mut self, object: GameObjectId);
}

/// Combat awareness: victims, liveness, nearby actors.
pub trait Senses {
    /// The actor's current attack victim, if it has one.
    fn victim_of(&self, actor: ActorId) -> Option<ActorId>;

    /// Snapshots of actors within `range` of `origin`, for target filtering.
    fn actors_near(&self, origin: Position, range: f32) -> Vec<ActorSnapshot>;

    /// Health as a fraction of maximum (0.0..=1.0). None when absent.
    fn health_fraction(&self, actor: ActorId) -> Option<f32>;

    fn is_alive(&self, actor: ActorId) -> bool;
}

/// Everything an encounter controller needs from the host, plus the default
/// melee fallback performed when no scripted action consumed the tick.
pub trait EncounterHost: Castable + Affectable + Mobile + Summoner + Senses {
    fn auto_attack(&mut self, attacker: ActorId);
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// Broad classification of a live actor, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    /// A helper NPC summoned by encounter scripting.
    Helper,
    /// Any other host-owned creature (the boss itself included).
    Creature,
}

/// Point-in-time view of a candidate actor, used by target filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub kind: ActorKind,
    pub position: Position,
    pub alive: bool,
}
