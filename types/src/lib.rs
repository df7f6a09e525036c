//! Shared configuration types for DELVE
//!
//! This crate contains the serializable vocabulary shared between the engine
//! (delve-core) and tooling: identifier newtypes, encounter/door state enums,
//! target filters, scripted actions, and the TOML instance config structs.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier for a scheduled encounter event (application-defined, per script).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u32);

/// Ability/spell identifier understood by the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityId(pub u32);

/// Aura/status-effect identifier understood by the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuraId(pub u32);

/// NPC class/template identifier (which creature to summon).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(pub u32);

/// World-object identifier for doors registered with the gating table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoorId(pub u32);

/// World-object identifier for non-door objects (consumables restored on evade).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameObjectId(pub u32);

/// Opaque runtime handle to a live actor, assigned by the host engine.
///
/// The core never fabricates these; it only stores and passes back handles the
/// host produced (summon results, victim queries, nearby-actor snapshots).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor:{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encounter State
// ─────────────────────────────────────────────────────────────────────────────

/// Progress state of one encounter within an instance.
///
/// Raw values match the persisted save format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterState {
    /// Never engaged (or engaged and wiped before any progress was banked).
    #[default]
    NotStarted = 0,
    /// Fight currently running. Never trusted across a restart boundary.
    InProgress = 1,
    /// Last attempt wiped; the encounter can be re-attempted.
    Failed = 2,
    /// Boss defeated. Permanent for the instance's lifetime.
    Done = 3,
    /// Script-specific intermediate state (pre-events completed, etc.).
    Special = 4,
}

impl EncounterState {
    /// Raw integer written to the save token stream.
    pub fn as_raw(self) -> u8 {
        self as u8
    }

    /// Exact conversion from a raw value. None for anything out of range.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::NotStarted),
            1 => Some(Self::InProgress),
            2 => Some(Self::Failed),
            3 => Some(Self::Done),
            4 => Some(Self::Special),
            _ => None,
        }
    }

    /// Conversion applied when loading persisted progress.
    ///
    /// InProgress and out-of-range values coerce to NotStarted: combat state is
    /// never trustworthy across a restart, so a fight is never resumed mid-way.
    pub fn from_saved(raw: u8) -> Self {
        match Self::from_raw(raw) {
            Some(Self::InProgress) | None => Self::NotStarted,
            Some(state) => state,
        }
    }

    /// True once this encounter can never be engaged again.
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl std::fmt::Display for EncounterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Failed => "failed",
            Self::Done => "done",
            Self::Special => "special",
        };
        f.write_str(label)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Doors
// ─────────────────────────────────────────────────────────────────────────────

/// How a registered door reacts to its owning encounter's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorKind {
    /// Room boundary: open iff the owning encounter is not InProgress.
    /// Closes when the fight starts, reopens on either exit.
    #[default]
    Room,
    /// Escape route: opens once the owning encounter is Done and never
    /// reacts to combat starting or wiping.
    Passage,
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// World position. Owned by the host engine; the core only carries it through
/// reposition/summon actions and range checks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Component-wise offset (summon placement relative to the boss).
    pub fn offset_by(&self, offset: &Position) -> Position {
        Position {
            x: self.x + offset.x,
            y: self.y + offset.y,
            z: self.z + offset.z,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Target Filters
// ─────────────────────────────────────────────────────────────────────────────

/// Declarative predicate over candidate actors for spell targeting.
///
/// Evaluation lives in delve-core; this is the pure config vocabulary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum TargetFilter {
    /// Matches every candidate.
    #[default]
    Any,
    /// Player characters only.
    Players,
    /// Script-summoned helper NPCs only.
    Helpers,
    /// Candidates still alive.
    Alive,
    /// Candidates within `range` of the query origin.
    WithinRange { range: f32 },
    /// Inverts the inner filter.
    Not { filter: Box<TargetFilter> },
    /// All inner filters must match.
    AllOf { filters: Vec<TargetFilter> },
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted Actions
// ─────────────────────────────────────────────────────────────────────────────

/// Who a scripted cast resolves against.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ActionTarget {
    /// The boss's current melee victim.
    #[default]
    CurrentVictim,
    /// The boss itself (self-buffs, immunities).
    Boss,
    /// An actor previously recorded in the encounter registry under `tag`.
    Tagged { tag: String },
    /// Nearest actor matching `filter`, searched within `range` of the boss.
    Nearest { filter: TargetFilter, range: f32 },
}

/// Closed set of actions an encounter event can dispatch to.
///
/// One action per event id, resolved through a lookup table built at script
/// load - there is deliberately no numeric-id switch to grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EncounterAction {
    /// Cast an ability at the resolved target.
    CastAbility {
        ability: AbilityId,
        #[serde(default)]
        target: ActionTarget,
    },
    /// Summon a helper NPC near the boss and record it under `tag`.
    SummonHelper {
        npc: NpcId,
        tag: String,
        #[serde(default)]
        offset: Position,
    },
    /// Move the boss to a fixed point.
    Reposition { to: Position },
    /// Apply an immunity/shield aura to the boss.
    ApplyImmunity { aura: AuraId },
    /// Remove a previously applied immunity/shield aura from the boss.
    RemoveImmunity { aura: AuraId },
    /// Despawn the helper recorded under `tag`, if it is still present.
    DespawnHelper { tag: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Instance Config (TOML)
// ─────────────────────────────────────────────────────────────────────────────

/// Instance metadata header.
///
/// ```toml
/// [instance]
/// name = "The Sunken Vault"
/// map_id = 540
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// Display name of the dungeon/raid.
    pub name: String,

    /// Host map identifier this instance config applies to.
    #[serde(default)]
    pub map_id: u32,
}

/// A timed event within an encounter script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Event identifier, unique within the encounter.
    pub id: EventId,

    /// Display name for logs and transcripts.
    pub name: String,

    /// Delay before the event first fires, in seconds.
    pub delay_secs: f32,

    /// Action dispatched when the event fires.
    pub action: EncounterAction,

    /// Re-arm delay after firing (None = one-shot).
    #[serde(default)]
    pub reschedule_secs: Option<f32>,

    /// Whether this event is scheduled at engage time.
    /// Threshold-triggered events set this to false.
    #[serde(default = "default_true")]
    pub initial: bool,
}

/// Fires `event` once when boss HP first drops to `hp_percent` or below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HpThresholdConfig {
    pub hp_percent: f32,
    pub event: EventId,
}

/// One encounter declaration. Declaration order in the config file is the
/// persistence order of the save token stream - part of the format contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Unique identifier (e.g. "warden").
    pub id: String,

    /// Display name.
    pub name: String,

    /// Scripted timed events.
    #[serde(default, rename = "event")]
    pub events: Vec<EventConfig>,

    /// HP-threshold triggers layered on the event schedule.
    #[serde(default, rename = "threshold")]
    pub thresholds: Vec<HpThresholdConfig>,

    /// Consumable world objects restored to pre-attempt condition on evade.
    #[serde(default)]
    pub restore_objects: Vec<GameObjectId>,
}

/// One door registration: door object -> owning encounter + gating kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorConfig {
    /// Door world-object identifier.
    pub door: DoorId,

    /// Id of the owning encounter.
    pub encounter: String,

    /// Gating kind (room boundary vs escape passage).
    #[serde(default)]
    pub kind: DoorKind,

    /// Free-form boundary tag ("entrance", "exit_north", ...).
    #[serde(default)]
    pub boundary: String,
}

/// Root structure for instance config files (TOML), loaded once at instance
/// start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Instance metadata.
    #[serde(default)]
    pub instance: InstanceInfo,

    /// Encounter declarations, in save order.
    #[serde(default, rename = "encounter")]
    pub encounters: Vec<EncounterConfig>,

    /// Door registrations.
    #[serde(default, rename = "door")]
    pub doors: Vec<DoorConfig>,
}

/// Default for enabled/initial flags.
pub fn default_true() -> bool {
    true
}
