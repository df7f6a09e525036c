//! DELVE core: scripted encounter logic for dungeon/raid instances
//!
//! The engine expresses a boss's combat behavior as timed, data-driven
//! actions dispatched against a shared per-instance state store, with door
//! gating derived from encounter progress and a token-stream save format.
//! Map loading, pathing, damage math and replication belong to the host
//! engine, reached only through the capability traits in [`host`].

pub mod config;
pub mod doors;
pub mod encounter;
pub mod host;
pub mod instance;
pub mod progress;
pub mod registry;
pub mod scheduler;
pub mod signals;
pub mod targeting;

// Re-exports for convenience
pub use config::{ConfigError, load_instance_config};
pub use delve_types::{
    AbilityId, ActionTarget, ActorId, AuraId, DoorConfig, DoorId, DoorKind, EncounterAction,
    EncounterConfig, EncounterState, EventConfig, EventId, GameObjectId, HpThresholdConfig,
    InstanceConfig, InstanceInfo, NpcId, Position, TargetFilter,
};
pub use doors::DoorBinding;
pub use encounter::{CombatState, EncounterController, EncounterScript, ScriptError};
pub use host::{
    ActorKind, ActorSnapshot, Affectable, Castable, DoorGate, EncounterHost, Mobile, Senses,
    Summoner,
};
pub use instance::DungeonInstance;
pub use progress::{EncounterStateStore, ProgressError, SAVE_HEADER};
pub use registry::ActorRegistry;
pub use scheduler::EventScheduler;
pub use signals::{Disengage, EncounterSignal};
