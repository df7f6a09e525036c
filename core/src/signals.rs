//! Signals emitted by the encounter engine
//!
//! Engine entry points (engage, per-tick update, victory/evade paths) return
//! these so the host can drive party-visible UI, achievements and logging
//! without the core knowing about any of that. They represent "interesting
//! things that happened" at a higher level than raw script events.

use delve_types::{DoorId, EncounterState, EventId};

/// How an engagement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disengage {
    /// Boss defeated; the encounter is permanently Done for this instance.
    Victory,
    /// Boss lost all valid targets or was reset by the host engine.
    Evaded,
}

/// Signals emitted for cross-cutting concerns during encounter updates.
#[derive(Debug, Clone, PartialEq)]
pub enum EncounterSignal {
    /// First aggression: the fight is now running. Party-visible "engage"
    /// notification.
    Engaged { encounter: String },

    /// The fight ended, one way or the other. Party-visible "disengage"
    /// notification.
    Disengaged {
        encounter: String,
        outcome: Disengage,
    },

    /// The progress store accepted a state transition.
    StateChanged {
        encounter: String,
        old: EncounterState,
        new: EncounterState,
    },

    /// A scheduled script event came due and was dispatched.
    EventFired {
        encounter: String,
        event: EventId,
        /// Event name from the script, for transcripts/logs.
        name: String,
    },

    /// Door gating was actually toggled (idempotent re-applies are silent).
    DoorToggled { door: DoorId, open: bool },

    /// Every encounter in the instance is Done.
    InstanceComplete,
}
