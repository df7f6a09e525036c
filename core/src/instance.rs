//! Dungeon instance aggregate
//!
//! One `DungeonInstance` owns the progress store and one encounter controller
//! per declared encounter, and is confined to a single logical update loop:
//! the host invokes `update` once per server tick with the elapsed time since
//! the previous tick. Nothing here is shared across instances.

use std::time::Duration;

use delve_types::{ActorId, DoorId, EncounterState, InstanceConfig, InstanceInfo};

use crate::encounter::{EncounterController, EncounterScript, ScriptError};
use crate::host::{DoorGate, EncounterHost};
use crate::progress::{EncounterStateStore, ProgressError};
use crate::signals::EncounterSignal;

/// Runtime state of one dungeon/raid instance.
#[derive(Debug)]
pub struct DungeonInstance {
    info: InstanceInfo,
    store: EncounterStateStore,
    controllers: Vec<EncounterController>,
}

impl DungeonInstance {
    /// Build an instance from validated config: one NotStarted slot and one
    /// controller per encounter, doors registered against their owners.
    pub fn new(config: &InstanceConfig) -> Result<Self, ScriptError> {
        let mut store =
            EncounterStateStore::new(config.encounters.iter().map(|e| e.id.clone()));
        for door in &config.doors {
            // Unknown owners were already warned about at validation
            store.register_door(door);
        }
        // Bind-time gating of not-yet-materialized doors produced no toggles,
        // but clear anything queued so the first update starts clean.
        store.take_door_events();

        let controllers = config
            .encounters
            .iter()
            .map(|e| EncounterScript::from_config(e).map(EncounterController::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            info: config.instance.clone(),
            store,
            controllers,
        })
    }

    pub fn info(&self) -> &InstanceInfo {
        &self.info
    }

    pub fn store(&self) -> &EncounterStateStore {
        &self.store
    }

    pub fn controllers(&self) -> &[EncounterController] {
        &self.controllers
    }

    pub fn controller(&self, encounter_id: &str) -> Option<&EncounterController> {
        self.controllers
            .iter()
            .find(|c| c.script().encounter_id == encounter_id)
    }

    fn controller_idx(&self, encounter_id: &str) -> Option<usize> {
        self.controllers
            .iter()
            .position(|c| c.script().encounter_id == encounter_id)
    }

    /// Convenience read-through to the store.
    pub fn state_of(&self, encounter_id: &str) -> EncounterState {
        self.store.state_of(encounter_id)
    }

    // ─── Tick loop ───────────────────────────────────────────────────────────

    /// One cooperative update for the whole instance. Each encounter's update
    /// runs in isolation; a problem inside one (logged at its source) never
    /// aborts the loop for the others.
    pub fn update<H: EncounterHost + ?Sized>(
        &mut self,
        elapsed: Duration,
        host: &mut H,
    ) -> Vec<EncounterSignal> {
        let mut signals = Vec::new();
        for controller in &mut self.controllers {
            signals.extend(controller.tick(elapsed, host, &mut self.store));
        }
        self.drain_door_events(&mut signals);
        signals
    }

    // ─── Encounter lifecycle ─────────────────────────────────────────────────

    /// First aggression against `encounter_id`'s boss.
    pub fn engage(&mut self, encounter_id: &str, boss: ActorId) -> Vec<EncounterSignal> {
        let Some(idx) = self.controller_idx(encounter_id) else {
            tracing::warn!(encounter = encounter_id, "engage on unknown encounter");
            return Vec::new();
        };
        let mut signals = self.controllers[idx].engage(boss, &mut self.store);
        self.drain_door_events(&mut signals);
        signals
    }

    /// Host engine reports the encounter's boss died.
    pub fn notify_boss_death<H: EncounterHost + ?Sized>(
        &mut self,
        encounter_id: &str,
        host: &mut H,
    ) -> Vec<EncounterSignal> {
        let Some(idx) = self.controller_idx(encounter_id) else {
            tracing::warn!(encounter = encounter_id, "boss death for unknown encounter");
            return Vec::new();
        };
        let mut signals = self.controllers[idx].notify_victory(host, &mut self.store);
        self.drain_door_events(&mut signals);
        signals
    }

    /// Host engine forcibly resets the encounter (same cleanup as an evade).
    pub fn reset_encounter<H: EncounterHost + ?Sized>(
        &mut self,
        encounter_id: &str,
        host: &mut H,
    ) -> Vec<EncounterSignal> {
        let Some(idx) = self.controller_idx(encounter_id) else {
            tracing::warn!(encounter = encounter_id, "reset for unknown encounter");
            return Vec::new();
        };
        let mut signals = self.controllers[idx].reset(host, &mut self.store);
        self.drain_door_events(&mut signals);
        signals
    }

    // ─── World object plumbing ───────────────────────────────────────────────

    /// A registered door materialized: bind it and apply current gating.
    pub fn on_door_spawned(
        &mut self,
        door: DoorId,
        gate: Box<dyn DoorGate>,
    ) -> Vec<EncounterSignal> {
        let mut signals = Vec::new();
        if self.store.bind_door(door, gate) {
            self.drain_door_events(&mut signals);
        }
        signals
    }

    /// A registered door dematerialized.
    pub fn on_door_despawned(&mut self, door: DoorId) {
        self.store.unbind_door(door);
    }

    // ─── Persistence ─────────────────────────────────────────────────────────

    /// Serialized boss-state string for the host's save system.
    pub fn save(&self) -> String {
        self.store.serialize()
    }

    /// Load persisted progress. A malformed stream is logged and leaves the
    /// instance at defaults; it never takes the instance down.
    pub fn load_progress(&mut self, data: &str) -> Result<(), ProgressError> {
        let result = self.store.deserialize(data);
        if let Err(ref err) = result {
            tracing::warn!(error = %err, "failed to load instance progress");
        }
        // Gating after a (re)load may have toggled doors outside any tick;
        // the toggles surface with the next batch of signals.
        result
    }

    fn drain_door_events(&mut self, signals: &mut Vec<EncounterSignal>) {
        for (door, open) in self.store.take_door_events() {
            signals.push(EncounterSignal::DoorToggled { door, open });
        }
    }
}
