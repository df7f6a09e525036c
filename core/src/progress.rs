//! Per-instance encounter progress store
//!
//! Single source of truth for which encounters in an instance are unstarted,
//! active, won or lost. The store owns all door bindings for its instance and
//! re-applies gating synchronously on every accepted state transition.
//!
//! # Persistence
//!
//! Progress serializes as a flat whitespace-delimited token stream: the
//! two-character header tag followed by one integer per encounter in
//! declaration order. Declaration order - not map order - is part of the
//! format contract. There is no version field; schema migrations are gated
//! externally.

use std::fmt::Write as _;

use hashbrown::HashMap;
use thiserror::Error;

use delve_types::{DoorConfig, DoorId, EncounterState};

use crate::doors::DoorBinding;
use crate::host::DoorGate;

/// Record-kind tag at the head of every save stream.
pub const SAVE_HEADER: &str = "DV";

/// Errors while loading persisted progress. Always non-fatal: the store falls
/// back to default state and the caller logs and continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("save header mismatch: expected {SAVE_HEADER:?}, found {found:?}")]
    HeaderMismatch { found: String },

    #[error("save stream truncated: no token for encounter '{slot}'")]
    MissingToken { slot: String },

    #[error("invalid token {token:?} for encounter '{slot}'")]
    InvalidToken { slot: String, token: String },
}

#[derive(Debug)]
struct EncounterSlot {
    id: String,
    state: EncounterState,
}

/// Per-instance mapping from encounter id to progress state, plus the door
/// bindings gated by it.
///
/// Slots live in fixed declaration order; a hashbrown index maps ids to slots
/// for lookups. Confined to its instance's single-threaded update loop.
#[derive(Debug, Default)]
pub struct EncounterStateStore {
    slots: Vec<EncounterSlot>,
    index: HashMap<String, usize>,
    doors: Vec<DoorBinding>,
    /// Door toggles actually forwarded to the host since the last drain.
    door_events: Vec<(DoorId, bool)>,
}

impl EncounterStateStore {
    /// Build a store with one NotStarted slot per encounter id, in declaration
    /// order. Duplicate ids keep the first slot (the loader rejects them
    /// earlier with a proper error).
    pub fn new<I, S>(encounter_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::default();
        for id in encounter_ids {
            let id = id.into();
            if store.index.contains_key(&id) {
                continue;
            }
            store.index.insert(id.clone(), store.slots.len());
            store.slots.push(EncounterSlot {
                id,
                state: EncounterState::NotStarted,
            });
        }
        store
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn encounter_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.id.as_str())
    }

    /// Declaration-order slot index for an encounter id.
    pub fn slot_of(&self, encounter_id: &str) -> Option<usize> {
        self.index.get(encounter_id).copied()
    }

    // ─── State ───────────────────────────────────────────────────────────────

    /// Pure read. Unknown ids report NotStarted by convention.
    pub fn state_of(&self, encounter_id: &str) -> EncounterState {
        self.slot_of(encounter_id)
            .map(|idx| self.slots[idx].state)
            .unwrap_or_default()
    }

    /// Apply a state transition.
    ///
    /// Returns false and changes nothing (door gating included) when the
    /// encounter id is unknown; callers treat that as a logged no-op, never
    /// fatal. On success, gating for doors owned by this encounter is
    /// re-evaluated and applied before returning.
    pub fn set_state(&mut self, encounter_id: &str, state: EncounterState) -> bool {
        let Some(idx) = self.slot_of(encounter_id) else {
            tracing::warn!(encounter = encounter_id, "set_state on unknown encounter");
            return false;
        };
        self.slots[idx].state = state;
        self.apply_gating_for_slot(idx);
        true
    }

    /// True once every encounter in the instance is Done.
    pub fn all_done(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(|s| s.state == EncounterState::Done)
    }

    // ─── Doors ───────────────────────────────────────────────────────────────

    /// Register a door from static config. Returns false (logged) when the
    /// owning encounter is unknown.
    pub fn register_door(&mut self, config: &DoorConfig) -> bool {
        let Some(slot) = self.slot_of(&config.encounter) else {
            tracing::warn!(
                door = config.door.0,
                encounter = %config.encounter,
                "door registered against unknown encounter"
            );
            return false;
        };
        self.doors.push(DoorBinding::new(
            config.door,
            slot,
            config.kind,
            config.boundary.clone(),
        ));
        true
    }

    /// Attach a materialized door object and immediately apply current gating
    /// from its owning encounter's state. Returns false when the door was
    /// never registered.
    pub fn bind_door(&mut self, door: DoorId, gate: Box<dyn DoorGate>) -> bool {
        let Some(binding) = self.doors.iter_mut().find(|b| b.door == door) else {
            tracing::warn!(door = door.0, "bind for unregistered door");
            return false;
        };
        binding.bind(gate);
        let slot = binding.encounter_slot;
        self.apply_one(slot, door);
        true
    }

    /// Detach on dematerialization. No-op for unknown doors.
    pub fn unbind_door(&mut self, door: DoorId) {
        if let Some(binding) = self.doors.iter_mut().find(|b| b.door == door) {
            binding.unbind();
        }
    }

    pub fn door_bindings(&self) -> &[DoorBinding] {
        &self.doors
    }

    /// Drain door toggles applied since the last call, for signal emission.
    pub fn take_door_events(&mut self) -> Vec<(DoorId, bool)> {
        std::mem::take(&mut self.door_events)
    }

    fn apply_one(&mut self, slot: usize, door: DoorId) {
        let state = self.slots[slot].state;
        if let Some(binding) = self.doors.iter_mut().find(|b| b.door == door)
            && let Some(open) = binding.apply(state)
        {
            tracing::debug!(door = door.0, open, "door gating applied");
            self.door_events.push((door, open));
        }
    }

    fn apply_gating_for_slot(&mut self, slot: usize) {
        let state = self.slots[slot].state;
        for binding in self.doors.iter_mut().filter(|b| b.encounter_slot == slot) {
            if let Some(open) = binding.apply(state) {
                tracing::debug!(door = binding.door.0, open, "door gating applied");
                self.door_events.push((binding.door, open));
            }
        }
    }

    fn apply_gating_all(&mut self) {
        for slot in 0..self.slots.len() {
            self.apply_gating_for_slot(slot);
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────────

    /// Serialize progress: header tag, then one integer per encounter in
    /// declaration order.
    pub fn serialize(&self) -> String {
        let mut out = String::from(SAVE_HEADER);
        for slot in &self.slots {
            // Infallible: writing to a String
            let _ = write!(out, " {}", slot.state.as_raw());
        }
        out
    }

    /// Load progress from a token stream produced by [`serialize`].
    ///
    /// On any failure every slot is left at NotStarted and an error is
    /// returned for the caller to log; loading never aborts the instance.
    /// InProgress and out-of-range values coerce to NotStarted. Door gating
    /// is re-applied to all bound doors afterwards in either case.
    ///
    /// [`serialize`]: Self::serialize
    pub fn deserialize(&mut self, data: &str) -> Result<(), ProgressError> {
        let result = self.load_tokens(data);
        if result.is_err() {
            for slot in &mut self.slots {
                slot.state = EncounterState::NotStarted;
            }
        }
        self.apply_gating_all();
        result
    }

    fn load_tokens(&mut self, data: &str) -> Result<(), ProgressError> {
        let mut tokens = data.split_whitespace();

        let header = tokens.next().unwrap_or_default();
        if header != SAVE_HEADER {
            return Err(ProgressError::HeaderMismatch {
                found: header.to_string(),
            });
        }

        let mut loaded = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let token = tokens.next().ok_or_else(|| ProgressError::MissingToken {
                slot: slot.id.clone(),
            })?;
            let raw: u8 = token.parse().map_err(|_| ProgressError::InvalidToken {
                slot: slot.id.clone(),
                token: token.to_string(),
            })?;
            loaded.push(EncounterState::from_saved(raw));
        }

        for (slot, state) in self.slots.iter_mut().zip(loaded) {
            slot.state = state;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_types::DoorKind;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, Default)]
    struct SharedGate {
        open: Rc<Cell<Option<bool>>>,
        toggle_count: Rc<Cell<u32>>,
    }

    impl DoorGate for SharedGate {
        fn set_passable(&mut self, passable: bool) {
            self.open.set(Some(passable));
            self.toggle_count.set(self.toggle_count.get() + 1);
        }
    }

    fn store3() -> EncounterStateStore {
        EncounterStateStore::new(["warden", "archivist", "maw"])
    }

    #[test]
    fn test_unknown_id_reads_not_started() {
        let store = store3();
        assert_eq!(store.state_of("nobody"), EncounterState::NotStarted);
        assert_eq!(store.state_of("warden"), EncounterState::NotStarted);
    }

    #[test]
    fn test_set_state_unknown_id_rejected() {
        let mut store = store3();
        let gate = SharedGate::default();
        let toggles = Rc::clone(&gate.toggle_count);
        store.register_door(&DoorConfig {
            door: DoorId(10),
            encounter: "warden".into(),
            kind: DoorKind::Room,
            boundary: String::new(),
        });
        store.bind_door(DoorId(10), Box::new(gate));
        let applied_at_bind = toggles.get();

        assert!(!store.set_state("nobody", EncounterState::Done));
        // No door gating side effects from the rejected transition
        assert_eq!(toggles.get(), applied_at_bind);
    }

    #[test]
    fn test_serialize_declaration_order() {
        let mut store = store3();
        store.set_state("maw", EncounterState::Done);
        store.set_state("warden", EncounterState::Failed);
        assert_eq!(store.serialize(), "DV 2 0 3");
    }

    #[test]
    fn test_round_trip_coerces_in_progress() {
        let mut store = store3();
        store.set_state("warden", EncounterState::Done);
        store.set_state("archivist", EncounterState::InProgress);
        store.set_state("maw", EncounterState::Failed);

        let saved = store.serialize();

        let mut reloaded = store3();
        reloaded.deserialize(&saved).expect("load should succeed");
        assert_eq!(reloaded.state_of("warden"), EncounterState::Done);
        assert_eq!(reloaded.state_of("archivist"), EncounterState::NotStarted);
        assert_eq!(reloaded.state_of("maw"), EncounterState::Failed);
    }

    #[test]
    fn test_wrong_header_resets_and_reports() {
        let mut store = store3();
        store.set_state("warden", EncounterState::Done);

        let err = store.deserialize("XX 3 0 0").unwrap_err();
        assert_eq!(
            err,
            ProgressError::HeaderMismatch {
                found: "XX".into()
            }
        );
        assert_eq!(store.state_of("warden"), EncounterState::NotStarted);
    }

    #[test]
    fn test_truncated_stream_resets_and_reports() {
        let mut store = store3();
        store.set_state("maw", EncounterState::Done);

        let err = store.deserialize("DV 3").unwrap_err();
        assert!(matches!(err, ProgressError::MissingToken { .. }));
        assert_eq!(store.state_of("maw"), EncounterState::NotStarted);
    }

    #[test]
    fn test_garbage_token_resets_and_reports() {
        let mut store = store3();
        let err = store.deserialize("DV 3 banana 0").unwrap_err();
        assert!(matches!(err, ProgressError::InvalidToken { .. }));
    }

    #[test]
    fn test_out_of_range_value_coerces() {
        let mut store = store3();
        store.deserialize("DV 3 9 2").expect("load should succeed");
        assert_eq!(store.state_of("warden"), EncounterState::Done);
        assert_eq!(store.state_of("archivist"), EncounterState::NotStarted);
        assert_eq!(store.state_of("maw"), EncounterState::Failed);
    }

    #[test]
    fn test_room_door_follows_owner_state() {
        let mut store = store3();
        store.register_door(&DoorConfig {
            door: DoorId(1),
            encounter: "warden".into(),
            kind: DoorKind::Room,
            boundary: "entrance".into(),
        });

        let gate = SharedGate::default();
        let open = Rc::clone(&gate.open);
        store.bind_door(DoorId(1), Box::new(gate));
        // Applied immediately on bind from current (NotStarted) state
        assert_eq!(open.get(), Some(true));

        store.set_state("warden", EncounterState::InProgress);
        assert_eq!(open.get(), Some(false));

        store.set_state("warden", EncounterState::Failed);
        assert_eq!(open.get(), Some(true));
    }

    #[test]
    fn test_passage_door_opens_on_done_only() {
        let mut store = store3();
        store.register_door(&DoorConfig {
            door: DoorId(2),
            encounter: "maw".into(),
            kind: DoorKind::Passage,
            boundary: "exit".into(),
        });

        let gate = SharedGate::default();
        let open = Rc::clone(&gate.open);
        store.bind_door(DoorId(2), Box::new(gate));
        assert_eq!(open.get(), Some(false));

        store.set_state("maw", EncounterState::InProgress);
        assert_eq!(open.get(), Some(false));
        store.set_state("maw", EncounterState::Failed);
        assert_eq!(open.get(), Some(false));
        store.set_state("maw", EncounterState::Done);
        assert_eq!(open.get(), Some(true));
    }

    #[test]
    fn test_door_against_unknown_encounter_skipped() {
        let mut store = store3();
        assert!(!store.register_door(&DoorConfig {
            door: DoorId(9),
            encounter: "ghost".into(),
            kind: DoorKind::Room,
            boundary: String::new(),
        }));
        assert!(!store.bind_door(DoorId(9), Box::new(SharedGate::default())));
    }

    #[test]
    fn test_deserialize_reapplies_gating() {
        let mut store = store3();
        store.register_door(&DoorConfig {
            door: DoorId(3),
            encounter: "warden".into(),
            kind: DoorKind::Passage,
            boundary: String::new(),
        });
        let gate = SharedGate::default();
        let open = Rc::clone(&gate.open);
        store.bind_door(DoorId(3), Box::new(gate));
        assert_eq!(open.get(), Some(false));

        store.deserialize("DV 3 0 0").expect("load should succeed");
        assert_eq!(open.get(), Some(true));
    }

    #[test]
    fn test_all_done() {
        let mut store = store3();
        assert!(!store.all_done());
        store.set_state("warden", EncounterState::Done);
        store.set_state("archivist", EncounterState::Done);
        assert!(!store.all_done());
        store.set_state("maw", EncounterState::Done);
        assert!(store.all_done());
    }
}
