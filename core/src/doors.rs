//! Door gating
//!
//! Keeps world traversal consistent with encounter progress. Doors themselves
//! are owned by the surrounding world/map system; the instance only holds
//! bindings that reference them through the `DoorGate` capability.
//!
//! Gating rules:
//! - Room doors are open iff the owning encounter is not InProgress.
//! - Passage doors open once the owning encounter is Done and never react
//!   to combat starting or wiping (escape routes stay shut until the win).

use delve_types::{DoorId, DoorKind, EncounterState};

use crate::host::DoorGate;

/// The open/closed state a door should have for a given owner state.
pub fn desired_open(kind: DoorKind, state: EncounterState) -> bool {
    match kind {
        DoorKind::Room => state != EncounterState::InProgress,
        DoorKind::Passage => state == EncounterState::Done,
    }
}

/// Binding of a registered door to its owning encounter slot.
///
/// Registered from static config at instance start; the live gate handle is
/// attached when the world object materializes and detached when it goes away.
pub struct DoorBinding {
    pub door: DoorId,
    /// Index of the owning encounter in declaration order.
    pub encounter_slot: usize,
    pub kind: DoorKind,
    pub boundary: String,
    gate: Option<Box<dyn DoorGate>>,
    /// Last open/closed state forwarded to the gate, for idempotence.
    applied: Option<bool>,
}

impl DoorBinding {
    pub fn new(door: DoorId, encounter_slot: usize, kind: DoorKind, boundary: String) -> Self {
        Self {
            door,
            encounter_slot,
            kind,
            boundary,
            gate: None,
            applied: None,
        }
    }

    /// Attach the live world object. The caller applies current gating
    /// immediately afterwards.
    pub fn bind(&mut self, gate: Box<dyn DoorGate>) {
        self.gate = Some(gate);
        self.applied = None;
    }

    /// Detach on dematerialization.
    pub fn unbind(&mut self) {
        self.gate = None;
        self.applied = None;
    }

    pub fn is_bound(&self) -> bool {
        self.gate.is_some()
    }

    /// Apply gating derived from the owner's state. Idempotent: re-applying
    /// the same open/closed state is not forwarded to the host. Returns the
    /// new open state when a toggle was actually forwarded.
    pub fn apply(&mut self, owner_state: EncounterState) -> Option<bool> {
        let open = desired_open(self.kind, owner_state);
        if self.applied == Some(open) {
            return None;
        }
        let gate = self.gate.as_mut()?;
        gate.set_passable(open);
        self.applied = Some(open);
        Some(open)
    }
}

impl std::fmt::Debug for DoorBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorBinding")
            .field("door", &self.door)
            .field("encounter_slot", &self.encounter_slot)
            .field("kind", &self.kind)
            .field("boundary", &self.boundary)
            .field("bound", &self.gate.is_some())
            .field("applied", &self.applied)
            .finish()
    }
}
