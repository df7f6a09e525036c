use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use delve_core::{ActorId, DoorId, DungeonInstance};

use crate::sim::{SimDoor, SimHost};

/// Holds all state for one REPL session.
/// This is a lightweight container - logic lives in the core and sim types.
pub struct CliContext {
    pub host: SimHost,
    /// The loaded instance. None until a `load` succeeds.
    pub instance: Option<DungeonInstance>,
    /// Boss actor for each engaged encounter, spawned on first engage.
    pub bosses: HashMap<String, ActorId>,
    /// Open state of every bound door, shared with its gate.
    pub doors: Vec<(DoorId, Rc<Cell<Option<bool>>>)>,
    pub players: Vec<ActorId>,
}

impl CliContext {
    pub fn new() -> Self {
        Self {
            host: SimHost::new(),
            instance: None,
            bosses: HashMap::new(),
            doors: Vec::new(),
            players: Vec::new(),
        }
    }

    /// Swap in a freshly built instance and materialize its doors.
    pub fn install(&mut self, mut instance: DungeonInstance) {
        self.bosses.clear();
        self.doors.clear();

        let door_ids: Vec<DoorId> = instance
            .store()
            .door_bindings()
            .iter()
            .map(|b| b.door)
            .collect();
        for door in door_ids {
            let open = Rc::new(Cell::new(None));
            instance.on_door_spawned(
                door,
                Box::new(SimDoor {
                    open: Rc::clone(&open),
                }),
            );
            self.doors.push((door, open));
        }

        self.instance = Some(instance);
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
