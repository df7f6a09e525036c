//! Simulated host engine for the REPL
//!
//! Implements the core's capability traits over a tiny in-memory world:
//! players, bosses and summoned helpers with positions, health and liveness.
//! Every mutating call prints a transcript line so a session reads like a
//! combat log.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use delve_core::{
    AbilityId, ActorId, ActorKind, ActorSnapshot, Affectable, AuraId, Castable, DoorGate,
    EncounterHost, GameObjectId, Mobile, NpcId, Position, Senses, Summoner,
};

fn stamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[derive(Debug, Clone)]
struct SimActor {
    kind: ActorKind,
    position: Position,
    alive: bool,
    /// Health fraction 0.0..=1.0.
    health: f32,
}

/// In-memory world standing in for the real host engine.
#[derive(Debug, Default)]
pub struct SimHost {
    actors: HashMap<ActorId, SimActor>,
    next_id: u64,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: ActorKind, position: Position) -> ActorId {
        self.next_id += 1;
        let id = ActorId(self.next_id);
        self.actors.insert(
            id,
            SimActor {
                kind,
                position,
                alive: true,
                health: 1.0,
            },
        );
        id
    }

    pub fn spawn_player(&mut self, position: Position) -> ActorId {
        let id = self.insert(ActorKind::Player, position);
        println!("[{}] player {} joins the instance", stamp(), id);
        id
    }

    pub fn spawn_boss(&mut self, name: &str) -> ActorId {
        let id = self.insert(ActorKind::Creature, Position::default());
        println!("[{}] {} materializes ({})", stamp(), name, id);
        id
    }

    /// Set a boss's health fraction (simulates incoming damage).
    pub fn set_health(&mut self, actor: ActorId, fraction: f32) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.health = fraction.clamp(0.0, 1.0);
        }
    }

    /// Kill every player (a wipe); the next tick sees no valid targets.
    pub fn kill_players(&mut self) {
        for actor in self.actors.values_mut() {
            if actor.kind == ActorKind::Player {
                actor.alive = false;
            }
        }
        println!("[{}] the party wipes", stamp());
    }

    pub fn revive_players(&mut self) {
        for actor in self.actors.values_mut() {
            if actor.kind == ActorKind::Player {
                actor.alive = true;
                actor.health = 1.0;
            }
        }
        println!("[{}] the party recovers", stamp());
    }

    pub fn player_count(&self) -> usize {
        self.actors
            .values()
            .filter(|a| a.kind == ActorKind::Player && a.alive)
            .count()
    }
}

impl Castable for SimHost {
    fn cast_ability(&mut self, caster: ActorId, ability: AbilityId, target: Option<ActorId>) {
        match target {
            Some(target) => println!(
                "[{}] {} casts ability {} on {}",
                stamp(),
                caster,
                ability.0,
                target
            ),
            None => println!("[{}] {} casts ability {}", stamp(), caster, ability.0),
        }
    }
}

impl Affectable for SimHost {
    fn apply_aura(&mut self, target: ActorId, aura: AuraId) {
        println!("[{}] aura {} applied to {}", stamp(), aura.0, target);
    }

    fn remove_aura(&mut self, target: ActorId, aura: AuraId) {
        println!("[{}] aura {} removed from {}", stamp(), aura.0, target);
    }
}

impl Mobile for SimHost {
    fn position_of(&self, actor: ActorId) -> Option<Position> {
        self.actors.get(&actor).map(|a| a.position)
    }

    fn move_actor(&mut self, actor: ActorId, to: Position) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.position = to;
            println!(
                "[{}] {} repositions to ({:.1}, {:.1}, {:.1})",
                stamp(),
                actor,
                to.x,
                to.y,
                to.z
            );
        }
    }
}

impl Summoner for SimHost {
    fn summon(&mut self, npc: NpcId, at: Position) -> Option<ActorId> {
        let id = self.insert(ActorKind::Helper, at);
        println!("[{}] helper npc {} summoned as {}", stamp(), npc.0, id);
        Some(id)
    }

    fn despawn(&mut self, actor: ActorId) {
        if self.actors.remove(&actor).is_some() {
            println!("[{}] {} despawns", stamp(), actor);
        }
    }

    fn restore_object(&mut self, object: GameObjectId) {
        println!("[{}] world object {} restored", stamp(), object.0);
    }
}

impl Senses for SimHost {
    fn victim_of(&self, _actor: ActorId) -> Option<ActorId> {
        // Bosses always target the first living player
        self.actors
            .iter()
            .filter(|(_, a)| a.kind == ActorKind::Player && a.alive)
            .map(|(&id, _)| id)
            .min_by_key(|id| id.0)
    }

    fn actors_near(&self, origin: Position, range: f32) -> Vec<ActorSnapshot> {
        self.actors
            .iter()
            .filter(|(_, a)| a.position.distance_to(&origin) <= range)
            .map(|(&id, a)| ActorSnapshot {
                id,
                kind: a.kind,
                position: a.position,
                alive: a.alive,
            })
            .collect()
    }

    fn health_fraction(&self, actor: ActorId) -> Option<f32> {
        self.actors.get(&actor).map(|a| a.health)
    }

    fn is_alive(&self, actor: ActorId) -> bool {
        self.actors.get(&actor).is_some_and(|a| a.alive)
    }
}

impl EncounterHost for SimHost {
    fn auto_attack(&mut self, attacker: ActorId) {
        if let Some(victim) = self.victim_of(attacker) {
            println!("[{}] {} swings at {}", stamp(), attacker, victim);
        }
    }
}

/// Door stand-in: shares its open state with the REPL for the `doors` view.
#[derive(Debug)]
pub struct SimDoor {
    pub open: Rc<Cell<Option<bool>>>,
}

impl DoorGate for SimDoor {
    fn set_passable(&mut self, passable: bool) {
        self.open.set(Some(passable));
    }
}
