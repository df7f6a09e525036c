//! Per-encounter combat state machine
//!
//! One controller drives one boss encounter: Idle until first aggression,
//! Engaged while the scripted event schedule runs, and either permanently
//! Victory or cleaned up and re-armed to Idle after an evade.
//!
//! Each tick while Engaged: advance the scheduler by elapsed time, drain due
//! events in order, dispatch each through the host capability traits, then
//! fall back to an auto-attack if no scripted action consumed the tick.

use std::time::Duration;

use chrono::NaiveDateTime;

use delve_types::{ActionTarget, ActorId, EncounterAction, EncounterState, Position};

use super::script::{EncounterScript, EventSpec};
use crate::host::EncounterHost;
use crate::progress::EncounterStateStore;
use crate::registry::ActorRegistry;
use crate::scheduler::EventScheduler;
use crate::signals::{Disengage, EncounterSignal};
use crate::targeting;

/// Combat lifecycle of one encounter.
///
/// There is no stored Evaded state: an evade performs its cleanup and lands
/// straight back in Idle, ready for a fresh attempt. Victory is permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatState {
    #[default]
    Idle,
    Engaged,
    Victory,
}

/// Drives one encounter's script against the shared instance state store.
#[derive(Debug)]
pub struct EncounterController {
    script: EncounterScript,
    state: CombatState,
    scheduler: EventScheduler,
    registry: ActorRegistry,
    boss: Option<ActorId>,
    combat_time: Duration,
    /// When the current engagement started (wall clock, for transcripts).
    engaged_at: Option<NaiveDateTime>,
    /// Parallel to `script.thresholds()`: fired once per engagement.
    fired_thresholds: Vec<bool>,
}

impl EncounterController {
    pub fn new(script: EncounterScript) -> Self {
        let threshold_count = script.thresholds().len();
        Self {
            script,
            state: CombatState::Idle,
            scheduler: EventScheduler::new(),
            registry: ActorRegistry::new(),
            boss: None,
            combat_time: Duration::ZERO,
            engaged_at: None,
            fired_thresholds: vec![false; threshold_count],
        }
    }

    pub fn script(&self) -> &EncounterScript {
        &self.script
    }

    pub fn combat_state(&self) -> CombatState {
        self.state
    }

    pub fn boss(&self) -> Option<ActorId> {
        self.boss
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ActorRegistry {
        &mut self.registry
    }

    pub fn combat_time(&self) -> Duration {
        self.combat_time
    }

    pub fn engaged_at(&self) -> Option<NaiveDateTime> {
        self.engaged_at
    }

    // ─── Transitions ─────────────────────────────────────────────────────────

    /// First aggression: Idle -> Engaged.
    ///
    /// Rejected (logged no-op) after Victory, while already Engaged, or when
    /// the store already records the encounter as Done - a won boss is never
    /// re-fought within the instance's lifetime.
    pub fn engage(
        &mut self,
        boss: ActorId,
        store: &mut EncounterStateStore,
    ) -> Vec<EncounterSignal> {
        if self.state == CombatState::Engaged {
            return Vec::new();
        }
        if self.state == CombatState::Victory
            || store.state_of(&self.script.encounter_id).is_permanent()
        {
            tracing::warn!(
                encounter = %self.script.encounter_id,
                "engage rejected: encounter already done"
            );
            return Vec::new();
        }

        self.state = CombatState::Engaged;
        self.boss = Some(boss);
        self.combat_time = Duration::ZERO;
        self.engaged_at = Some(chrono::Local::now().naive_local());
        self.fired_thresholds.fill(false);
        self.scheduler.clear();
        for event in self.script.initial_events() {
            self.scheduler.schedule(event.id, event.delay);
        }

        let mut signals = vec![EncounterSignal::Engaged {
            encounter: self.script.encounter_id.clone(),
        }];
        signals.extend(self.transition(store, EncounterState::InProgress));
        signals
    }

    /// Boss defeated: Engaged -> Victory (permanent).
    pub fn notify_victory<H: EncounterHost + ?Sized>(
        &mut self,
        host: &mut H,
        store: &mut EncounterStateStore,
    ) -> Vec<EncounterSignal> {
        if self.state != CombatState::Engaged {
            tracing::debug!(
                encounter = %self.script.encounter_id,
                "victory notification outside combat ignored"
            );
            return Vec::new();
        }

        self.cleanup(host);
        self.state = CombatState::Victory;

        let mut signals = self.transition(store, EncounterState::Done);
        signals.push(EncounterSignal::Disengaged {
            encounter: self.script.encounter_id.clone(),
            outcome: Disengage::Victory,
        });
        if store.all_done() {
            signals.push(EncounterSignal::InstanceComplete);
        }
        signals
    }

    /// Host-initiated reset (same path as losing all targets mid-tick).
    pub fn reset<H: EncounterHost + ?Sized>(
        &mut self,
        host: &mut H,
        store: &mut EncounterStateStore,
    ) -> Vec<EncounterSignal> {
        if self.state != CombatState::Engaged {
            return Vec::new();
        }
        self.evade(host, store)
    }

    /// Engaged -> Idle with full cleanup: pending events cancelled atomically,
    /// helpers despawned, consumed side-objects restored for the next attempt.
    fn evade<H: EncounterHost + ?Sized>(
        &mut self,
        host: &mut H,
        store: &mut EncounterStateStore,
    ) -> Vec<EncounterSignal> {
        self.cleanup(host);
        for &object in self.script.restore_objects() {
            host.restore_object(object);
        }
        // Re-armed for a future retry
        self.state = CombatState::Idle;

        let mut signals = self.transition(store, EncounterState::Failed);
        signals.push(EncounterSignal::Disengaged {
            encounter: self.script.encounter_id.clone(),
            outcome: Disengage::Evaded,
        });
        signals
    }

    /// Shared Engaged-exit bookkeeping.
    fn cleanup<H: EncounterHost + ?Sized>(&mut self, host: &mut H) {
        self.scheduler.clear();
        for (_, actor) in self.registry.drain() {
            host.despawn(actor);
        }
        self.boss = None;
    }

    fn transition(
        &self,
        store: &mut EncounterStateStore,
        new: EncounterState,
    ) -> Vec<EncounterSignal> {
        let old = store.state_of(&self.script.encounter_id);
        if !store.set_state(&self.script.encounter_id, new) {
            return Vec::new();
        }
        vec![EncounterSignal::StateChanged {
            encounter: self.script.encounter_id.clone(),
            old,
            new,
        }]
    }

    // ─── Per-tick update ─────────────────────────────────────────────────────

    /// One cooperative update with the elapsed time since the previous tick.
    /// Only does work while Engaged.
    pub fn tick<H: EncounterHost + ?Sized>(
        &mut self,
        elapsed: Duration,
        host: &mut H,
        store: &mut EncounterStateStore,
    ) -> Vec<EncounterSignal> {
        if self.state != CombatState::Engaged {
            return Vec::new();
        }
        let Some(boss) = self.boss else {
            return Vec::new();
        };

        // No valid targets left: the attempt is over
        if host.victim_of(boss).is_none() {
            return self.evade(host, store);
        }

        self.combat_time += elapsed;
        self.check_thresholds(boss, host);

        self.scheduler.advance(elapsed);

        let mut signals = Vec::new();
        let mut acted = false;
        while let Some(event_id) = self.scheduler.pop_due() {
            let Some(spec) = self.script.event(event_id).cloned() else {
                // Unknown ids are absent by definition; scheduling is total
                tracing::warn!(
                    encounter = %self.script.encounter_id,
                    event = %event_id,
                    "due event has no action binding"
                );
                continue;
            };

            acted |= self.dispatch(&spec, boss, host);
            signals.push(EncounterSignal::EventFired {
                encounter: self.script.encounter_id.clone(),
                event: spec.id,
                name: spec.name.clone(),
            });

            if let Some(delay) = spec.reschedule {
                self.scheduler.schedule(spec.id, delay);
            }
        }

        if !acted {
            host.auto_attack(boss);
        }
        signals
    }

    /// Schedule threshold events whose HP gate was crossed this tick. They go
    /// through the scheduler with zero delay so the drain keeps its ordering.
    fn check_thresholds<H: EncounterHost + ?Sized>(&mut self, boss: ActorId, host: &mut H) {
        let Some(health) = host.health_fraction(boss) else {
            return;
        };
        for (idx, threshold) in self.script.thresholds().iter().enumerate() {
            if !self.fired_thresholds[idx] && health <= threshold.fraction {
                self.fired_thresholds[idx] = true;
                self.scheduler.schedule(threshold.event, Duration::ZERO);
            }
        }
    }

    // ─── Action dispatch ─────────────────────────────────────────────────────

    /// Dispatch one due event's action. Returns whether the action actually
    /// consumed the tick; a skipped action (absent target, refused summon)
    /// leaves the melee fallback to run.
    fn dispatch<H: EncounterHost + ?Sized>(
        &mut self,
        spec: &EventSpec,
        boss: ActorId,
        host: &mut H,
    ) -> bool {
        match &spec.action {
            EncounterAction::CastAbility { ability, target } => {
                let Some(target) = self.resolve_target(target, boss, host) else {
                    tracing::debug!(
                        encounter = %self.script.encounter_id,
                        event = %spec.id,
                        "cast skipped: target not present"
                    );
                    return false;
                };
                host.cast_ability(boss, *ability, Some(target));
                true
            }
            EncounterAction::SummonHelper { npc, tag, offset } => {
                let Some(at) = host.position_of(boss).map(|p| p.offset_by(offset)) else {
                    return false;
                };
                match host.summon(*npc, at) {
                    Some(actor) => {
                        self.registry.record(tag.clone(), actor);
                        true
                    }
                    None => {
                        tracing::debug!(
                            encounter = %self.script.encounter_id,
                            npc = npc.0,
                            "summon refused by host"
                        );
                        false
                    }
                }
            }
            EncounterAction::Reposition { to } => {
                host.move_actor(boss, *to);
                true
            }
            EncounterAction::ApplyImmunity { aura } => {
                host.apply_aura(boss, *aura);
                true
            }
            EncounterAction::RemoveImmunity { aura } => {
                host.remove_aura(boss, *aura);
                true
            }
            EncounterAction::DespawnHelper { tag } => match self.registry.take(tag) {
                Some(actor) => {
                    host.despawn(actor);
                    true
                }
                None => false,
            },
        }
    }

    fn resolve_target<H: EncounterHost + ?Sized>(
        &self,
        target: &ActionTarget,
        boss: ActorId,
        host: &H,
    ) -> Option<ActorId> {
        match target {
            // A victim mid-death-animation still shows up in the threat query;
            // casting at it would be wasted
            ActionTarget::CurrentVictim => host.victim_of(boss).filter(|&v| host.is_alive(v)),
            ActionTarget::Boss => Some(boss),
            ActionTarget::Tagged { tag } => self.registry.get(tag),
            ActionTarget::Nearest { filter, range } => {
                let origin: Position = host.position_of(boss)?;
                let candidates = host.actors_near(origin, *range);
                targeting::select_nearest(&candidates, filter, &origin).map(|s| s.id)
            }
        }
    }
}
