//! Compiled encounter scripts
//!
//! An `EncounterScript` is the validated runtime form of one `[[encounter]]`
//! config block: timed events with their actions, HP thresholds, and the
//! objects restored after a wipe. Event dispatch goes through a lookup table
//! built here - duplicate event ids are a load error, so exactly one action
//! exists per id.

use std::time::Duration;

use hashbrown::HashMap;
use thiserror::Error;

use delve_types::{EncounterAction, EncounterConfig, EventId, GameObjectId};

/// Script validation errors, raised at instance load.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("encounter '{encounter}' declares event {event} more than once")]
    DuplicateEvent { encounter: String, event: EventId },

    #[error("encounter '{encounter}' has an invalid delay on event {event}")]
    InvalidDelay { encounter: String, event: EventId },

    #[error("encounter '{encounter}' threshold references unknown event {event}")]
    UnknownThresholdEvent { encounter: String, event: EventId },
}

/// One timed event of a script, with its resolved action.
#[derive(Debug, Clone)]
pub struct EventSpec {
    pub id: EventId,
    pub name: String,
    /// Delay before the first firing.
    pub delay: Duration,
    pub action: EncounterAction,
    /// Re-arm delay after firing (None = one-shot).
    pub reschedule: Option<Duration>,
    /// Scheduled at engage time; threshold-fired events set this to false.
    pub initial: bool,
}

/// HP threshold: fires `event` once when boss health first reaches
/// `fraction` (0.0..=1.0) or below.
#[derive(Debug, Clone, Copy)]
pub struct HpThreshold {
    pub fraction: f32,
    pub event: EventId,
}

/// Validated runtime script for one encounter.
#[derive(Debug, Clone)]
pub struct EncounterScript {
    pub encounter_id: String,
    pub name: String,
    events: Vec<EventSpec>,
    by_id: HashMap<EventId, usize>,
    thresholds: Vec<HpThreshold>,
    restore_objects: Vec<GameObjectId>,
}

impl EncounterScript {
    /// Compile and validate a config block.
    pub fn from_config(config: &EncounterConfig) -> Result<Self, ScriptError> {
        let mut events = Vec::with_capacity(config.events.len());
        let mut by_id = HashMap::with_capacity(config.events.len());

        for event in &config.events {
            // Rejects negative, NaN, infinite and overflowing values in one
            // place; TOML happily parses `inf` and `nan` as float literals
            let invalid = |_| ScriptError::InvalidDelay {
                encounter: config.id.clone(),
                event: event.id,
            };
            let delay = Duration::try_from_secs_f32(event.delay_secs).map_err(invalid)?;
            let reschedule = event
                .reschedule_secs
                .map(Duration::try_from_secs_f32)
                .transpose()
                .map_err(invalid)?;

            if by_id.insert(event.id, events.len()).is_some() {
                return Err(ScriptError::DuplicateEvent {
                    encounter: config.id.clone(),
                    event: event.id,
                });
            }
            events.push(EventSpec {
                id: event.id,
                name: event.name.clone(),
                delay,
                action: event.action.clone(),
                reschedule,
                initial: event.initial,
            });
        }

        let mut thresholds = Vec::with_capacity(config.thresholds.len());
        for threshold in &config.thresholds {
            if !by_id.contains_key(&threshold.event) {
                return Err(ScriptError::UnknownThresholdEvent {
                    encounter: config.id.clone(),
                    event: threshold.event,
                });
            }
            thresholds.push(HpThreshold {
                fraction: (threshold.hp_percent / 100.0).clamp(0.0, 1.0),
                event: threshold.event,
            });
        }

        Ok(Self {
            encounter_id: config.id.clone(),
            name: config.name.clone(),
            events,
            by_id,
            thresholds,
            restore_objects: config.restore_objects.clone(),
        })
    }

    /// Resolve an event id through the lookup table.
    pub fn event(&self, id: EventId) -> Option<&EventSpec> {
        self.by_id.get(&id).map(|&idx| &self.events[idx])
    }

    /// Events scheduled when the fight starts.
    pub fn initial_events(&self) -> impl Iterator<Item = &EventSpec> {
        self.events.iter().filter(|e| e.initial)
    }

    pub fn events(&self) -> &[EventSpec] {
        &self.events
    }

    pub fn thresholds(&self) -> &[HpThreshold] {
        &self.thresholds
    }

    /// Consumable side-objects to restore after a wipe.
    pub fn restore_objects(&self) -> &[GameObjectId] {
        &self.restore_objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_types::{AbilityId, ActionTarget, EventConfig, HpThresholdConfig};

    fn event(id: u32, delay: f32) -> EventConfig {
        EventConfig {
            id: EventId(id),
            name: format!("event_{id}"),
            delay_secs: delay,
            action: EncounterAction::CastAbility {
                ability: AbilityId(100 + id),
                target: ActionTarget::CurrentVictim,
            },
            reschedule_secs: None,
            initial: true,
        }
    }

    fn config(events: Vec<EventConfig>, thresholds: Vec<HpThresholdConfig>) -> EncounterConfig {
        EncounterConfig {
            id: "warden".into(),
            name: "Vault Warden".into(),
            events,
            thresholds,
            restore_objects: Vec::new(),
        }
    }

    #[test]
    fn test_compile_and_lookup() {
        let script =
            EncounterScript::from_config(&config(vec![event(1, 5.0), event(2, 3.0)], vec![]))
                .expect("valid script");

        assert_eq!(script.events().len(), 2);
        assert!(script.event(EventId(1)).is_some());
        assert!(script.event(EventId(9)).is_none());
        assert_eq!(script.initial_events().count(), 2);
    }

    #[test]
    fn test_duplicate_event_rejected() {
        let err = EncounterScript::from_config(&config(vec![event(1, 5.0), event(1, 3.0)], vec![]))
            .unwrap_err();
        assert_eq!(
            err,
            ScriptError::DuplicateEvent {
                encounter: "warden".into(),
                event: EventId(1),
            }
        );
    }

    #[test]
    fn test_invalid_delays_rejected() {
        // A bad float in the config is a load error, never a panic
        for delay in [-2.0, f32::INFINITY, f32::NAN] {
            let err =
                EncounterScript::from_config(&config(vec![event(1, delay)], vec![])).unwrap_err();
            assert!(matches!(err, ScriptError::InvalidDelay { .. }));
        }

        let err = EncounterScript::from_config(&config(
            vec![EventConfig {
                reschedule_secs: Some(f32::NAN),
                ..event(1, 5.0)
            }],
            vec![],
        ))
        .unwrap_err();
        assert!(matches!(err, ScriptError::InvalidDelay { .. }));
    }

    #[test]
    fn test_threshold_must_reference_known_event() {
        let err = EncounterScript::from_config(&config(
            vec![event(1, 5.0)],
            vec![HpThresholdConfig {
                hp_percent: 50.0,
                event: EventId(7),
            }],
        ))
        .unwrap_err();
        assert!(matches!(err, ScriptError::UnknownThresholdEvent { .. }));

        let ok = EncounterScript::from_config(&config(
            vec![event(1, 5.0)],
            vec![HpThresholdConfig {
                hp_percent: 50.0,
                event: EventId(1),
            }],
        ))
        .expect("valid script");
        assert!((ok.thresholds()[0].fraction - 0.5).abs() < f32::EPSILON);
    }
}
