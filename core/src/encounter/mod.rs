//! Encounter system
//!
//! This module provides:
//! - **EncounterScript**: validated runtime form of an `[[encounter]]` config
//!   block (timed events, HP thresholds, restore list)
//! - **EncounterController**: the per-encounter combat state machine driving
//!   the event scheduler against the shared instance state store

mod controller;
mod script;


pub use controller::{CombatState, EncounterController};
pub use script::{EncounterScript, EventSpec, HpThreshold, ScriptError};
