//! Instance configuration loading
//!
//! Instance layout (encounters, scripts, door registrations) is static TOML
//! loaded once at instance start. The door registry tolerates references to
//! unknown encounters (logged, skipped); structural problems in the file
//! itself are load errors.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use thiserror::Error;

use delve_types::InstanceConfig;

/// Errors during instance config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read instance config {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse instance TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("duplicate encounter id '{id}'")]
    DuplicateEncounter { id: String },
}

/// Load and validate an instance config from a TOML file.
pub fn load_instance_config(path: &Path) -> Result<InstanceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: InstanceConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    validate(&config)?;
    Ok(config)
}

/// Structural validation beyond what serde enforces.
///
/// Encounter ids must be unique: declaration order is the save format's slot
/// order, so a duplicate would silently alias two slots. Doors referencing
/// unknown encounters are NOT an error here - the registration path warns and
/// skips them so one bad entry never takes the instance down.
pub fn validate(config: &InstanceConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for encounter in &config.encounters {
        if !seen.insert(encounter.id.as_str()) {
            return Err(ConfigError::DuplicateEncounter {
                id: encounter.id.clone(),
            });
        }
    }

    for door in &config.doors {
        if !seen.contains(door.encounter.as_str()) {
            tracing::warn!(
                door = door.door.0,
                encounter = %door.encounter,
                "door references unknown encounter; it will never be gated"
            );
        }
    }
    Ok(())
}
