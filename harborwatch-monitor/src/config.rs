//! Monitor configuration
//!
//! Loaded from a camelCase JSON file. Resolution order: an explicit
//! `--config` path, then `config.json` in the platform config directory,
//! then built-in defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use harborwatch_core::geofence::{validate_zone, ZoneDefinition};
use harborwatch_core::session::SessionSettings;
use harborwatch_core::vessel::VesselId;

use crate::feed::TimeSource;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default sweep period in seconds
pub const DEFAULT_TICK_SECONDS: u64 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid zone '{name}': {reasons}")]
    InvalidZone { name: String, reasons: String },
    #[error("tickSeconds must be greater than 0")]
    ZeroTick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    pub session: SessionSettings,
    /// Zones installed at startup
    pub zones: Vec<ZoneDefinition>,
    /// Vessels whose tracks are recorded
    pub follow: Vec<VesselId>,
    /// Sweep period
    pub tick_seconds: u64,
    pub time_source: TimeSource,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            session: SessionSettings::default(),
            zones: Vec::new(),
            follow: Vec::new(),
            tick_seconds: DEFAULT_TICK_SECONDS,
            time_source: TimeSource::default(),
        }
    }
}

impl MonitorConfig {
    /// `<config dir>/harborwatch/config.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "harborwatch").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: MonitorConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` if given, else the default file if it exists, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                log::debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_seconds == 0 {
            return Err(ConfigError::ZeroTick);
        }
        for zone in &self.zones {
            if let Err(errors) = validate_zone(zone) {
                return Err(ConfigError::InvalidZone {
                    name: zone.name.clone(),
                    reasons: errors
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("; "),
                });
            }
        }
        Ok(())
    }
}
