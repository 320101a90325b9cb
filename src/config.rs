use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::navdata::Coordinates;

/// Aircraft-family differences in how revisions are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct FpmConfig {
    /// Constraint edits on the active plan go through a temporary plan
    pub tmpy_on_constraint_edit: bool,
    pub tmpy_on_overfly: bool,
    pub tmpy_on_delete_waypoint: bool,
    /// Lateral revisions are accepted while a temporary plan is shown
    pub allow_revisions_on_tmpy: bool,
    pub allow_non_active_fix_infos: bool,
    pub num_secondary_plans: usize,
}

impl FpmConfig {
    pub fn a320_honeywell_h3() -> Self {
        Self {
            tmpy_on_constraint_edit: false,
            tmpy_on_overfly: false,
            tmpy_on_delete_waypoint: true,
            allow_revisions_on_tmpy: true,
            allow_non_active_fix_infos: false,
            num_secondary_plans: 1,
        }
    }

    pub fn a380x() -> Self {
        Self {
            tmpy_on_constraint_edit: true,
            tmpy_on_overfly: true,
            tmpy_on_delete_waypoint: true,
            allow_revisions_on_tmpy: true,
            allow_non_active_fix_infos: true,
            num_secondary_plans: 1,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a320" | "a320_honeywell_h3" => Some(Self::a320_honeywell_h3()),
            "a380" | "a380x" => Some(Self::a380x()),
            _ => None,
        }
    }
}

impl Default for FpmConfig {
    fn default() -> Self {
        Self::a320_honeywell_h3()
    }
}

/// Initial aircraft state for the CLI position provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftState {
    pub position: Coordinates,
    #[serde(default)]
    pub true_track: f64,
}

impl Default for AircraftState {
    fn default() -> Self {
        Self {
            position: Coordinates::new(0.0, 0.0),
            true_track: 0.0,
        }
    }
}

/// CLI configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub navdata: Option<PathBuf>,
    #[serde(default = "default_aircraft")]
    pub aircraft: String,
    /// Overrides the aircraft preset when present
    #[serde(default)]
    pub fpm: Option<FpmConfig>,
    #[serde(default)]
    pub initial_state: AircraftState,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_aircraft() -> String {
    "a320".to_string()
}

fn default_event_capacity() -> usize {
    256
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            navdata: None,
            aircraft: default_aircraft(),
            fpm: None,
            initial_state: AircraftState::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;
        Ok(config)
    }

    /// The inline config if given, the named preset otherwise
    pub fn fpm_config(&self) -> Result<FpmConfig> {
        if let Some(fpm) = self.fpm {
            return Ok(fpm);
        }
        match FpmConfig::preset(&self.aircraft) {
            Some(config) => Ok(config),
            None => bail!("Unknown aircraft preset: {}", self.aircraft),
        }
    }
}
