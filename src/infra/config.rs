//! Configuration loading from TOML files
//!
//! All thresholds ship with the engine's fixed defaults and can be overridden
//! per deployment. Zone definitions are carried as opaque configuration; the
//! engine does not interpret them beyond storage.

use crate::domain::error::EngineError;
use crate::domain::types::Zone;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdsConfig {
    /// Seconds of stationary time before a person is loitering
    #[serde(default = "default_loitering_secs")]
    pub loitering_secs: f64,
    /// Seconds without a person nearby before an object is abandoned
    #[serde(default = "default_abandoned_object_secs")]
    pub abandoned_object_secs: f64,
    /// Step distance (pixels) below which a track counts as stationary
    #[serde(default = "default_movement_px")]
    pub movement_px: f64,
    /// Seconds after last observation before a track is swept
    #[serde(default = "default_track_staleness_secs")]
    pub track_staleness_secs: f64,
    /// Seconds after first observation before a candidate is swept
    #[serde(default = "default_candidate_staleness_secs")]
    pub candidate_staleness_secs: f64,
    /// Maximum center distance (pixels) for detection-to-track association
    #[serde(default = "default_association_distance_px")]
    pub association_distance_px: f64,
    /// Maximum age (seconds) of a track's last position for association
    #[serde(default = "default_association_recency_secs")]
    pub association_recency_secs: f64,
    /// Person-to-object distance (pixels) that suppresses abandonment
    #[serde(default = "default_abandoned_proximity_px")]
    pub abandoned_proximity_px: f64,
    /// Population variance of step distances flagged as erratic
    #[serde(default = "default_movement_variance")]
    pub movement_variance: f64,
    /// Grid cell size (pixels) for candidate keying; 0 keeps exact centers
    #[serde(default)]
    pub candidate_cell_size: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            loitering_secs: default_loitering_secs(),
            abandoned_object_secs: default_abandoned_object_secs(),
            movement_px: default_movement_px(),
            track_staleness_secs: default_track_staleness_secs(),
            candidate_staleness_secs: default_candidate_staleness_secs(),
            association_distance_px: default_association_distance_px(),
            association_recency_secs: default_association_recency_secs(),
            abandoned_proximity_px: default_abandoned_proximity_px(),
            movement_variance: default_movement_variance(),
            candidate_cell_size: 0.0,
        }
    }
}

fn default_loitering_secs() -> f64 {
    10.0
}

fn default_abandoned_object_secs() -> f64 {
    5.0
}

fn default_movement_px() -> f64 {
    20.0
}

fn default_track_staleness_secs() -> f64 {
    5.0
}

fn default_candidate_staleness_secs() -> f64 {
    60.0
}

fn default_association_distance_px() -> f64 {
    100.0
}

fn default_association_recency_secs() -> f64 {
    1.0
}

fn default_abandoned_proximity_px() -> f64 {
    150.0
}

fn default_movement_variance() -> f64 {
    1000.0
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ZonesConfig {
    #[serde(default)]
    pub restricted: Vec<Zone>,
    #[serde(default)]
    pub monitoring: Vec<Zone>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for anomaly event egress (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "anomalies.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub zones: ZonesConfig,
    #[serde(default)]
    pub egress: EgressConfig,
}

/// Main configuration struct used throughout the engine
#[derive(Debug, Clone)]
pub struct Config {
    loitering_secs: f64,
    abandoned_object_secs: f64,
    movement_px: f64,
    track_staleness_secs: f64,
    candidate_staleness_secs: f64,
    association_distance_px: f64,
    association_recency_secs: f64,
    abandoned_proximity_px: f64,
    movement_variance: f64,
    candidate_cell_size: f64,
    restricted_zones: Vec<Zone>,
    monitoring_zones: Vec<Zone>,
    egress_file: String,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, source: &str) -> Self {
        Self {
            loitering_secs: toml_config.thresholds.loitering_secs,
            abandoned_object_secs: toml_config.thresholds.abandoned_object_secs,
            movement_px: toml_config.thresholds.movement_px,
            track_staleness_secs: toml_config.thresholds.track_staleness_secs,
            candidate_staleness_secs: toml_config.thresholds.candidate_staleness_secs,
            association_distance_px: toml_config.thresholds.association_distance_px,
            association_recency_secs: toml_config.thresholds.association_recency_secs,
            abandoned_proximity_px: toml_config.thresholds.abandoned_proximity_px,
            movement_variance: toml_config.thresholds.movement_variance,
            candidate_cell_size: toml_config.thresholds.candidate_cell_size,
            restricted_zones: toml_config.zones.restricted,
            monitoring_zones: toml_config.zones.monitoring,
            egress_file: toml_config.egress.file,
            config_file: source.to_string(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration - tries the TOML file, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Reject thresholds the engine cannot operate with.
    /// Called at engine construction; a failure here is fatal.
    pub fn validate(&self) -> Result<(), EngineError> {
        let positive = [
            ("thresholds.loitering_secs", self.loitering_secs),
            ("thresholds.abandoned_object_secs", self.abandoned_object_secs),
            ("thresholds.movement_px", self.movement_px),
            ("thresholds.track_staleness_secs", self.track_staleness_secs),
            ("thresholds.candidate_staleness_secs", self.candidate_staleness_secs),
            ("thresholds.association_distance_px", self.association_distance_px),
            ("thresholds.association_recency_secs", self.association_recency_secs),
            ("thresholds.abandoned_proximity_px", self.abandoned_proximity_px),
            ("thresholds.movement_variance", self.movement_variance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::Configuration(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }
        if !self.candidate_cell_size.is_finite() || self.candidate_cell_size < 0.0 {
            return Err(EngineError::Configuration(format!(
                "thresholds.candidate_cell_size must be >= 0, got {}",
                self.candidate_cell_size
            )));
        }
        Ok(())
    }

    // Getters for all config fields
    pub fn loitering_secs(&self) -> f64 {
        self.loitering_secs
    }

    pub fn abandoned_object_secs(&self) -> f64 {
        self.abandoned_object_secs
    }

    pub fn movement_px(&self) -> f64 {
        self.movement_px
    }

    pub fn track_staleness_secs(&self) -> f64 {
        self.track_staleness_secs
    }

    pub fn candidate_staleness_secs(&self) -> f64 {
        self.candidate_staleness_secs
    }

    pub fn association_distance_px(&self) -> f64 {
        self.association_distance_px
    }

    pub fn association_recency_secs(&self) -> f64 {
        self.association_recency_secs
    }

    pub fn abandoned_proximity_px(&self) -> f64 {
        self.abandoned_proximity_px
    }

    pub fn movement_variance(&self) -> f64 {
        self.movement_variance
    }

    pub fn candidate_cell_size(&self) -> f64 {
        self.candidate_cell_size
    }

    pub fn restricted_zones(&self) -> &[Zone] {
        &self.restricted_zones
    }

    pub fn monitoring_zones(&self) -> &[Zone] {
        &self.monitoring_zones
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the loitering threshold
    #[cfg(test)]
    pub fn with_loitering_secs(mut self, secs: f64) -> Self {
        self.loitering_secs = secs;
        self
    }

    /// Builder method for tests to set the candidate keying cell size
    #[cfg(test)]
    pub fn with_candidate_cell_size(mut self, px: f64) -> Self {
        self.candidate_cell_size = px;
        self
    }

    /// Builder method for tests to set the movement threshold
    #[cfg(test)]
    pub fn with_movement_px(mut self, px: f64) -> Self {
        self.movement_px = px;
        self
    }
}
