use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use strum_macros::Display;
use thiserror::Error;

use crate::tracker::{
    parse_pose, AzimuthRange, CalibrationStrategy, SignificanceThresholds, TrackerSettings,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub web: WebConfig,
    pub viewer: Option<ViewerConfig>,
    pub source: Option<SourceConfig>,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// `"azimuth, altitude"` in degrees.
    #[serde(default = "default_reference_pose")]
    pub reference_pose: String,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub azimuth_range: AzimuthRange,
    #[serde(default)]
    pub calibration: CalibrationStrategy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            reference_pose: default_reference_pose(),
            thresholds: ThresholdsConfig::default(),
            azimuth_range: AzimuthRange::default(),
            calibration: CalibrationStrategy::default(),
        }
    }
}

// Polaris as seen from the home observing site
fn default_reference_pose() -> String {
    "180.4028, 36.8355".to_string()
}

/// Radians.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ThresholdsConfig {
    pub azimuth: f64,
    pub altitude: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        let defaults = SignificanceThresholds::default();
        Self {
            azimuth: defaults.azimuth,
            altitude: defaults.altitude,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
    #[serde(default)]
    pub invert_azimuth: bool,
}

fn default_timeout() -> String {
    "2s".to_string()
}

impl ViewerConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(self.timeout.trim())
            .map_err(|e| ConfigError::Invalid(format!("viewer.timeout: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub device: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    SubmitSamples,
    Calibrate,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker_settings()?;
        if let Some(viewer) = &self.viewer {
            viewer.timeout()?;
        }
        Ok(())
    }

    pub fn tracker_settings(&self) -> Result<TrackerSettings, ConfigError> {
        let reference_pose = parse_pose(&self.tracker.reference_pose).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "tracker.reference_pose: expected \"azimuth, altitude\" in degrees, got {:?}",
                self.tracker.reference_pose
            ))
        })?;

        let thresholds = self.tracker.thresholds;
        for (name, value) in [("azimuth", thresholds.azimuth), ("altitude", thresholds.altitude)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "tracker.thresholds.{} must be a positive number of radians",
                    name
                )));
            }
        }

        Ok(TrackerSettings {
            reference_pose,
            thresholds: SignificanceThresholds::new(thresholds.azimuth, thresholds.altitude),
            azimuth_range: self.tracker.azimuth_range,
            strategy: self.tracker.calibration,
        })
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}
