use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use super::angles::{angular_distance, wrap_negative, wrap_positive};

/// Pointing direction of the mount. Angles are in radians unless the value
/// was produced by [`Orientation::to_unit`] with [`AngleUnit::Degrees`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Orientation {
    pub azimuth: f64,
    pub altitude: f64,
}

impl Orientation {
    pub fn new(azimuth: f64, altitude: f64) -> Self {
        Self { azimuth, altitude }
    }

    pub fn from_degrees(azimuth_deg: f64, altitude_deg: f64) -> Self {
        Self::from_unit(azimuth_deg, altitude_deg, AngleUnit::Degrees)
    }

    pub fn from_unit(azimuth: f64, altitude: f64, unit: AngleUnit) -> Self {
        match unit {
            AngleUnit::Radians => Self::new(azimuth, altitude),
            AngleUnit::Degrees => Self::new(azimuth.to_radians(), altitude.to_radians()),
        }
    }

    pub fn to_unit(self, unit: AngleUnit) -> Self {
        match unit {
            AngleUnit::Radians => self,
            AngleUnit::Degrees => Self::new(self.azimuth.to_degrees(), self.altitude.to_degrees()),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.azimuth.is_finite() && self.altitude.is_finite()
    }
}

/// Per-axis correction added to every decoded sample, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
pub struct CalibrationOffset {
    pub azimuth: f64,
    pub altitude: f64,
}

/// Minimum per-axis change, in radians, before a new orientation is published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SignificanceThresholds {
    pub azimuth: f64,
    pub altitude: f64,
}

impl SignificanceThresholds {
    pub fn new(azimuth: f64, altitude: f64) -> Self {
        Self { azimuth, altitude }
    }

    /// True when either axis moved strictly more than its tolerance.
    pub fn exceeded(&self, current: &Orientation, candidate: &Orientation) -> bool {
        angular_distance(current.azimuth, candidate.azimuth) > self.azimuth
            || (current.altitude - candidate.altitude).abs() > self.altitude
    }
}

impl Default for SignificanceThresholds {
    fn default() -> Self {
        Self {
            azimuth: 0.001,
            altitude: 0.0005,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

/// Canonical interval stored azimuths are reduced into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AzimuthRange {
    /// `[0, 2π)`
    #[default]
    Positive,
    /// `(-2π, 0]`
    Negative,
}

impl AzimuthRange {
    pub fn wrap(self, azimuth: f64) -> f64 {
        match self {
            AzimuthRange::Positive => wrap_positive(azimuth),
            AzimuthRange::Negative => wrap_negative(azimuth),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CalibrationStrategy {
    /// Assume the mount points at the reference pose.
    #[default]
    SelfReferential,
    /// Align to an orientation observed by an external service.
    ExternallyReported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CalibrationState {
    Uncalibrated,
    Calibrated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct UpdateResult {
    pub changed: bool,
    pub orientation: Orientation,
}

/// Static configuration of an [`OrientationTracker`](super::OrientationTracker).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub reference_pose: Orientation,
    pub thresholds: SignificanceThresholds,
    pub azimuth_range: AzimuthRange,
    pub strategy: CalibrationStrategy,
}
