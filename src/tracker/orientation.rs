use std::f64::consts::{FRAC_PI_2, PI};

use super::angles::{fold_altitude, signed_delta};
use super::error::TrackerError;
use super::types::{
    AngleUnit, CalibrationOffset, CalibrationState, CalibrationStrategy, Orientation,
    TrackerSettings, UpdateResult,
};
use crate::sample::RawSample;

/// Current pointing estimate of the mount together with its calibration.
///
/// `update` folds each decoded sample into the estimate and reports whether
/// the change was large enough to be worth publishing. `calibrate` replaces
/// or extends the offset added to every subsequent sample.
#[derive(Debug, Clone)]
pub struct OrientationTracker {
    settings: TrackerSettings,
    current: Orientation,
    // uncorrected radians of the sample behind `current`
    reading: Orientation,
    offset: CalibrationOffset,
    state: CalibrationState,
}

impl OrientationTracker {
    pub fn new(settings: TrackerSettings) -> Self {
        let mut tracker = Self {
            settings,
            current: settings.reference_pose,
            reading: settings.reference_pose,
            offset: CalibrationOffset::default(),
            state: CalibrationState::Uncalibrated,
        };
        tracker.current = tracker.reference_pose();
        tracker.reading = tracker.current;
        tracker
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn current(&self) -> Orientation {
        self.current
    }

    pub fn offset(&self) -> CalibrationOffset {
        self.offset
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Reference pose reduced into the configured azimuth range.
    pub fn reference_pose(&self) -> Orientation {
        let reference = self.settings.reference_pose;
        self.normalize(reference.azimuth, reference.altitude)
    }

    pub fn get_orientation(&self, unit: AngleUnit) -> Orientation {
        self.current.to_unit(unit)
    }

    /// Orientation a sample would produce with the current offset, without
    /// touching the tracker.
    pub fn resolve(&self, sample: RawSample) -> Orientation {
        self.correct(reading_of(sample))
    }

    pub fn update(&mut self, sample: RawSample) -> UpdateResult {
        let candidate = self.resolve(sample);
        let changed = self.settings.thresholds.exceeded(&self.current, &candidate);
        if changed {
            self.current = candidate;
            self.reading = reading_of(sample);
        }
        UpdateResult {
            changed,
            orientation: self.current,
        }
    }

    /// Recompute the calibration offset.
    ///
    /// Self-referential calibration ignores `observed` and maps the reading
    /// behind the current estimate onto the reference pose. Calling it again
    /// replaces the previous offset instead of stacking on top of it.
    /// Externally reported calibration adds the error between `observed`
    /// and the corrected reading to the existing offset, so
    /// repeated calls compose.
    pub fn calibrate(
        &mut self,
        observed: Option<Orientation>,
    ) -> Result<CalibrationOffset, TrackerError> {
        let offset = match self.settings.strategy {
            CalibrationStrategy::SelfReferential => {
                let reference = self.reference_pose();
                CalibrationOffset {
                    azimuth: signed_delta(reference.azimuth, self.reading.azimuth),
                    altitude: reference.altitude - self.reading.altitude,
                }
            }
            CalibrationStrategy::ExternallyReported => {
                let observed = observed.ok_or_else(|| {
                    TrackerError::CalibrationInput("no observed orientation available".into())
                })?;
                if !observed.is_finite() {
                    return Err(TrackerError::CalibrationInput(
                        "observed orientation is not finite".into(),
                    ));
                }
                if observed.altitude.abs() > FRAC_PI_2 {
                    return Err(TrackerError::CalibrationInput(format!(
                        "observed altitude {:.4} rad is beyond the poles",
                        observed.altitude
                    )));
                }
                let corrected = self.correct(self.reading);
                CalibrationOffset {
                    azimuth: self.offset.azimuth
                        + signed_delta(observed.azimuth, corrected.azimuth),
                    altitude: self.offset.altitude + observed.altitude - corrected.altitude,
                }
            }
        };

        self.offset = offset;
        self.state = CalibrationState::Calibrated;
        Ok(offset)
    }

    fn correct(&self, reading: Orientation) -> Orientation {
        self.normalize(
            reading.azimuth + self.offset.azimuth,
            reading.altitude + self.offset.altitude,
        )
    }

    fn normalize(&self, azimuth: f64, altitude: f64) -> Orientation {
        let (altitude, flipped) = fold_altitude(altitude);
        let azimuth = if flipped { azimuth + PI } else { azimuth };
        Orientation {
            azimuth: self.settings.azimuth_range.wrap(azimuth),
            altitude,
        }
    }
}

fn reading_of(sample: RawSample) -> Orientation {
    Orientation::new(
        f64::from(sample.azimuth_deg).to_radians(),
        f64::from(sample.altitude_deg).to_radians(),
    )
}
