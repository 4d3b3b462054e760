mod angles;
mod error;
mod orientation;
mod parsing;
mod tracker;
mod types;

pub use error::TrackerError;
pub use orientation::OrientationTracker;
pub use parsing::parse_pose;
pub use tracker::{Tracker, TrackerStatus};
pub use types::{
    AngleUnit, AzimuthRange, CalibrationOffset, CalibrationState, CalibrationStrategy,
    Orientation, SignificanceThresholds, TrackerSettings, UpdateResult,
};
