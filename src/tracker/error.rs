use thiserror::Error;

use crate::sample::DecodeError;
use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker already running")]
    AlreadyRunning,
    #[error("tracker is not running")]
    NotRunning,
    #[error("malformed sample: {0}")]
    Decode(#[from] DecodeError),
    #[error("calibration input: {0}")]
    CalibrationInput(String),
    #[error("calibration source: {0}")]
    Source(#[from] SinkError),
}
