mod stellarium;

use async_trait::async_trait;
use thiserror::Error;

use crate::tracker::{AngleUnit, Orientation};

pub use stellarium::{StellariumSink, StellariumView};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    Response(String),
}

/// Receives every orientation the tracker considers significant.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn publish(&self, orientation: &Orientation) -> Result<(), SinkError>;
}

/// Reports where the mount is actually pointing, used for externally
/// reported calibration.
#[async_trait]
pub trait CalibrationSource: Send + Sync {
    async fn observe(&self) -> Result<Orientation, SinkError>;
}

/// Sink used when no viewer is configured.
pub struct LogSink;

#[async_trait]
impl PublishSink for LogSink {
    async fn publish(&self, orientation: &Orientation) -> Result<(), SinkError> {
        let degrees = orientation.to_unit(AngleUnit::Degrees);
        log::info!(
            "Orientation: az {:.4} alt {:.4}",
            degrees.azimuth,
            degrees.altitude
        );
        Ok(())
    }
}
