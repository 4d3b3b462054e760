use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{CalibrationSource, PublishSink, SinkError};
use crate::tracker::{AzimuthRange, Orientation};

/// Pushes orientations to Stellarium's remote control plugin.
pub struct StellariumSink {
    client: reqwest::Client,
    view_url: String,
}

impl StellariumSink {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            view_url: format!("{}/api/main/view", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PublishSink for StellariumSink {
    async fn publish(&self, orientation: &Orientation) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.view_url)
            .form(&view_form(orientation))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }
        log::debug!(
            "Published az={:.4} alt={:.4} to {}",
            orientation.azimuth,
            orientation.altitude,
            self.view_url
        );
        Ok(())
    }
}

/// Asks Stellarium for the object currently in view.
pub struct StellariumView {
    client: reqwest::Client,
    info_url: String,
    invert_azimuth: bool,
    azimuth_range: AzimuthRange,
}

impl StellariumView {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        invert_azimuth: bool,
        azimuth_range: AzimuthRange,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            info_url: format!("{}/api/objects/info", base_url.trim_end_matches('/')),
            invert_azimuth,
            azimuth_range,
        })
    }
}

#[async_trait]
impl CalibrationSource for StellariumView {
    async fn observe(&self) -> Result<Orientation, SinkError> {
        let response = self
            .client
            .get(&self.info_url)
            .query(&[("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }

        let info: ObjectInfo = response.json().await?;
        object_orientation(&info, self.invert_azimuth, self.azimuth_range)
    }
}

#[derive(Debug, Deserialize)]
struct ObjectInfo {
    azimuth: Option<f64>,
    altitude: Option<f64>,
}

fn view_form(orientation: &Orientation) -> [(&'static str, String); 2] {
    [
        ("az", orientation.azimuth.to_string()),
        ("alt", orientation.altitude.to_string()),
    ]
}

fn object_orientation(
    info: &ObjectInfo,
    invert_azimuth: bool,
    azimuth_range: AzimuthRange,
) -> Result<Orientation, SinkError> {
    let (Some(azimuth), Some(altitude)) = (info.azimuth, info.altitude) else {
        return Err(SinkError::Response("object info has no azimuth/altitude".into()));
    };
    let azimuth = if invert_azimuth { -azimuth } else { azimuth };
    Ok(Orientation::new(
        azimuth_range.wrap(azimuth.to_radians()),
        altitude.to_radians(),
    ))
}
