use serde::Serialize;
use std::fmt;

/// One azimuth/altitude reading as reported by the sensor, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct RawSample {
    pub azimuth_deg: f32,
    pub altitude_deg: f32,
}

/// Temperature (°F), relative humidity (%) and dewpoint (°F) from the mount's
/// environment sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct EnvSample {
    pub temperature_f: f32,
    pub humidity_pct: f32,
    pub dewpoint_f: f32,
}

impl fmt::Display for EnvSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temp: {:.1}F  humidity: {:.1}%  dewpoint: {:.1}F",
            self.temperature_f, self.humidity_pct, self.dewpoint_f
        )
    }
}
