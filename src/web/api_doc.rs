use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::samples::PayloadRequest;
use super::api::tracker::{CalibrateRequest, ObservedOrientation, OrientationResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::samples::submit_sample,
        super::api::samples::submit_environment,
        super::api::samples::environment,
        super::api::tracker::orientation,
        super::api::tracker::status,
        super::api::tracker::calibrate,
    ),
    components(
        schemas(
            PayloadRequest,
            CalibrateRequest,
            ObservedOrientation,
            OrientationResponse,
            ErrorResponse,
            crate::sample::EnvSample,
            crate::tracker::UpdateResult,
            crate::tracker::Orientation,
            crate::tracker::CalibrationOffset,
            crate::tracker::CalibrationState,
            crate::tracker::CalibrationStrategy,
            crate::tracker::AngleUnit,
            crate::tracker::TrackerStatus,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Skypointer API",
        description = "Mount orientation tracking, calibration and sensor ingestion",
        version = "0.1.0"
    ),
    tags(
        (name = "tracker", description = "Orientation and calibration"),
        (name = "samples", description = "Sensor payload ingestion")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
