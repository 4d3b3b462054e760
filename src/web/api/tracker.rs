use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::tracker::{AngleUnit, CalibrationOffset, Orientation, TrackerStatus};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{AppState, Authorized, CanCalibrate, Operator};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrientationQuery {
    /// Unit of the returned angles, `degrees` unless given.
    #[serde(default = "default_unit")]
    pub unit: AngleUnit,
}

fn default_unit() -> AngleUnit {
    AngleUnit::Degrees
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrientationResponse {
    pub azimuth: f64,
    pub altitude: f64,
    pub unit: AngleUnit,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ObservedOrientation {
    pub azimuth: f64,
    pub altitude: f64,
    #[serde(default = "default_unit")]
    pub unit: AngleUnit,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CalibrateRequest {
    /// Where the mount actually points. Only used by externally reported
    /// calibration; when omitted the configured viewer is queried.
    #[serde(default)]
    pub observed: Option<ObservedOrientation>,
}

#[utoipa::path(
    get,
    path = "/api/orientation",
    params(OrientationQuery),
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Current orientation", body = OrientationResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn orientation(
    State(state): State<AppState>,
    _operator: Operator,
    Query(query): Query<OrientationQuery>,
) -> ApiResult<Json<OrientationResponse>> {
    let orientation = state.tracker.orientation(query.unit);
    Ok(Json(OrientationResponse {
        azimuth: orientation.azimuth,
        altitude: orientation.altitude,
        unit: query.unit,
    }))
}

#[utoipa::path(
    get,
    path = "/api/status",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Tracker status", body = TrackerStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn status(
    State(state): State<AppState>,
    _operator: Operator,
) -> ApiResult<Json<TrackerStatus>> {
    Ok(Json(state.tracker.status()))
}

#[utoipa::path(
    post,
    path = "/api/calibrate",
    request_body = CalibrateRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "New calibration offset in radians", body = CalibrationOffset),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing calibrate permission", body = ErrorResponse),
        (status = 409, description = "No usable calibration input", body = ErrorResponse),
        (status = 502, description = "Viewer could not be queried", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn calibrate(
    State(state): State<AppState>,
    auth: Authorized<CanCalibrate>,
    Json(request): Json<CalibrateRequest>,
) -> ApiResult<Json<CalibrationOffset>> {
    log::info!("Calibration requested by {}", auth.operator.name);

    let observed = request
        .observed
        .map(|o| Orientation::from_unit(o.azimuth, o.altitude, o.unit));
    let offset = state.tracker.calibrate(observed).await?;
    Ok(Json(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LogSink;
    use crate::tracker::{CalibrationState, OrientationTracker, Tracker};
    use crate::web::api::error::ApiError;
    use crate::web::config::{Config, Permission};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn state(yaml: &str) -> AppState {
        let config = Config::from_yaml(yaml).unwrap();
        let core = OrientationTracker::new(config.tracker_settings().unwrap());
        AppState {
            config: Arc::new(config),
            tracker: Arc::new(Tracker::new(core, Arc::new(LogSink), None)),
        }
    }

    fn user(permissions: &[Permission]) -> Operator {
        Operator {
            name: "test".into(),
            permissions: permissions.iter().copied().collect::<HashSet<_>>(),
        }
    }

    fn calibrator() -> Authorized<CanCalibrate> {
        Authorized::new(user(&[Permission::Calibrate])).unwrap()
    }

    #[tokio::test]
    async fn test_orientation_in_degrees_and_radians() {
        let state = state("tracker:\n  reference_pose: \"90, 45\"\n");

        let Json(degrees) = orientation(
            State(state.clone()),
            user(&[]),
            Query(OrientationQuery {
                unit: AngleUnit::Degrees,
            }),
        )
        .await
        .unwrap();
        assert!((degrees.azimuth - 90.0).abs() < 1e-9);
        assert!((degrees.altitude - 45.0).abs() < 1e-9);

        let Json(radians) = orientation(
            State(state),
            user(&[]),
            Query(OrientationQuery {
                unit: AngleUnit::Radians,
            }),
        )
        .await
        .unwrap();
        assert_eq!(radians.unit, AngleUnit::Radians);
        assert!((radians.azimuth - 90f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_calibrate_requires_permission() {
        let submitter = user(&[Permission::SubmitSamples]);
        assert!(Authorized::<CanCalibrate>::new(submitter).is_err());
    }

    #[tokio::test]
    async fn test_self_referential_calibration() {
        let state = state("{}");
        let Json(offset) = calibrate(
            State(state.clone()),
            calibrator(),
            Json(CalibrateRequest::default()),
        )
        .await
        .unwrap();
        assert_eq!(offset, CalibrationOffset::default());

        let Json(status) = status(State(state), user(&[])).await.unwrap();
        assert_eq!(status.state, CalibrationState::Calibrated);
    }

    #[tokio::test]
    async fn test_external_calibration_with_observation() {
        let state = state(
            "tracker:\n  reference_pose: \"100, 20\"\n  calibration: externally_reported\n",
        );
        let request = CalibrateRequest {
            observed: Some(ObservedOrientation {
                azimuth: 105.0,
                altitude: 20.0,
                unit: AngleUnit::Degrees,
            }),
        };
        let Json(offset) = calibrate(State(state), calibrator(), Json(request))
            .await
            .unwrap();
        assert!((offset.azimuth - 5f64.to_radians()).abs() < 1e-9);
        assert!(offset.altitude.abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_external_calibration_without_input_is_conflict() {
        let state = state("tracker:\n  calibration: externally_reported\n");
        let result = calibrate(
            State(state),
            calibrator(),
            Json(CalibrateRequest::default()),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Calibration(_))));
    }
}
