use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::sample::{parse_hex_payload, EnvSample};
use crate::tracker::UpdateResult;
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{AppState, Authorized, CanSubmitSamples, Operator};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayloadRequest {
    /// Raw sensor payload as hex, e.g. `"00003443 00003442"`.
    pub payload: String,
}

fn payload_bytes(request: &PayloadRequest) -> ApiResult<Vec<u8>> {
    parse_hex_payload(&request.payload).map_err(|e| ApiError::Validation(e.to_string()))
}

#[utoipa::path(
    post,
    path = "/api/samples",
    request_body = PayloadRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Sample applied", body = UpdateResult),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing submit_samples permission", body = ErrorResponse),
        (status = 503, description = "Tracker not running", body = ErrorResponse)
    ),
    tag = "samples"
)]
pub async fn submit_sample(
    State(state): State<AppState>,
    _auth: Authorized<CanSubmitSamples>,
    Json(request): Json<PayloadRequest>,
) -> ApiResult<Json<UpdateResult>> {
    let payload = payload_bytes(&request)?;
    let result = state.tracker.submit(payload).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/environment",
    request_body = PayloadRequest,
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Environment reading stored", body = EnvSample),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Missing submit_samples permission", body = ErrorResponse)
    ),
    tag = "samples"
)]
pub async fn submit_environment(
    State(state): State<AppState>,
    _auth: Authorized<CanSubmitSamples>,
    Json(request): Json<PayloadRequest>,
) -> ApiResult<Json<EnvSample>> {
    let payload = payload_bytes(&request)?;
    let env = state.tracker.record_environment(&payload)?;
    Ok(Json(env))
}

#[utoipa::path(
    get,
    path = "/api/environment",
    security(
        ("api_key" = [])
    ),
    responses(
        (status = 200, description = "Latest environment reading", body = Option<EnvSample>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "samples"
)]
pub async fn environment(
    State(state): State<AppState>,
    _operator: Operator,
) -> ApiResult<Json<Option<EnvSample>>> {
    Ok(Json(state.tracker.environment()))
}
