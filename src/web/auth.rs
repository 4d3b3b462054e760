use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::tracker::Tracker;

use super::api::error::ErrorResponse;
use super::config::{Config, Permission};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tracker: Arc<Tracker>,
}

/// Whoever presented a known API key. Read-only routes only need this.
#[derive(Debug, Clone)]
pub struct Operator {
    pub name: String,
    pub permissions: HashSet<Permission>,
}

/// Ties a marker type to the permission a route requires.
pub trait Grant {
    const PERMISSION: Permission;
}

pub struct CanSubmitSamples;

impl Grant for CanSubmitSamples {
    const PERMISSION: Permission = Permission::SubmitSamples;
}

pub struct CanCalibrate;

impl Grant for CanCalibrate {
    const PERMISSION: Permission = Permission::Calibrate;
}

/// An operator that holds `G::PERMISSION`. Taking this as a handler argument
/// rejects the request before the handler body runs.
pub struct Authorized<G: Grant> {
    pub operator: Operator,
    grant: PhantomData<fn() -> G>,
}

impl<G: Grant> std::fmt::Debug for Authorized<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("operator", &self.operator.name)
            .field("permission", &G::PERMISSION)
            .finish()
    }
}

impl<G: Grant> Authorized<G> {
    pub fn new(operator: Operator) -> Result<Self, AuthError> {
        if !operator.permissions.contains(&G::PERMISSION) {
            log::warn!("{} lacks the {} permission", operator.name, G::PERMISSION);
            return Err(AuthError::Forbidden(G::PERMISSION));
        }
        Ok(Authorized {
            operator,
            grant: PhantomData,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingKey,
    MalformedHeader,
    UnknownKey,
    Forbidden(Permission),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        };
        let body = match self {
            AuthError::MissingKey => ErrorResponse::new("missing_api_key"),
            AuthError::MalformedHeader => ErrorResponse::with_message(
                "malformed_authorization",
                "expected `Authorization: Bearer <key>`",
            ),
            AuthError::UnknownKey => ErrorResponse::new("unknown_api_key"),
            AuthError::Forbidden(permission) => ErrorResponse::with_message(
                "forbidden",
                &format!("requires the {} permission", permission),
            ),
        };
        (status, Json(body)).into_response()
    }
}

fn bearer_key(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingKey)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::MalformedHeader)
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = bearer_key(parts)?;
        let api_key = state.config.find_api_key(key).ok_or_else(|| {
            log::warn!("Rejected request with unknown API key");
            AuthError::UnknownKey
        })?;

        Ok(Operator {
            name: api_key.name.clone(),
            permissions: api_key.permissions.clone(),
        })
    }
}

impl<G: Grant> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let operator = Operator::from_request_parts(parts, state).await?;
        Authorized::new(operator)
    }
}
