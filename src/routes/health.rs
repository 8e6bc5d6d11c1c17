//! Health check endpoints for probes and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status, always "healthy" while the process serves requests
    pub status: String,
    /// Service version
    pub version: String,
    /// Number of provisioned users
    pub users: usize,
    /// Number of provisioned groups
    pub groups: usize,
}

/// Health check with resource counts.
///
/// Served outside the SCIM base path and without authentication.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.scim.store();
    let health = HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        users: store.user_count(),
        groups: store.group_count(),
    };

    (StatusCode::OK, Json(health))
}

/// Liveness probe.
///
/// Returns 200 if the service is running.
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}
