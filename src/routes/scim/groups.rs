//! SCIM 2.0 Group Resource Endpoints
//!
//! Implements RFC 7644 Section 3 operations for Group resources:
//! - POST /Groups: Create group
//! - GET /Groups: List groups, optionally filtered
//! - GET /Groups/{id}: Get group by ID
//! - PATCH /Groups/{id}: Add or remove members
//! - DELETE /Groups/{id}: Delete group

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};

use super::users::{ScimJsonWithStatus, read_json_body};
use crate::{
    AppState,
    scim::{GroupInput, PatchRequest, ScimListParams},
};

/// List groups with an optional `displayName eq "..."` filter.
///
/// `GET /Groups`
#[tracing::instrument(name = "scim.groups.list", skip_all, fields(query = ?pairs))]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params: ScimListParams = pairs.into_iter().collect();
    ScimJsonWithStatus::ok(state.scim.list_groups(&params)).into_response()
}

/// Create a new group.
///
/// `POST /Groups`
///
/// Members in the body are stored as sent, without resolution.
#[tracing::instrument(name = "scim.groups.create", skip_all)]
pub async fn create_group(State(state): State<AppState>, request: Request<Body>) -> Response {
    let input: GroupInput = match read_json_body(&state, request).await {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };

    ScimJsonWithStatus::created(state.scim.create_group(input)).into_response()
}

/// Get a group by ID.
///
/// `GET /Groups/{id}`
#[tracing::instrument(name = "scim.groups.get", skip_all, fields(%id))]
pub async fn get_group(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.scim.get_group(&id) {
        Ok(group) => ScimJsonWithStatus::ok(group).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Partially update a group.
///
/// `PATCH /Groups/{id}`
///
/// Supports `add` and `remove` on `members`. Added ids must name an existing
/// user or group; unknown ids are skipped.
#[tracing::instrument(name = "scim.groups.patch", skip_all, fields(%id))]
pub async fn patch_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    let patch_request: PatchRequest = match read_json_body(&state, request).await {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match state.scim.patch_group(&id, &patch_request) {
        Ok(updated) => ScimJsonWithStatus::ok(updated).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a group.
///
/// `DELETE /Groups/{id}`
#[tracing::instrument(name = "scim.groups.delete", skip_all, fields(%id))]
pub async fn delete_group(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.scim.delete_group(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
