//! SCIM 2.0 User Resource Endpoints
//!
//! Implements RFC 7644 Section 3 operations for User resources:
//! - POST /Users: Create user
//! - GET /Users: List users, optionally filtered
//! - GET /Users/{id}: Get user by ID
//! - PUT /Users/{id}: Replace the mutable attributes of a user
//! - PATCH /Users/{id}: Partial update
//! - DELETE /Users/{id}: Delete user

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    AppState,
    scim::{PatchRequest, SCIM_CONTENT_TYPE, ScimErrorResponse, ScimListParams, UserInput},
};

// =============================================================================
// Custom Response Type for SCIM Content-Type
// =============================================================================

/// SCIM JSON response with correct Content-Type and status code.
pub struct ScimJsonWithStatus<T> {
    body: T,
    status: StatusCode,
}

impl<T: Serialize> ScimJsonWithStatus<T> {
    pub fn ok(body: T) -> Self {
        Self {
            body,
            status: StatusCode::OK,
        }
    }

    pub fn created(body: T) -> Self {
        Self {
            body,
            status: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ScimJsonWithStatus<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.body) {
            Ok(body) => (
                self.status,
                [(header::CONTENT_TYPE, SCIM_CONTENT_TYPE)],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize SCIM response: {}", e);
                ScimErrorResponse::internal("Failed to serialize response").into_response()
            }
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read and parse a JSON request body.
///
/// The Content-Type header is not checked. An empty body parses as `{}`.
pub(super) async fn read_json_body<T: DeserializeOwned>(
    state: &AppState,
    request: Request<Body>,
) -> Result<T, ScimErrorResponse> {
    let limit = state.config.server.body_limit_bytes;
    let bytes = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|e| {
            ScimErrorResponse::invalid_syntax(format!("Failed to read request body: {}", e))
        })?;

    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &bytes
    };

    serde_json::from_slice(bytes)
        .map_err(|e| ScimErrorResponse::invalid_syntax(format!("Invalid JSON: {}", e)))
}

// =============================================================================
// User Endpoints
// =============================================================================

/// List users with an optional equality filter.
///
/// `GET /Users`
///
/// Query parameters:
/// - `filter`: SCIM filter expression (e.g., `userName eq "john@example.com"`)
/// - `startIndex`, `count`: accepted and ignored; every list is one page
#[tracing::instrument(name = "scim.users.list", skip_all, fields(query = ?pairs))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params: ScimListParams = pairs.into_iter().collect();
    ScimJsonWithStatus::ok(state.scim.list_users(&params)).into_response()
}

/// Create a new user.
///
/// `POST /Users`
///
/// Absent attributes take their defaults. Returns 201 Created with the full
/// user resource.
#[tracing::instrument(name = "scim.users.create", skip_all)]
pub async fn create_user(State(state): State<AppState>, request: Request<Body>) -> Response {
    let input: UserInput = match read_json_body(&state, request).await {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };

    ScimJsonWithStatus::created(state.scim.create_user(input)).into_response()
}

/// Get a user by ID.
///
/// `GET /Users/{id}`
#[tracing::instrument(name = "scim.users.get", skip_all, fields(%id))]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.scim.get_user(&id) {
        Ok(user) => ScimJsonWithStatus::ok(user).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace a user.
///
/// `PUT /Users/{id}`
///
/// Only attributes present in the body overwrite stored values; `externalId`
/// is left unchanged.
#[tracing::instrument(name = "scim.users.replace", skip_all, fields(%id))]
pub async fn replace_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    let input: UserInput = match read_json_body(&state, request).await {
        Ok(input) => input,
        Err(e) => return e.into_response(),
    };

    match state.scim.replace_user(&id, input) {
        Ok(updated) => ScimJsonWithStatus::ok(updated).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Partially update a user.
///
/// `PATCH /Users/{id}`
///
/// Only `replace` on `active` is applied; other operations are ignored.
#[tracing::instrument(name = "scim.users.patch", skip_all, fields(%id))]
pub async fn patch_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    let patch_request: PatchRequest = match read_json_body(&state, request).await {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    match state.scim.patch_user(&id, &patch_request) {
        Ok(updated) => ScimJsonWithStatus::ok(updated).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a user.
///
/// `DELETE /Users/{id}`
///
/// Group memberships that reference the user are left in place.
#[tracing::instrument(name = "scim.users.delete", skip_all, fields(%id))]
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.scim.delete_user(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
