//! SCIM 2.0 Protocol Routes
//!
//! This module implements the SCIM 2.0 endpoints (RFC 7644) that Entra ID
//! drives during provisioning.
//!
//! ## Endpoint Structure
//!
//! All SCIM endpoints live under the configured base path
//! (`scim.base_path`, `/scim/v2` by default):
//!
//! - `GET/POST {base}/Users` - List/create users
//! - `GET/PUT/PATCH/DELETE {base}/Users/{id}` - User operations
//! - `GET/POST {base}/Groups` - List/create groups
//! - `GET/PATCH/DELETE {base}/Groups/{id}` - Group operations

pub mod groups;
pub mod middleware;
pub mod users;

use axum::{Router, routing::get};

use crate::AppState;

/// Build the SCIM routes.
///
/// The returned router is meant to be nested under the configured base path.
/// Bearer token authentication is applied to every route.
pub fn scim_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // User resource endpoints
        .route("/Users", get(users::list_users).post(users::create_user))
        .route(
            "/Users/{id}",
            get(users::get_user)
                .put(users::replace_user)
                .patch(users::patch_user)
                .delete(users::delete_user),
        )
        // Group resource endpoints
        .route(
            "/Groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/Groups/{id}",
            get(groups::get_group)
                .patch(groups::patch_group)
                .delete(groups::delete_group),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::scim_auth_middleware,
        ))
}
