//! Minimal SCIM 2.0 provisioning server for Microsoft Entra ID.
//!
//! Entra ID pushes Users and Groups to the endpoints built by [`build_app`].
//! State lives in memory for the lifetime of an [`AppState`].

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod config;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod scim;
pub mod services;
pub mod store;

#[cfg(test)]
mod tests;

use services::ScimProvisioningService;
use store::ResourceStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::ProvisioningConfig>,
    pub scim: ScimProvisioningService,
}

impl AppState {
    /// Build state with a fresh, empty resource store.
    pub fn new(config: config::ProvisioningConfig) -> Self {
        let store = Arc::new(ResourceStore::new(config.scim.base_path.clone()));
        Self {
            config: Arc::new(config),
            scim: ScimProvisioningService::new(store),
        }
    }
}

pub fn build_app(config: &config::ProvisioningConfig, state: AppState) -> Router {
    let app = Router::new()
        // Health check endpoints
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        // SCIM 2.0 provisioning endpoints
        .nest(
            &config.scim.base_path,
            routes::scim_routes(state.clone()),
        );

    tracing::info!(
        base_path = %config.scim.base_path,
        "SCIM 2.0 provisioning endpoints enabled"
    );

    app.layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .with_state(state)
}
