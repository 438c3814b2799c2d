//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the services handlers call into
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response bodies that are not domain types
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: JSON body extractor with API-shaped rejections

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use salesdesk_infra::{AppConfig, CommercialStore};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let store = services::build_store(&config.store).await?;
    Ok(build_app_with_store(config.jwt_secret.clone(), store))
}

/// Build the router over an already constructed store.
pub fn build_app_with_store(jwt_secret: String, store: Arc<dyn CommercialStore>) -> Router {
    let jwt = Arc::new(salesdesk_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::AppServices::new(store));

    // Protected routes: require auth + tenant context.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                auth_state,
                middleware::auth_middleware,
            ))
            .layer(Extension(services)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
