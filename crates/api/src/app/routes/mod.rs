use axum::{routing::get, Router};

pub mod common;
pub mod pricing;
pub mod sales;
pub mod system;
pub mod territory;

/// Protected routes; the caller layers auth and services on top.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/pricing", pricing::router())
        .nest("/sales", sales::router())
        .nest("/territory", territory::router())
}
