use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::context::{PrincipalContext, TenantContext};

pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn whoami(
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    let roles: Vec<&str> = principal.roles().iter().map(|r| r.as_str()).collect();
    Json(json!({
        "tenant_id": tenant.tenant_id().to_string(),
        "principal_id": principal.principal_id().to_string(),
        "roles": roles,
    }))
}
