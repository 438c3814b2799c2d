use std::sync::Arc;

use axum::{extract::Path, routing::get, Extension, Router};

use salesdesk_auth::Permission;
use salesdesk_territory::{CommercialAreaId, CommercialAreaInput};

use super::common::{authorized, service, ApiResult};
use crate::app::dto;
use crate::app::errors::parse_id;
use crate::app::extract::Json;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/areas", get(list_areas).post(create_area))
        .route(
            "/areas/:id",
            get(get_area).put(update_area).delete(delete_area),
        )
}

async fn list_areas(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult {
    let areas = service(services.territory.list_areas(tenant.tenant_id()).await)?;
    Ok(dto::list(areas))
}

async fn create_area(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CommercialAreaInput>,
) -> ApiResult {
    let body = authorized(&tenant, &principal, body, Permission::TERRITORY_AREAS_WRITE)?;
    let area = service(services.territory.create_area(tenant.tenant_id(), body).await)?;
    Ok(dto::created(area))
}

async fn get_area(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CommercialAreaId = parse_id(&id)?;
    let area = service(services.territory.get_area(tenant.tenant_id(), id).await)?;
    Ok(dto::ok(area))
}

/// Replaces the area's fields and full roster.
async fn update_area(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<CommercialAreaInput>,
) -> ApiResult {
    let id: CommercialAreaId = parse_id(&id)?;
    let body = authorized(&tenant, &principal, body, Permission::TERRITORY_AREAS_WRITE)?;
    let area = service(
        services
            .territory
            .update_area(tenant.tenant_id(), id, body)
            .await,
    )?;
    Ok(dto::ok(area))
}

async fn delete_area(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: CommercialAreaId = parse_id(&id)?;
    authorized(&tenant, &principal, (), Permission::TERRITORY_AREAS_WRITE)?;
    service(services.territory.delete_area(tenant.tenant_id(), id).await)?;
    Ok(dto::no_content())
}
