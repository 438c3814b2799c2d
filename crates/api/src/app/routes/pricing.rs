use std::sync::Arc;

use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Router,
};

use salesdesk_auth::Permission;
use salesdesk_pricing::{PriceGroupId, PriceGroupInput, PriceTableId, PriceTableInput};

use super::common::{authorized, service, ApiResult};
use crate::app::dto::{self, UpsertItemRequest};
use crate::app::errors::parse_id;
use crate::app::extract::Json;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/:id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/:id/tables", get(list_tables).post(create_table))
        .route(
            "/tables/:id",
            get(get_table).put(update_table).delete(delete_table),
        )
        .route("/tables/:id/items", get(list_items).put(upsert_item))
        .route("/tables/:id/sync", post(sync_items))
}

async fn list_groups(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult {
    let groups = service(services.pricing.list_groups(tenant.tenant_id()).await)?;
    Ok(dto::list(groups))
}

async fn create_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<PriceGroupInput>,
) -> ApiResult {
    let body = authorized(&tenant, &principal, body, Permission::PRICING_CATALOG_WRITE)?;
    let group = service(services.pricing.create_group(tenant.tenant_id(), body).await)?;
    Ok(dto::created(group))
}

async fn get_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: PriceGroupId = parse_id(&id)?;
    let group = service(services.pricing.get_group(tenant.tenant_id(), id).await)?;
    Ok(dto::ok(group))
}

async fn update_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<PriceGroupInput>,
) -> ApiResult {
    let id: PriceGroupId = parse_id(&id)?;
    let body = authorized(&tenant, &principal, body, Permission::PRICING_CATALOG_WRITE)?;
    let group = service(services.pricing.update_group(tenant.tenant_id(), id, body).await)?;
    Ok(dto::ok(group))
}

async fn delete_group(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: PriceGroupId = parse_id(&id)?;
    authorized(&tenant, &principal, (), Permission::PRICING_CATALOG_WRITE)?;
    service(services.pricing.delete_group(tenant.tenant_id(), id).await)?;
    Ok(dto::no_content())
}

async fn list_tables(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let group_id: PriceGroupId = parse_id(&id)?;
    let tables = service(services.pricing.list_tables(tenant.tenant_id(), group_id).await)?;
    Ok(dto::list(tables))
}

async fn create_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<PriceTableInput>,
) -> ApiResult {
    let group_id: PriceGroupId = parse_id(&id)?;
    let body = authorized(&tenant, &principal, body, Permission::PRICING_CATALOG_WRITE)?;
    let table = service(
        services
            .pricing
            .create_table(tenant.tenant_id(), group_id, body)
            .await,
    )?;
    Ok(dto::created(table))
}

async fn get_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: PriceTableId = parse_id(&id)?;
    let table = service(services.pricing.get_table(tenant.tenant_id(), id).await)?;
    Ok(dto::ok(table))
}

async fn update_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<PriceTableInput>,
) -> ApiResult {
    let id: PriceTableId = parse_id(&id)?;
    let body = authorized(&tenant, &principal, body, Permission::PRICING_CATALOG_WRITE)?;
    let table = service(services.pricing.update_table(tenant.tenant_id(), id, body).await)?;
    Ok(dto::ok(table))
}

async fn delete_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: PriceTableId = parse_id(&id)?;
    authorized(&tenant, &principal, (), Permission::PRICING_CATALOG_WRITE)?;
    service(services.pricing.delete_table(tenant.tenant_id(), id).await)?;
    Ok(dto::no_content())
}

async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let table_id: PriceTableId = parse_id(&id)?;
    let items = service(services.pricing.list_items(tenant.tenant_id(), table_id).await)?;
    Ok(dto::list(items))
}

async fn upsert_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<UpsertItemRequest>,
) -> ApiResult {
    let table_id: PriceTableId = parse_id(&id)?;
    let body = authorized(&tenant, &principal, body, Permission::PRICING_CATALOG_WRITE)?;
    let item = service(
        services
            .pricing
            .resolve_or_create_item_price(
                tenant.tenant_id(),
                table_id,
                body.product_id,
                body.unit_price,
            )
            .await,
    )?;
    Ok(dto::ok(item))
}

async fn sync_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let table_id: PriceTableId = parse_id(&id)?;
    authorized(&tenant, &principal, (), Permission::PRICING_CATALOG_WRITE)?;
    let items = service(
        services
            .pricing
            .synchronize_table_items(tenant.tenant_id(), table_id)
            .await,
    )?;
    Ok(dto::list(items))
}
