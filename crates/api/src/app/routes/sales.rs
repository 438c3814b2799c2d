use std::sync::Arc;

use axum::{extract::Path, routing::get, Extension, Router};

use salesdesk_auth::Permission;
use salesdesk_infra::ComposeOrderRequest;
use salesdesk_sales::{OrderHeaderPatch, OrderId};

use super::common::{authorized, service, ApiResult};
use crate::app::dto;
use crate::app::errors::parse_id;
use crate::app::extract::Json;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(compose_order))
        .route("/orders/:id", get(get_order).patch(update_order_header))
}

async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult {
    let orders = service(services.orders.list_orders(tenant.tenant_id()).await)?;
    Ok(dto::list(orders))
}

async fn compose_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ComposeOrderRequest>,
) -> ApiResult {
    let body = authorized(&tenant, &principal, body, Permission::SALES_ORDERS_CREATE)?;
    let order = service(services.orders.compose_order(tenant.tenant_id(), body).await)?;
    Ok(dto::created(order))
}

/// Order with its client and the products its lines reference.
async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: OrderId = parse_id(&id)?;
    let details = service(services.orders.get_order(tenant.tenant_id(), id).await)?;
    Ok(dto::ok(details))
}

/// Header fields only. A `lines` field in the body is ignored.
async fn update_order_header(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<OrderHeaderPatch>,
) -> ApiResult {
    let id: OrderId = parse_id(&id)?;
    let patch = authorized(&tenant, &principal, body, Permission::SALES_ORDERS_UPDATE)?;
    let order = service(
        services
            .orders
            .update_order_header(tenant.tenant_id(), id, patch)
            .await,
    )?;
    Ok(dto::ok(order))
}
