//! Application services for the commercial core.
//!
//! Services are thin orchestration over the record store: they validate input
//! with the domain crates, check references, and hand atomic writes to the
//! store. They hold no state of their own besides the store handle.

use salesdesk_core::TenantId;
use salesdesk_territory::SalespersonId;

use crate::store::MasterDataStore;

pub mod error;
pub mod orders;
pub mod pricing;
pub mod territory;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ServiceError, ServiceResult};
pub use orders::{ComposeOrderRequest, OrderCompositionService, OrderDetails, OrderLineRequest};
pub use pricing::PriceResolutionService;
pub use territory::TerritoryService;

/// Fail with `NotFound` naming the first salesperson the registry lacks.
pub(crate) async fn ensure_salespeople_exist<S>(
    store: &S,
    tenant_id: TenantId,
    ids: &[SalespersonId],
) -> ServiceResult<()>
where
    S: MasterDataStore + ?Sized,
{
    if ids.is_empty() {
        return Ok(());
    }
    let found = store.get_salespeople(tenant_id, ids).await?;
    match ids.iter().find(|id| !found.iter().any(|s| s.id == **id)) {
        Some(missing) => Err(ServiceError::not_found(format!("salesperson {missing}"))),
        None => Ok(()),
    }
}
