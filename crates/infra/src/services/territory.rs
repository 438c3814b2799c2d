use std::sync::Arc;

use tracing::{info, instrument};

use salesdesk_core::TenantId;
use salesdesk_territory::{
    AssignmentId, CommercialArea, CommercialAreaId, CommercialAreaInput, RepresentativeInput,
    SalespersonId,
};

use super::ensure_salespeople_exist;
use super::error::{ServiceError, ServiceResult};
use crate::store::{MasterDataStore, TerritoryStore};

/// Commercial areas and their representative rosters.
pub struct TerritoryService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for TerritoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> TerritoryService<S>
where
    S: TerritoryStore + MasterDataStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Add a representative to an area being edited. `Conflict` if the
    /// function is already held by someone in this area.
    pub fn add_representative(
        &self,
        area: &mut CommercialArea,
        input: RepresentativeInput,
    ) -> ServiceResult<AssignmentId> {
        Ok(area.add_representative(input)?)
    }

    pub fn validate_area_before_save(&self, area: &CommercialArea) -> ServiceResult<()> {
        Ok(area.validate_before_save()?)
    }

    /// Validate and persist an area with its full roster.
    ///
    /// Nothing is written when validation fails.
    #[instrument(
        skip(self, area),
        fields(tenant_id = %tenant_id, area_id = %area.id, representatives = area.representatives.len()),
        err
    )]
    pub async fn save_area(
        &self,
        tenant_id: TenantId,
        area: CommercialArea,
    ) -> ServiceResult<CommercialArea> {
        if area.tenant_id != tenant_id {
            return Err(ServiceError::not_found(format!("commercial area {}", area.id)));
        }
        self.validate_area_before_save(&area)?;

        let salespeople: Vec<SalespersonId> =
            area.representatives.iter().map(|r| r.salesperson_id).collect();
        ensure_salespeople_exist(self.store.as_ref(), tenant_id, &salespeople).await?;

        self.store.save_area(&area).await?;
        info!(name = %area.name, "commercial area saved");
        Ok(area)
    }

    pub async fn create_area(
        &self,
        tenant_id: TenantId,
        input: CommercialAreaInput,
    ) -> ServiceResult<CommercialArea> {
        let area = CommercialArea::from_input(tenant_id, input)?;
        self.save_area(tenant_id, area).await
    }

    /// Replace an existing area's fields and roster. The full save-time
    /// validation runs again, so an edit cannot drop the last salesperson.
    pub async fn update_area(
        &self,
        tenant_id: TenantId,
        id: CommercialAreaId,
        input: CommercialAreaInput,
    ) -> ServiceResult<CommercialArea> {
        let mut area = self.get_area(tenant_id, id).await?;
        area.describe(input.name, input.description)?;
        area.replace_roster(input.representatives)?;
        self.save_area(tenant_id, area).await
    }

    pub async fn list_areas(&self, tenant_id: TenantId) -> ServiceResult<Vec<CommercialArea>> {
        Ok(self.store.list_areas(tenant_id).await?)
    }

    pub async fn get_area(
        &self,
        tenant_id: TenantId,
        id: CommercialAreaId,
    ) -> ServiceResult<CommercialArea> {
        self.store
            .get_area(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("commercial area {id}")))
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, area_id = %id), err)]
    pub async fn delete_area(&self, tenant_id: TenantId, id: CommercialAreaId) -> ServiceResult<()> {
        self.store.delete_area(tenant_id, id).await?;
        info!("commercial area deleted");
        Ok(())
    }
}
