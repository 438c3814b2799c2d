use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use salesdesk_core::TenantId;
use salesdesk_pricing::{
    PriceGroup, PriceGroupId, PriceGroupInput, PriceItem, PriceItemKey, PriceTable, PriceTableId,
    PriceTableInput, item::validate_unit_price, plan_synchronization, resolve_unit_price,
};
use salesdesk_products::ProductId;

use super::error::{ServiceError, ServiceResult};
use crate::store::{MasterDataStore, PriceCatalogStore};

/// Price catalog maintenance and per-product price resolution.
pub struct PriceResolutionService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for PriceResolutionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> PriceResolutionService<S>
where
    S: PriceCatalogStore + MasterDataStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_groups(&self, tenant_id: TenantId) -> ServiceResult<Vec<PriceGroup>> {
        Ok(self.store.list_groups(tenant_id).await?)
    }

    pub async fn get_group(&self, tenant_id: TenantId, id: PriceGroupId) -> ServiceResult<PriceGroup> {
        self.store
            .get_group(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("price group {id}")))
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id), err)]
    pub async fn create_group(
        &self,
        tenant_id: TenantId,
        input: PriceGroupInput,
    ) -> ServiceResult<PriceGroup> {
        let group = PriceGroup::create(tenant_id, input)?;
        self.store.insert_group(&group).await?;
        info!(group_id = %group.id, name = %group.name, "price group created");
        Ok(group)
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, group_id = %id), err)]
    pub async fn update_group(
        &self,
        tenant_id: TenantId,
        id: PriceGroupId,
        input: PriceGroupInput,
    ) -> ServiceResult<PriceGroup> {
        let mut group = self.get_group(tenant_id, id).await?;
        group.apply(input)?;
        self.store.update_group(&group).await?;
        Ok(group)
    }

    /// Fails with `Conflict` while the group still owns tables.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, group_id = %id), err)]
    pub async fn delete_group(&self, tenant_id: TenantId, id: PriceGroupId) -> ServiceResult<()> {
        self.store.delete_group(tenant_id, id).await?;
        info!("price group deleted");
        Ok(())
    }

    pub async fn list_tables(
        &self,
        tenant_id: TenantId,
        group_id: PriceGroupId,
    ) -> ServiceResult<Vec<PriceTable>> {
        self.get_group(tenant_id, group_id).await?;
        Ok(self.store.list_tables(tenant_id, group_id).await?)
    }

    pub async fn get_table(&self, tenant_id: TenantId, id: PriceTableId) -> ServiceResult<PriceTable> {
        self.store
            .get_table(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("price table {id}")))
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, group_id = %group_id), err)]
    pub async fn create_table(
        &self,
        tenant_id: TenantId,
        group_id: PriceGroupId,
        input: PriceTableInput,
    ) -> ServiceResult<PriceTable> {
        let table = PriceTable::create(tenant_id, group_id, input)?;
        self.store.insert_table(&table).await?;
        info!(table_id = %table.id, name = %table.name, "price table created");
        Ok(table)
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, table_id = %id), err)]
    pub async fn update_table(
        &self,
        tenant_id: TenantId,
        id: PriceTableId,
        input: PriceTableInput,
    ) -> ServiceResult<PriceTable> {
        let mut table = self.get_table(tenant_id, id).await?;
        table.apply(input)?;
        self.store.update_table(&table).await?;
        Ok(table)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, table_id = %id), err)]
    pub async fn delete_table(&self, tenant_id: TenantId, id: PriceTableId) -> ServiceResult<()> {
        self.store.delete_table(tenant_id, id).await?;
        info!("price table deleted");
        Ok(())
    }

    pub async fn list_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
    ) -> ServiceResult<Vec<PriceItem>> {
        self.get_table(tenant_id, table_id).await?;
        Ok(self.store.list_items(tenant_id, table_id).await?)
    }

    /// Set the price of `product_id` in `table_id`, creating the item if the
    /// table has none for that product yet.
    #[instrument(
        skip(self),
        fields(tenant_id = %tenant_id, table_id = %table_id, product_id = %product_id),
        err
    )]
    pub async fn resolve_or_create_item_price(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
        product_id: ProductId,
        unit_price: Decimal,
    ) -> ServiceResult<PriceItem> {
        let unit_price = validate_unit_price(unit_price)?;
        self.get_table(tenant_id, table_id).await?;
        if self
            .store
            .get_products(tenant_id, &[product_id])
            .await?
            .is_empty()
        {
            return Err(ServiceError::not_found(format!("product {product_id}")));
        }

        let candidate = PriceItem::new(tenant_id, table_id, product_id, unit_price)?;
        let stored = self.store.upsert_item(&candidate).await?;
        info!(item_id = %stored.id, unit_price = %stored.unit_price, "price item upserted");
        Ok(stored)
    }

    /// Add an item at list price for every product the table is missing.
    ///
    /// Existing items keep their price. Returns the table's full item list.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, table_id = %table_id), err)]
    pub async fn synchronize_table_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
    ) -> ServiceResult<Vec<PriceItem>> {
        self.get_table(tenant_id, table_id).await?;

        let existing = self.store.list_items(tenant_id, table_id).await?;
        // A negative list price cannot become a price item; skip the product.
        let (products, unpriceable): (Vec<_>, Vec<_>) = self
            .store
            .list_products(tenant_id)
            .await?
            .into_iter()
            .partition(|p| validate_unit_price(p.list_price).is_ok());
        for product in &unpriceable {
            warn!(
                product_id = %product.id,
                list_price = %product.list_price,
                "product skipped by synchronization: negative list price"
            );
        }
        let plan = plan_synchronization(&existing, &products);

        let missing = plan
            .iter()
            .map(|m| PriceItem::new(tenant_id, table_id, m.product_id, m.unit_price))
            .collect::<Result<Vec<_>, _>>()?;

        let items = self
            .store
            .insert_missing_items(tenant_id, table_id, &missing)
            .await?;
        info!(added = missing.len(), total = items.len(), "price table synchronized");
        Ok(items)
    }

    /// Unit price for an order line: the table's item if there is one,
    /// otherwise `fallback`.
    pub async fn resolve_price_for_order_line(
        &self,
        tenant_id: TenantId,
        table_id: Option<PriceTableId>,
        product_id: ProductId,
        fallback: Decimal,
    ) -> ServiceResult<Decimal> {
        match table_id {
            None => Ok(fallback),
            Some(table_id) => {
                self.get_table(tenant_id, table_id).await?;
                self.price_from_table(tenant_id, table_id, product_id, fallback)
                    .await
            }
        }
    }

    /// Same as [`Self::resolve_price_for_order_line`] for a table already
    /// known to exist.
    pub(crate) async fn price_from_table(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
        product_id: ProductId,
        fallback: Decimal,
    ) -> ServiceResult<Decimal> {
        let item = self
            .store
            .get_item(
                tenant_id,
                PriceItemKey {
                    table_id,
                    product_id,
                },
            )
            .await?;
        Ok(resolve_unit_price(item.as_ref(), fallback))
    }

    /// First active table of a group, by name.
    pub async fn default_table_for_group(
        &self,
        tenant_id: TenantId,
        group_id: PriceGroupId,
    ) -> ServiceResult<Option<PriceTable>> {
        let tables = self.store.list_tables(tenant_id, group_id).await?;
        Ok(tables.into_iter().find(|t| t.active))
    }
}
