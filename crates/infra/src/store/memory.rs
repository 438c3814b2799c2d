use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use salesdesk_core::TenantId;
use salesdesk_parties::{ClientId, ClientRecord};
use salesdesk_pricing::{
    PriceGroup, PriceGroupId, PriceItem, PriceItemKey, PriceTable, PriceTableId,
};
use salesdesk_products::{ProductId, ProductRecord};
use salesdesk_sales::{NewOrder, Order, OrderHeaderPatch, OrderId, OrderNumber};
use salesdesk_territory::{CommercialArea, CommercialAreaId, SalespersonId, SalespersonRecord};

use super::{
    MasterDataStore, OrderStore, PriceCatalogStore, StoreError, StoreResult, TerritoryStore,
};

#[derive(Debug, Default)]
struct State {
    groups: HashMap<(TenantId, PriceGroupId), PriceGroup>,
    tables: HashMap<(TenantId, PriceTableId), PriceTable>,
    items: HashMap<(TenantId, PriceItemKey), PriceItem>,
    products: HashMap<(TenantId, ProductId), ProductRecord>,
    clients: HashMap<(TenantId, ClientId), ClientRecord>,
    salespeople: HashMap<(TenantId, SalespersonId), SalespersonRecord>,
    orders: HashMap<(TenantId, OrderId), Order>,
    order_sequences: HashMap<TenantId, u64>,
    areas: HashMap<(TenantId, CommercialAreaId), CommercialArea>,
}

/// In-memory commercial store for tests/dev.
///
/// One lock guards all maps, so every trait operation is atomic with respect
/// to every other one.
#[derive(Debug, Default)]
pub struct InMemoryCommercialStore {
    inner: RwLock<State>,
}

impl InMemoryCommercialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    /// Seed the product master.
    pub fn put_product(&self, product: ProductRecord) -> StoreResult<()> {
        self.write()?
            .products
            .insert((product.tenant_id, product.id), product);
        Ok(())
    }

    /// Seed the client master.
    pub fn put_client(&self, client: ClientRecord) -> StoreResult<()> {
        self.write()?
            .clients
            .insert((client.tenant_id, client.id), client);
        Ok(())
    }

    /// Seed the personnel registry.
    pub fn put_salesperson(&self, salesperson: SalespersonRecord) -> StoreResult<()> {
        self.write()?
            .salespeople
            .insert((salesperson.tenant_id, salesperson.id), salesperson);
        Ok(())
    }
}

#[async_trait]
impl PriceCatalogStore for InMemoryCommercialStore {
    async fn list_groups(&self, tenant_id: TenantId) -> StoreResult<Vec<PriceGroup>> {
        let state = self.read()?;
        let mut groups: Vec<PriceGroup> = state
            .groups
            .iter()
            .filter(|((t, _), _)| *t == tenant_id)
            .map(|(_, g)| g.clone())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn get_group(
        &self,
        tenant_id: TenantId,
        id: PriceGroupId,
    ) -> StoreResult<Option<PriceGroup>> {
        Ok(self.read()?.groups.get(&(tenant_id, id)).cloned())
    }

    async fn insert_group(&self, group: &PriceGroup) -> StoreResult<()> {
        let mut state = self.write()?;
        let key = (group.tenant_id, group.id);
        if state.groups.contains_key(&key) {
            return Err(StoreError::Conflict(format!("price group {} already exists", group.id)));
        }
        state.groups.insert(key, group.clone());
        Ok(())
    }

    async fn update_group(&self, group: &PriceGroup) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.groups.get_mut(&(group.tenant_id, group.id)) {
            Some(existing) => {
                *existing = group.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("price group {}", group.id))),
        }
    }

    async fn delete_group(&self, tenant_id: TenantId, id: PriceGroupId) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.groups.contains_key(&(tenant_id, id)) {
            return Err(StoreError::NotFound(format!("price group {id}")));
        }
        if state
            .tables
            .values()
            .any(|t| t.tenant_id == tenant_id && t.group_id == id)
        {
            return Err(StoreError::Conflict(format!(
                "price group {id} still has price tables"
            )));
        }
        state.groups.remove(&(tenant_id, id));
        Ok(())
    }

    async fn list_tables(
        &self,
        tenant_id: TenantId,
        group_id: PriceGroupId,
    ) -> StoreResult<Vec<PriceTable>> {
        let state = self.read()?;
        let mut tables: Vec<PriceTable> = state
            .tables
            .values()
            .filter(|t| t.tenant_id == tenant_id && t.group_id == group_id)
            .cloned()
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(tables)
    }

    async fn get_table(
        &self,
        tenant_id: TenantId,
        id: PriceTableId,
    ) -> StoreResult<Option<PriceTable>> {
        Ok(self.read()?.tables.get(&(tenant_id, id)).cloned())
    }

    async fn insert_table(&self, table: &PriceTable) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.groups.contains_key(&(table.tenant_id, table.group_id)) {
            return Err(StoreError::NotFound(format!("price group {}", table.group_id)));
        }
        let key = (table.tenant_id, table.id);
        if state.tables.contains_key(&key) {
            return Err(StoreError::Conflict(format!("price table {} already exists", table.id)));
        }
        state.tables.insert(key, table.clone());
        Ok(())
    }

    async fn update_table(&self, table: &PriceTable) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.tables.get_mut(&(table.tenant_id, table.id)) {
            Some(existing) => {
                *existing = table.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("price table {}", table.id))),
        }
    }

    async fn delete_table(&self, tenant_id: TenantId, id: PriceTableId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.tables.remove(&(tenant_id, id)).is_none() {
            return Err(StoreError::NotFound(format!("price table {id}")));
        }
        state
            .items
            .retain(|(t, key), _| !(*t == tenant_id && key.table_id == id));
        Ok(())
    }

    async fn list_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
    ) -> StoreResult<Vec<PriceItem>> {
        let state = self.read()?;
        Ok(items_of(&state, tenant_id, table_id))
    }

    async fn get_item(
        &self,
        tenant_id: TenantId,
        key: PriceItemKey,
    ) -> StoreResult<Option<PriceItem>> {
        Ok(self.read()?.items.get(&(tenant_id, key)).cloned())
    }

    async fn upsert_item(&self, candidate: &PriceItem) -> StoreResult<PriceItem> {
        let mut state = self.write()?;
        if !state
            .tables
            .contains_key(&(candidate.tenant_id, candidate.table_id))
        {
            return Err(StoreError::NotFound(format!("price table {}", candidate.table_id)));
        }

        let stored = state
            .items
            .entry((candidate.tenant_id, candidate.key()))
            .and_modify(|existing| existing.unit_price = candidate.unit_price)
            .or_insert_with(|| candidate.clone());
        Ok(stored.clone())
    }

    async fn insert_missing_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
        items: &[PriceItem],
    ) -> StoreResult<Vec<PriceItem>> {
        let mut state = self.write()?;
        if !state.tables.contains_key(&(tenant_id, table_id)) {
            return Err(StoreError::NotFound(format!("price table {table_id}")));
        }
        if let Some(stray) = items
            .iter()
            .find(|i| i.tenant_id != tenant_id || i.table_id != table_id)
        {
            return Err(StoreError::TenantIsolation(format!(
                "item {} does not belong to price table {table_id}",
                stray.id
            )));
        }

        for item in items {
            state
                .items
                .entry((tenant_id, item.key()))
                .or_insert_with(|| item.clone());
        }
        Ok(items_of(&state, tenant_id, table_id))
    }
}

fn items_of(state: &State, tenant_id: TenantId, table_id: PriceTableId) -> Vec<PriceItem> {
    let mut items: Vec<PriceItem> = state
        .items
        .iter()
        .filter(|((t, key), _)| *t == tenant_id && key.table_id == table_id)
        .map(|(_, i)| i.clone())
        .collect();
    items.sort_by_key(|i| i.product_id);
    items
}

#[async_trait]
impl MasterDataStore for InMemoryCommercialStore {
    async fn list_products(&self, tenant_id: TenantId) -> StoreResult<Vec<ProductRecord>> {
        let state = self.read()?;
        let mut products: Vec<ProductRecord> = state
            .products
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn get_products(
        &self,
        tenant_id: TenantId,
        ids: &[ProductId],
    ) -> StoreResult<Vec<ProductRecord>> {
        let state = self.read()?;
        let mut found: Vec<ProductRecord> = ids
            .iter()
            .filter_map(|id| state.products.get(&(tenant_id, *id)).cloned())
            .collect();
        found.sort_by_key(|p| p.id);
        found.dedup_by_key(|p| p.id);
        Ok(found)
    }

    async fn get_client(
        &self,
        tenant_id: TenantId,
        id: ClientId,
    ) -> StoreResult<Option<ClientRecord>> {
        Ok(self.read()?.clients.get(&(tenant_id, id)).cloned())
    }

    async fn get_salespeople(
        &self,
        tenant_id: TenantId,
        ids: &[SalespersonId],
    ) -> StoreResult<Vec<SalespersonRecord>> {
        let state = self.read()?;
        let mut found: Vec<SalespersonRecord> = ids
            .iter()
            .filter_map(|id| state.salespeople.get(&(tenant_id, *id)).cloned())
            .collect();
        found.sort_by_key(|s| s.id);
        found.dedup_by_key(|s| s.id);
        Ok(found)
    }
}

#[async_trait]
impl OrderStore for InMemoryCommercialStore {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut state = self.write()?;
        let tenant_id = order.tenant_id;
        if state.orders.contains_key(&(tenant_id, order.id)) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }

        // Counter starts from the number of orders already on file.
        let existing = state
            .orders
            .keys()
            .filter(|(t, _)| *t == tenant_id)
            .count() as u64;
        let counter = state.order_sequences.entry(tenant_id).or_insert(existing);
        let number = match *counter {
            0 => OrderNumber::FIRST,
            last => OrderNumber(last).next().ok_or_else(|| {
                StoreError::Backend(format!("order numbers exhausted for tenant {tenant_id}"))
            })?,
        };
        *counter = number.value();

        let order = order.into_order(number);
        state.orders.insert((tenant_id, order.id), order.clone());
        Ok(order)
    }

    async fn get_order(&self, tenant_id: TenantId, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.get(&(tenant_id, id)).cloned())
    }

    async fn list_orders(&self, tenant_id: TenantId) -> StoreResult<Vec<Order>> {
        let state = self.read()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.number.cmp(&a.number));
        Ok(orders)
    }

    async fn update_order_header(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        patch: &OrderHeaderPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut state = self.write()?;
        let order = state
            .orders
            .get_mut(&(tenant_id, id))
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        patch.apply_to(order, now);
        Ok(order.clone())
    }
}

#[async_trait]
impl TerritoryStore for InMemoryCommercialStore {
    async fn list_areas(&self, tenant_id: TenantId) -> StoreResult<Vec<CommercialArea>> {
        let state = self.read()?;
        let mut areas: Vec<CommercialArea> = state
            .areas
            .values()
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect();
        areas.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(areas)
    }

    async fn get_area(
        &self,
        tenant_id: TenantId,
        id: CommercialAreaId,
    ) -> StoreResult<Option<CommercialArea>> {
        Ok(self.read()?.areas.get(&(tenant_id, id)).cloned())
    }

    async fn save_area(&self, area: &CommercialArea) -> StoreResult<()> {
        let mut state = self.write()?;
        for (idx, r) in area.representatives.iter().enumerate() {
            if area.representatives[..idx]
                .iter()
                .any(|other| other.function == r.function)
            {
                return Err(StoreError::Conflict(format!(
                    "function '{}' already occupied in area {}",
                    r.function, area.id
                )));
            }
        }
        state.areas.insert((area.tenant_id, area.id), area.clone());
        Ok(())
    }

    async fn delete_area(&self, tenant_id: TenantId, id: CommercialAreaId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .areas
            .remove(&(tenant_id, id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("commercial area {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use salesdesk_pricing::{PriceGroupInput, PriceTableInput};
    use salesdesk_sales::{OrderHeader, OrderStatus, RequestedLine, compose};
    use salesdesk_core::Percentage;

    fn group(tenant_id: TenantId) -> PriceGroup {
        PriceGroup::create(
            tenant_id,
            PriceGroupInput {
                name: "Retail".to_string(),
                active: true,
            },
        )
        .unwrap()
    }

    fn table(tenant_id: TenantId, group_id: PriceGroupId) -> PriceTable {
        PriceTable::create(
            tenant_id,
            group_id,
            PriceTableInput {
                name: "Base".to_string(),
                active: true,
                default_discount: Percentage::ZERO,
                client_activity: None,
            },
        )
        .unwrap()
    }

    fn new_order(tenant_id: TenantId) -> NewOrder {
        let header = OrderHeader {
            client_id: Some(ClientId::new()),
            ..OrderHeader::default()
        };
        let lines = [RequestedLine {
            product_id: ProductId::new(),
            quantity: Decimal::ONE,
            unit_price: Decimal::new(100, 2),
            discount: None,
        }];
        compose(tenant_id, header, &lines, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_key() {
        let store = InMemoryCommercialStore::new();
        let tenant_id = TenantId::new();
        let g = group(tenant_id);
        store.insert_group(&g).await.unwrap();
        let t = table(tenant_id, g.id);
        store.insert_table(&t).await.unwrap();

        let product_id = ProductId::new();
        let first = PriceItem::new(tenant_id, t.id, product_id, Decimal::new(500, 2)).unwrap();
        let second = PriceItem::new(tenant_id, t.id, product_id, Decimal::new(700, 2)).unwrap();

        let stored_first = store.upsert_item(&first).await.unwrap();
        let stored_second = store.upsert_item(&second).await.unwrap();

        assert_eq!(stored_first.id, stored_second.id);
        let items = store.list_items(tenant_id, t.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, Decimal::new(700, 2));
    }

    #[tokio::test]
    async fn group_with_tables_cannot_be_deleted() {
        let store = InMemoryCommercialStore::new();
        let tenant_id = TenantId::new();
        let g = group(tenant_id);
        store.insert_group(&g).await.unwrap();
        let t = table(tenant_id, g.id);
        store.insert_table(&t).await.unwrap();

        let err = store.delete_group(tenant_id, g.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.delete_table(tenant_id, t.id).await.unwrap();
        store.delete_group(tenant_id, g.id).await.unwrap();
        assert!(store.get_group(tenant_id, g.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn table_requires_group_of_same_tenant() {
        let store = InMemoryCommercialStore::new();
        let g = group(TenantId::new());
        store.insert_group(&g).await.unwrap();

        let foreign = table(TenantId::new(), g.id);
        let err = store.insert_table(&foreign).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn order_numbers_are_per_tenant() {
        let store = InMemoryCommercialStore::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();

        let a1 = store.insert_order(new_order(tenant_a)).await.unwrap();
        let a2 = store.insert_order(new_order(tenant_a)).await.unwrap();
        let b1 = store.insert_order(new_order(tenant_b)).await.unwrap();

        assert_eq!(a1.number, OrderNumber(1));
        assert_eq!(a2.number, OrderNumber(2));
        assert_eq!(b1.number, OrderNumber(1));

        let listed = store.list_orders(tenant_a).await.unwrap();
        assert_eq!(
            listed.iter().map(|o| o.number).collect::<Vec<_>>(),
            vec![OrderNumber(2), OrderNumber(1)]
        );
    }

    #[tokio::test]
    async fn header_update_leaves_lines_alone() {
        let store = InMemoryCommercialStore::new();
        let tenant_id = TenantId::new();
        let order = store.insert_order(new_order(tenant_id)).await.unwrap();

        let patch = OrderHeaderPatch {
            status: Some(OrderStatus::Approved),
            ..OrderHeaderPatch::default()
        };
        let updated = store
            .update_order_header(tenant_id, order.id, &patch, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Approved);
        assert_eq!(updated.lines, order.lines);

        let err = store
            .update_order_header(TenantId::new(), order.id, &patch, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
