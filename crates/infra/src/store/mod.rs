//! Record-store abstraction for the commercial core.
//!
//! Every operation is tenant-scoped: the `TenantId` is always part of the
//! lookup key, so no call can observe another tenant's rows. Operations that
//! the services need to be atomic (item upsert, order numbering, roster
//! replacement) are single trait methods rather than read-then-write pairs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use salesdesk_core::TenantId;
use salesdesk_parties::{ClientId, ClientRecord};
use salesdesk_pricing::{
    PriceGroup, PriceGroupId, PriceItem, PriceItemKey, PriceTable, PriceTableId,
};
use salesdesk_products::{ProductId, ProductRecord};
use salesdesk_sales::{NewOrder, Order, OrderHeaderPatch, OrderId};
use salesdesk_territory::{CommercialArea, CommercialAreaId, SalespersonId, SalespersonRecord};

pub mod memory;
pub mod postgres;
mod schema;

pub use memory::InMemoryCommercialStore;
pub use postgres::PostgresCommercialStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique-key or restrict-on-delete violation.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait PriceCatalogStore: Send + Sync {
    /// Groups ordered by name.
    async fn list_groups(&self, tenant_id: TenantId) -> StoreResult<Vec<PriceGroup>>;
    async fn get_group(
        &self,
        tenant_id: TenantId,
        id: PriceGroupId,
    ) -> StoreResult<Option<PriceGroup>>;
    async fn insert_group(&self, group: &PriceGroup) -> StoreResult<()>;
    /// Overwrite an existing group; `NotFound` when absent.
    async fn update_group(&self, group: &PriceGroup) -> StoreResult<()>;
    /// `Conflict` while the group still owns tables.
    async fn delete_group(&self, tenant_id: TenantId, id: PriceGroupId) -> StoreResult<()>;

    /// Tables of one group ordered by name.
    async fn list_tables(
        &self,
        tenant_id: TenantId,
        group_id: PriceGroupId,
    ) -> StoreResult<Vec<PriceTable>>;
    async fn get_table(
        &self,
        tenant_id: TenantId,
        id: PriceTableId,
    ) -> StoreResult<Option<PriceTable>>;
    /// `NotFound` unless the owning group exists for the same tenant.
    async fn insert_table(&self, table: &PriceTable) -> StoreResult<()>;
    async fn update_table(&self, table: &PriceTable) -> StoreResult<()>;
    /// Removes the table together with its items.
    async fn delete_table(&self, tenant_id: TenantId, id: PriceTableId) -> StoreResult<()>;

    async fn list_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
    ) -> StoreResult<Vec<PriceItem>>;
    async fn get_item(
        &self,
        tenant_id: TenantId,
        key: PriceItemKey,
    ) -> StoreResult<Option<PriceItem>>;
    /// Atomic insert-or-update on `(table_id, product_id)`.
    ///
    /// When an item already exists under the key, only its unit price changes
    /// and its identity is kept. Returns the stored row.
    async fn upsert_item(&self, candidate: &PriceItem) -> StoreResult<PriceItem>;
    /// Insert each item whose key is still free, leaving existing rows alone.
    /// Returns the full item list of the table afterwards.
    async fn insert_missing_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
        items: &[PriceItem],
    ) -> StoreResult<Vec<PriceItem>>;
}

/// Read-only lookups into masters owned by the surrounding application.
#[async_trait]
pub trait MasterDataStore: Send + Sync {
    async fn list_products(&self, tenant_id: TenantId) -> StoreResult<Vec<ProductRecord>>;
    /// The subset of `ids` that exists; missing ids are simply absent.
    async fn get_products(
        &self,
        tenant_id: TenantId,
        ids: &[ProductId],
    ) -> StoreResult<Vec<ProductRecord>>;
    async fn get_client(
        &self,
        tenant_id: TenantId,
        id: ClientId,
    ) -> StoreResult<Option<ClientRecord>>;
    async fn get_salespeople(
        &self,
        tenant_id: TenantId,
        ids: &[SalespersonId],
    ) -> StoreResult<Vec<SalespersonRecord>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Number and persist an order, header and lines in one transaction.
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;
    async fn get_order(&self, tenant_id: TenantId, id: OrderId) -> StoreResult<Option<Order>>;
    /// Most recent first (number descending).
    async fn list_orders(&self, tenant_id: TenantId) -> StoreResult<Vec<Order>>;
    /// Apply a header patch under the row lock; lines are never written.
    async fn update_order_header(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        patch: &OrderHeaderPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Order>;
}

#[async_trait]
pub trait TerritoryStore: Send + Sync {
    /// Areas ordered by name.
    async fn list_areas(&self, tenant_id: TenantId) -> StoreResult<Vec<CommercialArea>>;
    async fn get_area(
        &self,
        tenant_id: TenantId,
        id: CommercialAreaId,
    ) -> StoreResult<Option<CommercialArea>>;
    /// Upsert the area and replace its whole roster atomically.
    async fn save_area(&self, area: &CommercialArea) -> StoreResult<()>;
    async fn delete_area(&self, tenant_id: TenantId, id: CommercialAreaId) -> StoreResult<()>;
}

/// Everything the services need from one backend.
pub trait CommercialStore:
    PriceCatalogStore + MasterDataStore + OrderStore + TerritoryStore
{
}

impl<T> CommercialStore for T where
    T: PriceCatalogStore + MasterDataStore + OrderStore + TerritoryStore + ?Sized
{
}
