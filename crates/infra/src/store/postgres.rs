//! Postgres-backed commercial store.
//!
//! ## Atomicity
//!
//! | Operation | Mechanism |
//! |-----------|-----------|
//! | `upsert_item` | single `INSERT ... ON CONFLICT (tenant_id, table_id, product_id) DO UPDATE` |
//! | `insert_missing_items` | one transaction of `INSERT ... ON CONFLICT DO NOTHING` |
//! | `insert_order` | counter row increment, header and lines in one transaction |
//! | `update_order_header` | `SELECT ... FOR UPDATE`, patch, `UPDATE` in one transaction |
//! | `save_area` | area upsert and roster replacement in one transaction |
//!
//! ## Error mapping
//!
//! | Postgres code | `StoreError` |
//! |---------------|--------------|
//! | `23505` (unique violation) | `Conflict` |
//! | `23503` (foreign key violation) | `Conflict` (or `NotFound` for a missing parent) |
//! | anything else | `Backend` |

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use salesdesk_core::{Percentage, Quantity, TenantId};
use salesdesk_parties::{ClientId, ClientRecord, PaymentConditionId};
use salesdesk_pricing::{
    PriceGroup, PriceGroupId, PriceItem, PriceItemId, PriceItemKey, PriceTable, PriceTableId,
};
use salesdesk_products::{ProductId, ProductRecord};
use salesdesk_sales::{
    NewOrder, Order, OrderHeaderPatch, OrderId, OrderLine, OrderNumber, OrderStatus, OrderTotals,
};
use salesdesk_territory::{
    AssignmentId, CommercialArea, CommercialAreaId, CommercialFunction, CommissionProfileId,
    RepresentativeAssignment, SalespersonId, SalespersonRecord,
};

use super::schema::SCHEMA;
use super::{
    MasterDataStore, OrderStore, PriceCatalogStore, StoreError, StoreResult, TerritoryStore,
};

/// Commercial store on a sqlx connection pool.
///
/// Every statement filters on `tenant_id`; composite foreign keys include it
/// as well, so cross-tenant references are rejected by the database.
#[derive(Debug, Clone)]
pub struct PostgresCommercialStore {
    pool: PgPool,
}

impl PostgresCommercialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Safe to run on every startup.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> StoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

#[async_trait]
impl PriceCatalogStore for PostgresCommercialStore {
    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_groups(&self, tenant_id: TenantId) -> StoreResult<Vec<PriceGroup>> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, name, active
            FROM price_groups
            WHERE tenant_id = $1
            ORDER BY name, id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_price_groups", e))?;

        rows.iter().map(group_from_row).collect()
    }

    async fn get_group(
        &self,
        tenant_id: TenantId,
        id: PriceGroupId,
    ) -> StoreResult<Option<PriceGroup>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, id, name, active
            FROM price_groups
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_price_group", e))?;

        row.as_ref().map(group_from_row).transpose()
    }

    #[instrument(skip(self, group), fields(tenant_id = %group.tenant_id, group_id = %group.id), err)]
    async fn insert_group(&self, group: &PriceGroup) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO price_groups (tenant_id, id, name, active)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(*group.tenant_id.as_uuid())
        .bind(*group.id.as_uuid())
        .bind(&group.name)
        .bind(group.active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_price_group", e))?;
        Ok(())
    }

    #[instrument(skip(self, group), fields(tenant_id = %group.tenant_id, group_id = %group.id), err)]
    async fn update_group(&self, group: &PriceGroup) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE price_groups
            SET name = $3, active = $4
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(*group.tenant_id.as_uuid())
        .bind(*group.id.as_uuid())
        .bind(&group.name)
        .bind(group.active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_price_group", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("price group {}", group.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, group_id = %id), err)]
    async fn delete_group(&self, tenant_id: TenantId, id: PriceGroupId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM price_groups WHERE tenant_id = $1 AND id = $2")
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if has_code(&e, FOREIGN_KEY_VIOLATION) {
                    StoreError::Conflict(format!("price group {id} still has price tables"))
                } else {
                    map_sqlx_error("delete_price_group", e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("price group {id}")));
        }
        Ok(())
    }

    async fn list_tables(
        &self,
        tenant_id: TenantId,
        group_id: PriceGroupId,
    ) -> StoreResult<Vec<PriceTable>> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, group_id, name, active, default_discount, client_activity
            FROM price_tables
            WHERE tenant_id = $1 AND group_id = $2
            ORDER BY name, id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*group_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_price_tables", e))?;

        rows.iter().map(table_from_row).collect()
    }

    async fn get_table(
        &self,
        tenant_id: TenantId,
        id: PriceTableId,
    ) -> StoreResult<Option<PriceTable>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, id, group_id, name, active, default_discount, client_activity
            FROM price_tables
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_price_table", e))?;

        row.as_ref().map(table_from_row).transpose()
    }

    #[instrument(skip(self, table), fields(tenant_id = %table.tenant_id, table_id = %table.id), err)]
    async fn insert_table(&self, table: &PriceTable) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO price_tables
                (tenant_id, id, group_id, name, active, default_discount, client_activity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*table.tenant_id.as_uuid())
        .bind(*table.id.as_uuid())
        .bind(*table.group_id.as_uuid())
        .bind(&table.name)
        .bind(table.active)
        .bind(table.default_discount.value())
        .bind(table.client_activity.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if has_code(&e, FOREIGN_KEY_VIOLATION) {
                StoreError::NotFound(format!("price group {}", table.group_id))
            } else {
                map_sqlx_error("insert_price_table", e)
            }
        })?;
        Ok(())
    }

    #[instrument(skip(self, table), fields(tenant_id = %table.tenant_id, table_id = %table.id), err)]
    async fn update_table(&self, table: &PriceTable) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE price_tables
            SET name = $3, active = $4, default_discount = $5, client_activity = $6
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(*table.tenant_id.as_uuid())
        .bind(*table.id.as_uuid())
        .bind(&table.name)
        .bind(table.active)
        .bind(table.default_discount.value())
        .bind(table.client_activity.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_price_table", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("price table {}", table.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, table_id = %id), err)]
    async fn delete_table(&self, tenant_id: TenantId, id: PriceTableId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM price_tables WHERE tenant_id = $1 AND id = $2")
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_price_table", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("price table {id}")));
        }
        Ok(())
    }

    async fn list_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
    ) -> StoreResult<Vec<PriceItem>> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, table_id, product_id, unit_price
            FROM price_items
            WHERE tenant_id = $1 AND table_id = $2
            ORDER BY product_id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*table_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_price_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    async fn get_item(
        &self,
        tenant_id: TenantId,
        key: PriceItemKey,
    ) -> StoreResult<Option<PriceItem>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, id, table_id, product_id, unit_price
            FROM price_items
            WHERE tenant_id = $1 AND table_id = $2 AND product_id = $3
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*key.table_id.as_uuid())
        .bind(*key.product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_price_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(
        skip(self, candidate),
        fields(
            tenant_id = %candidate.tenant_id,
            table_id = %candidate.table_id,
            product_id = %candidate.product_id
        ),
        err
    )]
    async fn upsert_item(&self, candidate: &PriceItem) -> StoreResult<PriceItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO price_items (tenant_id, id, table_id, product_id, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, table_id, product_id)
            DO UPDATE SET unit_price = EXCLUDED.unit_price
            RETURNING tenant_id, id, table_id, product_id, unit_price
            "#,
        )
        .bind(*candidate.tenant_id.as_uuid())
        .bind(*candidate.id.as_uuid())
        .bind(*candidate.table_id.as_uuid())
        .bind(*candidate.product_id.as_uuid())
        .bind(candidate.unit_price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if has_code(&e, FOREIGN_KEY_VIOLATION) {
                StoreError::NotFound(format!("price table {}", candidate.table_id))
            } else {
                map_sqlx_error("upsert_price_item", e)
            }
        })?;

        item_from_row(&row)
    }

    #[instrument(
        skip(self, items),
        fields(tenant_id = %tenant_id, table_id = %table_id, candidates = items.len()),
        err
    )]
    async fn insert_missing_items(
        &self,
        tenant_id: TenantId,
        table_id: PriceTableId,
        items: &[PriceItem],
    ) -> StoreResult<Vec<PriceItem>> {
        if let Some(stray) = items
            .iter()
            .find(|i| i.tenant_id != tenant_id || i.table_id != table_id)
        {
            return Err(StoreError::TenantIsolation(format!(
                "item {} does not belong to price table {table_id}",
                stray.id
            )));
        }

        let mut tx = self.begin().await?;

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM price_tables WHERE tenant_id = $1 AND id = $2)",
        )
        .bind(*tenant_id.as_uuid())
        .bind(*table_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("check_price_table", e))?;
        if !exists {
            return Err(StoreError::NotFound(format!("price table {table_id}")));
        }

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO price_items (tenant_id, id, table_id, product_id, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (tenant_id, table_id, product_id) DO NOTHING
                "#,
            )
            .bind(*tenant_id.as_uuid())
            .bind(*item.id.as_uuid())
            .bind(*table_id.as_uuid())
            .bind(*item.product_id.as_uuid())
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_missing_price_item", e))?;
        }

        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, table_id, product_id, unit_price
            FROM price_items
            WHERE tenant_id = $1 AND table_id = $2
            ORDER BY product_id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*table_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_price_items", e))?;

        let stored = rows.iter().map(item_from_row).collect::<StoreResult<Vec<_>>>()?;
        commit(tx).await?;
        Ok(stored)
    }
}

#[async_trait]
impl MasterDataStore for PostgresCommercialStore {
    async fn list_products(&self, tenant_id: TenantId) -> StoreResult<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, name, list_price, active
            FROM products
            WHERE tenant_id = $1
            ORDER BY id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    async fn get_products(
        &self,
        tenant_id: TenantId,
        ids: &[ProductId],
    ) -> StoreResult<Vec<ProductRecord>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, name, list_price, active
            FROM products
            WHERE tenant_id = $1 AND id = ANY($2)
            ORDER BY id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    async fn get_client(
        &self,
        tenant_id: TenantId,
        id: ClientId,
    ) -> StoreResult<Option<ClientRecord>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, id, name, price_group_id, commercial_area_id
            FROM clients
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_client", e))?;

        row.as_ref().map(client_from_row).transpose()
    }

    async fn get_salespeople(
        &self,
        tenant_id: TenantId,
        ids: &[SalespersonId],
    ) -> StoreResult<Vec<SalespersonRecord>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, name
            FROM salespeople
            WHERE tenant_id = $1 AND id = ANY($2)
            ORDER BY id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_salespeople", e))?;

        rows.iter()
            .map(|row| {
                Ok(SalespersonRecord {
                    id: SalespersonId::from_uuid(col(row, "id")?),
                    tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
                    name: col(row, "name")?,
                })
            })
            .collect()
    }
}

const ORDER_COLUMNS: &str = r#"
    tenant_id, id, number, client_id, salesperson_id, status, valid_until,
    payment_condition_id, notes, subtotal, total_discount, total, created_at, updated_at
"#;

#[async_trait]
impl OrderStore for PostgresCommercialStore {
    #[instrument(
        skip(self, order),
        fields(tenant_id = %order.tenant_id, order_id = %order.id, lines = order.lines.len()),
        err
    )]
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut tx = self.begin().await?;

        // First use seeds the counter from the orders already on file.
        let number: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_sequences (tenant_id, last_number)
            VALUES ($1, (SELECT COUNT(*) FROM orders WHERE tenant_id = $1) + 1)
            ON CONFLICT (tenant_id)
            DO UPDATE SET last_number = order_sequences.last_number + 1
            RETURNING last_number
            "#,
        )
        .bind(*order.tenant_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("next_order_number", e))?;

        let order = order.into_order(OrderNumber(number as u64));

        sqlx::query(
            r#"
            INSERT INTO orders (
                tenant_id, id, number, client_id, salesperson_id, status, valid_until,
                payment_condition_id, notes, subtotal, total_discount, total,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(*order.tenant_id.as_uuid())
        .bind(*order.id.as_uuid())
        .bind(number)
        .bind(*order.client_id.as_uuid())
        .bind(order.salesperson_id.map(|s| *s.as_uuid()))
        .bind(order.status.as_str())
        .bind(order.valid_until)
        .bind(order.payment_condition_id.map(|p| *p.as_uuid()))
        .bind(order.notes.as_deref())
        .bind(order.totals.subtotal)
        .bind(order.totals.total_discount)
        .bind(order.totals.total)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    tenant_id, order_id, line_no, product_id, quantity,
                    unit_price, discount, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(*order.tenant_id.as_uuid())
            .bind(*order.id.as_uuid())
            .bind(line.line_no as i32)
            .bind(*line.product_id.as_uuid())
            .bind(line.quantity.value())
            .bind(line.unit_price)
            .bind(line.discount)
            .bind(line.line_total)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_line", e))?;
        }

        commit(tx).await?;
        Ok(order)
    }

    async fn get_order(&self, tenant_id: TenantId, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut lines = load_lines(&self.pool, tenant_id, &[*id.as_uuid()]).await?;
        let lines = lines.remove(id.as_uuid()).unwrap_or_default();
        order_from_row(&row, lines).map(Some)
    }

    async fn list_orders(&self, tenant_id: TenantId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 ORDER BY number DESC"
        ))
        .bind(*tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let ids = rows
            .iter()
            .map(|row| col::<Uuid>(row, "id"))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut lines = load_lines(&self.pool, tenant_id, &ids).await?;

        rows.iter()
            .zip(&ids)
            .map(|(row, id)| order_from_row(row, lines.remove(id).unwrap_or_default()))
            .collect()
    }

    #[instrument(skip(self, patch), fields(tenant_id = %tenant_id, order_id = %id), err)]
    async fn update_order_header(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        patch: &OrderHeaderPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_order", e))?
        .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;

        let mut lines = load_lines(&mut *tx, tenant_id, &[*id.as_uuid()]).await?;
        let mut order = order_from_row(&row, lines.remove(id.as_uuid()).unwrap_or_default())?;

        if patch.apply_to(&mut order, now) {
            sqlx::query(
                r#"
                UPDATE orders
                SET status = $3, notes = $4, payment_condition_id = $5,
                    valid_until = $6, salesperson_id = $7, updated_at = $8
                WHERE tenant_id = $1 AND id = $2
                "#,
            )
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .bind(order.status.as_str())
            .bind(order.notes.as_deref())
            .bind(order.payment_condition_id.map(|p| *p.as_uuid()))
            .bind(order.valid_until)
            .bind(order.salesperson_id.map(|s| *s.as_uuid()))
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_header", e))?;
        }

        commit(tx).await?;
        Ok(order)
    }
}

async fn load_lines<'e, E>(
    executor: E,
    tenant_id: TenantId,
    order_ids: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<OrderLine>>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query(
        r#"
        SELECT order_id, line_no, product_id, quantity, unit_price, discount, line_total
        FROM order_lines
        WHERE tenant_id = $1 AND order_id = ANY($2)
        ORDER BY order_id, line_no
        "#,
    )
    .bind(*tenant_id.as_uuid())
    .bind(order_ids.to_vec())
    .fetch_all(executor)
    .await
    .map_err(|e| map_sqlx_error("load_order_lines", e))?;

    let mut by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for row in &rows {
        let order_id: Uuid = col(row, "order_id")?;
        let quantity = Quantity::new(col(row, "quantity")?)
            .map_err(|e| StoreError::Backend(format!("stored order line quantity: {e}")))?;
        let line_no: i32 = col(row, "line_no")?;
        by_order.entry(order_id).or_default().push(OrderLine {
            line_no: line_no as u32,
            product_id: ProductId::from_uuid(col(row, "product_id")?),
            quantity,
            unit_price: col(row, "unit_price")?,
            discount: col(row, "discount")?,
            line_total: col(row, "line_total")?,
        });
    }
    Ok(by_order)
}

#[async_trait]
impl TerritoryStore for PostgresCommercialStore {
    async fn list_areas(&self, tenant_id: TenantId) -> StoreResult<Vec<CommercialArea>> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, id, name, description
            FROM commercial_areas
            WHERE tenant_id = $1
            ORDER BY name, id
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_commercial_areas", e))?;

        let ids = rows
            .iter()
            .map(|row| col::<Uuid>(row, "id"))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut rosters = load_rosters(&self.pool, tenant_id, &ids).await?;

        rows.iter()
            .zip(&ids)
            .map(|(row, id)| area_from_row(row, rosters.remove(id).unwrap_or_default()))
            .collect()
    }

    async fn get_area(
        &self,
        tenant_id: TenantId,
        id: CommercialAreaId,
    ) -> StoreResult<Option<CommercialArea>> {
        let row = sqlx::query(
            r#"
            SELECT tenant_id, id, name, description
            FROM commercial_areas
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(*tenant_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_commercial_area", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut rosters = load_rosters(&self.pool, tenant_id, &[*id.as_uuid()]).await?;
        area_from_row(&row, rosters.remove(id.as_uuid()).unwrap_or_default()).map(Some)
    }

    #[instrument(
        skip(self, area),
        fields(tenant_id = %area.tenant_id, area_id = %area.id, representatives = area.representatives.len()),
        err
    )]
    async fn save_area(&self, area: &CommercialArea) -> StoreResult<()> {
        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO commercial_areas (tenant_id, id, name, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, id)
            DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description
            "#,
        )
        .bind(*area.tenant_id.as_uuid())
        .bind(*area.id.as_uuid())
        .bind(&area.name)
        .bind(area.description.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_commercial_area", e))?;

        sqlx::query("DELETE FROM area_representatives WHERE tenant_id = $1 AND area_id = $2")
            .bind(*area.tenant_id.as_uuid())
            .bind(*area.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_area_roster", e))?;

        for (position, rep) in area.representatives.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO area_representatives (
                    tenant_id, id, area_id, position, salesperson_id, function,
                    commission_profile_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(*area.tenant_id.as_uuid())
            .bind(*rep.id.as_uuid())
            .bind(*area.id.as_uuid())
            .bind(position as i32)
            .bind(*rep.salesperson_id.as_uuid())
            .bind(rep.function.as_str())
            .bind(*rep.commission_profile_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if has_code(&e, UNIQUE_VIOLATION) {
                    StoreError::Conflict(format!(
                        "function '{}' already occupied in area {}",
                        rep.function, area.id
                    ))
                } else {
                    map_sqlx_error("insert_area_representative", e)
                }
            })?;
        }

        commit(tx).await
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, area_id = %id), err)]
    async fn delete_area(&self, tenant_id: TenantId, id: CommercialAreaId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM commercial_areas WHERE tenant_id = $1 AND id = $2")
            .bind(*tenant_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_commercial_area", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("commercial area {id}")));
        }
        Ok(())
    }
}

async fn load_rosters(
    pool: &PgPool,
    tenant_id: TenantId,
    area_ids: &[Uuid],
) -> StoreResult<HashMap<Uuid, Vec<RepresentativeAssignment>>> {
    let rows = sqlx::query(
        r#"
        SELECT area_id, id, salesperson_id, function, commission_profile_id
        FROM area_representatives
        WHERE tenant_id = $1 AND area_id = ANY($2)
        ORDER BY area_id, position
        "#,
    )
    .bind(*tenant_id.as_uuid())
    .bind(area_ids.to_vec())
    .fetch_all(pool)
    .await
    .map_err(|e| map_sqlx_error("load_area_rosters", e))?;

    let mut by_area: HashMap<Uuid, Vec<RepresentativeAssignment>> = HashMap::new();
    for row in &rows {
        let area_id: Uuid = col(row, "area_id")?;
        let raw_function: String = col(row, "function")?;
        let function = CommercialFunction::parse(&raw_function).ok_or_else(|| {
            StoreError::Backend(format!("unknown commercial function '{raw_function}'"))
        })?;
        by_area.entry(area_id).or_default().push(RepresentativeAssignment {
            id: AssignmentId::from_uuid(col(row, "id")?),
            salesperson_id: SalespersonId::from_uuid(col(row, "salesperson_id")?),
            function,
            commission_profile_id: CommissionProfileId::from_uuid(col(
                row,
                "commission_profile_id",
            )?),
        });
    }
    Ok(by_area)
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Backend(format!("failed to decode column {name}: {e}")))
}

fn group_from_row(row: &PgRow) -> StoreResult<PriceGroup> {
    Ok(PriceGroup {
        id: PriceGroupId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        name: col(row, "name")?,
        active: col(row, "active")?,
    })
}

fn table_from_row(row: &PgRow) -> StoreResult<PriceTable> {
    let default_discount = Percentage::new(col(row, "default_discount")?)
        .map_err(|e| StoreError::Backend(format!("stored default discount: {e}")))?;
    Ok(PriceTable {
        id: PriceTableId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        group_id: PriceGroupId::from_uuid(col(row, "group_id")?),
        name: col(row, "name")?,
        active: col(row, "active")?,
        default_discount,
        client_activity: col(row, "client_activity")?,
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<PriceItem> {
    Ok(PriceItem {
        id: PriceItemId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        table_id: PriceTableId::from_uuid(col(row, "table_id")?),
        product_id: ProductId::from_uuid(col(row, "product_id")?),
        unit_price: col(row, "unit_price")?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<ProductRecord> {
    Ok(ProductRecord {
        id: ProductId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        name: col(row, "name")?,
        list_price: col(row, "list_price")?,
        active: col(row, "active")?,
    })
}

fn client_from_row(row: &PgRow) -> StoreResult<ClientRecord> {
    let price_group_id: Option<Uuid> = col(row, "price_group_id")?;
    let commercial_area_id: Option<Uuid> = col(row, "commercial_area_id")?;
    Ok(ClientRecord {
        id: ClientId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        name: col(row, "name")?,
        price_group_id: price_group_id.map(PriceGroupId::from_uuid),
        commercial_area_id: commercial_area_id.map(CommercialAreaId::from_uuid),
    })
}

fn order_from_row(row: &PgRow, lines: Vec<OrderLine>) -> StoreResult<Order> {
    let number: i64 = col(row, "number")?;
    let raw_status: String = col(row, "status")?;
    let status = OrderStatus::parse(&raw_status)
        .ok_or_else(|| StoreError::Backend(format!("unknown order status '{raw_status}'")))?;
    let salesperson_id: Option<Uuid> = col(row, "salesperson_id")?;
    let payment_condition_id: Option<Uuid> = col(row, "payment_condition_id")?;
    let valid_until: Option<NaiveDate> = col(row, "valid_until")?;
    let subtotal: Decimal = col(row, "subtotal")?;
    let total_discount: Decimal = col(row, "total_discount")?;
    let total: Decimal = col(row, "total")?;

    Ok(Order {
        id: OrderId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        number: OrderNumber(number as u64),
        client_id: ClientId::from_uuid(col(row, "client_id")?),
        salesperson_id: salesperson_id.map(SalespersonId::from_uuid),
        status,
        valid_until,
        payment_condition_id: payment_condition_id.map(PaymentConditionId::from_uuid),
        notes: col(row, "notes")?,
        totals: OrderTotals {
            subtotal,
            total_discount,
            total,
        },
        lines,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn area_from_row(
    row: &PgRow,
    representatives: Vec<RepresentativeAssignment>,
) -> StoreResult<CommercialArea> {
    Ok(CommercialArea {
        id: CommercialAreaId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        name: col(row, "name")?,
        description: col(row, "description")?,
        representatives,
    })
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(c) = db_err.code() {
            return c.as_ref() == code;
        }
    }
    false
}

/// Map sqlx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => {
            StoreError::NotFound(format!("row not found in {}", operation))
        }
        other => StoreError::Backend(format!("sqlx error in {}: {}", operation, other)),
    }
}
