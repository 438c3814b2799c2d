use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use salesdesk_core::TenantId;
use salesdesk_parties::{ClientId, ClientRecord, PaymentConditionId};
use salesdesk_pricing::PriceTableId;
use salesdesk_products::{ProductId, ProductRecord};
use salesdesk_sales::{
    Order, OrderHeader, OrderHeaderPatch, OrderId, OrderStatus, RequestedLine, compose,
    price_line,
};
use salesdesk_territory::SalespersonId;

use super::ensure_salespeople_exist;
use super::error::{ServiceError, ServiceResult};
use super::pricing::PriceResolutionService;
use crate::store::{MasterDataStore, OrderStore, PriceCatalogStore};

/// One requested order line.
///
/// Without `unit_price` the price comes from the catalog (see
/// [`OrderCompositionService::compose_order`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeOrderRequest {
    pub client_id: ClientId,
    #[serde(default)]
    pub salesperson_id: Option<SalespersonId>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub payment_condition_id: Option<PaymentConditionId>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Table to price lines from; defaults to the client's group.
    #[serde(default)]
    pub price_table_id: Option<PriceTableId>,
    pub lines: Vec<OrderLineRequest>,
}

/// An order with the records it references, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    pub order: Order,
    pub client: Option<ClientRecord>,
    pub products: Vec<ProductRecord>,
}

pub struct OrderCompositionService<S: ?Sized> {
    store: Arc<S>,
    pricing: PriceResolutionService<S>,
}

impl<S: ?Sized> Clone for OrderCompositionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pricing: self.pricing.clone(),
        }
    }
}

impl<S> OrderCompositionService<S>
where
    S: PriceCatalogStore + MasterDataStore + OrderStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            pricing: PriceResolutionService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Price, total, number and persist a new order.
    ///
    /// Lines are checked before any lookup so malformed quantities fail
    /// without touching the store. Lines without a unit price are priced
    /// from `price_table_id`, else from the first active table of the
    /// client's price group, else at the product's list price.
    #[instrument(
        skip(self, request),
        fields(tenant_id = %tenant_id, client_id = %request.client_id, lines = request.lines.len()),
        err
    )]
    pub async fn compose_order(
        &self,
        tenant_id: TenantId,
        request: ComposeOrderRequest,
    ) -> ServiceResult<OrderDetails> {
        if request.lines.is_empty() {
            return Err(ServiceError::validation("order must have at least one line"));
        }
        for (idx, line) in request.lines.iter().enumerate() {
            price_line(
                (idx as u32) + 1,
                &RequestedLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price.unwrap_or(Decimal::ZERO),
                    discount: line.discount,
                },
            )?;
        }

        let client = self
            .store
            .get_client(tenant_id, request.client_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("client {}", request.client_id)))?;

        let mut product_ids: Vec<ProductId> =
            request.lines.iter().map(|l| l.product_id).collect();
        product_ids.sort();
        product_ids.dedup();
        let products = self.store.get_products(tenant_id, &product_ids).await?;
        for id in &product_ids {
            match products.iter().find(|p| p.id == *id) {
                None => return Err(ServiceError::not_found(format!("product {id}"))),
                Some(p) if !p.can_be_sold() => {
                    return Err(ServiceError::validation(format!(
                        "product {id} is not available for sale"
                    )));
                }
                Some(_) => {}
            }
        }

        if let Some(salesperson_id) = request.salesperson_id {
            ensure_salespeople_exist(self.store.as_ref(), tenant_id, &[salesperson_id]).await?;
        }

        let table_id = match request.price_table_id {
            Some(id) => Some(self.pricing.get_table(tenant_id, id).await?.id),
            None => match client.price_group_id {
                Some(group_id) if request.lines.iter().any(|l| l.unit_price.is_none()) => self
                    .pricing
                    .default_table_for_group(tenant_id, group_id)
                    .await?
                    .map(|t| t.id),
                _ => None,
            },
        };

        let mut requested = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let unit_price = match (line.unit_price, table_id) {
                (Some(explicit), _) => explicit,
                (None, table) => {
                    let list_price = products
                        .iter()
                        .find(|p| p.id == line.product_id)
                        .map(|p| p.list_price)
                        .ok_or_else(|| {
                            ServiceError::not_found(format!("product {}", line.product_id))
                        })?;
                    match table {
                        Some(table_id) => {
                            self.pricing
                                .price_from_table(tenant_id, table_id, line.product_id, list_price)
                                .await?
                        }
                        None => list_price,
                    }
                }
            };
            requested.push(RequestedLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
                discount: line.discount,
            });
        }

        let header = OrderHeader {
            client_id: Some(client.id),
            salesperson_id: request.salesperson_id,
            status: request.status.unwrap_or_default(),
            valid_until: request.valid_until,
            payment_condition_id: request.payment_condition_id,
            notes: request.notes,
        };
        let composed = compose(tenant_id, header, &requested, Utc::now())?;
        let order = self.store.insert_order(composed).await?;

        info!(
            order_id = %order.id,
            order_number = %order.number,
            subtotal = %order.totals.subtotal,
            total_discount = %order.totals.total_discount,
            total = %order.totals.total,
            "order composed"
        );

        Ok(OrderDetails {
            order,
            client: Some(client),
            products,
        })
    }

    /// Most recent first.
    pub async fn list_orders(&self, tenant_id: TenantId) -> ServiceResult<Vec<Order>> {
        Ok(self.store.list_orders(tenant_id).await?)
    }

    pub async fn get_order(&self, tenant_id: TenantId, id: OrderId) -> ServiceResult<OrderDetails> {
        let order = self
            .store
            .get_order(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("order {id}")))?;
        let client = self.store.get_client(tenant_id, order.client_id).await?;
        let products = self
            .store
            .get_products(tenant_id, &order.product_ids())
            .await?;
        Ok(OrderDetails {
            order,
            client,
            products,
        })
    }

    /// Change header fields only; lines and totals stay as composed.
    #[instrument(skip(self, patch), fields(tenant_id = %tenant_id, order_id = %id), err)]
    pub async fn update_order_header(
        &self,
        tenant_id: TenantId,
        id: OrderId,
        patch: OrderHeaderPatch,
    ) -> ServiceResult<Order> {
        if patch.is_empty() {
            return self
                .store
                .get_order(tenant_id, id)
                .await?
                .ok_or_else(|| ServiceError::not_found(format!("order {id}")));
        }
        if let Some(salesperson_id) = patch.salesperson_id {
            ensure_salespeople_exist(self.store.as_ref(), tenant_id, &[salesperson_id]).await?;
        }
        let order = self
            .store
            .update_order_header(tenant_id, id, &patch, Utc::now())
            .await?;
        info!(order_number = %order.number, status = order.status.as_str(), "order header updated");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{Fixture, dec};
    use crate::store::InMemoryCommercialStore;
    use salesdesk_core::Percentage;
    use salesdesk_pricing::{PriceGroupInput, PriceTableInput};
    use salesdesk_sales::OrderNumber;

    type Service = OrderCompositionService<InMemoryCommercialStore>;

    fn line(product_id: ProductId, quantity: &str, unit_price: Option<&str>) -> OrderLineRequest {
        OrderLineRequest {
            product_id,
            quantity: dec(quantity),
            unit_price: unit_price.map(dec),
            discount: None,
        }
    }

    fn request(client_id: ClientId, lines: Vec<OrderLineRequest>) -> ComposeOrderRequest {
        ComposeOrderRequest {
            client_id,
            salesperson_id: None,
            status: None,
            valid_until: None,
            payment_condition_id: None,
            notes: None,
            price_table_id: None,
            lines,
        }
    }

    #[tokio::test]
    async fn fourth_order_scenario() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let client = fx.client("ACME", None);
        let a = fx.product("A", "10.00");
        let b = fx.product("B", "3.50");

        for _ in 0..3 {
            service
                .compose_order(
                    fx.tenant_id,
                    request(client.id, vec![line(a.id, "1", Some("1.00"))]),
                )
                .await
                .unwrap();
        }

        let mut discounted = line(b.id, "1", Some("3.50"));
        discounted.discount = Some(dec("0.50"));
        let details = service
            .compose_order(
                fx.tenant_id,
                request(
                    client.id,
                    vec![line(a.id, "5", Some("10.00")), discounted],
                ),
            )
            .await
            .unwrap();

        let order = &details.order;
        assert_eq!(order.number, OrderNumber(4));
        assert_eq!(order.totals.subtotal, dec("53.50"));
        assert_eq!(order.totals.total_discount, dec("0.50"));
        assert_eq!(order.totals.total, dec("53.00"));
        assert_eq!(order.status, OrderStatus::Quotation);
        assert_eq!(details.client.as_ref().map(|c| c.id), Some(client.id));
        assert_eq!(details.products.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_compositions_get_consecutive_numbers() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let client = fx.client("ACME", None);
        let product = fx.product("A", "10.00");

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let service = service.clone();
                let tenant_id = fx.tenant_id;
                let req = request(client.id, vec![line(product.id, "1", None)]);
                tokio::spawn(async move { service.compose_order(tenant_id, req).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap().order.number.value());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=32).collect::<Vec<u64>>());
        assert_eq!(service.list_orders(fx.tenant_id).await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn empty_header_patch_leaves_order_untouched() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let client = fx.client("ACME", None);
        let product = fx.product("A", "10.00");
        let composed = service
            .compose_order(fx.tenant_id, request(client.id, vec![line(product.id, "1", None)]))
            .await
            .unwrap()
            .order;

        let unchanged = service
            .update_order_header(fx.tenant_id, composed.id, OrderHeaderPatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, composed);

        let err = service
            .update_order_header(fx.tenant_id, OrderId::new(), OrderHeaderPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn numbers_increase_and_list_is_most_recent_first() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let client = fx.client("ACME", None);
        let a = fx.product("A", "10.00");

        let mut numbers = Vec::new();
        for _ in 0..3 {
            let details = service
                .compose_order(fx.tenant_id, request(client.id, vec![line(a.id, "1", None)]))
                .await
                .unwrap();
            numbers.push(details.order.number.value());
        }
        assert_eq!(numbers, vec![1, 2, 3]);

        let listed: Vec<u64> = service
            .list_orders(fx.tenant_id)
            .await
            .unwrap()
            .iter()
            .map(|o| o.number.value())
            .collect();
        assert_eq!(listed, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn bad_quantity_fails_before_any_write() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let a = fx.product("A", "10.00");

        // Unknown client too: validation must win.
        let err = service
            .compose_order(
                fx.tenant_id,
                request(ClientId::new(), vec![line(a.id, "0", Some("1.00"))]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(service.list_orders(fx.tenant_id).await.unwrap().is_empty());

        let err = service
            .compose_order(fx.tenant_id, request(ClientId::new(), vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_references_are_not_found() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let client = fx.client("ACME", None);
        let a = fx.product("A", "10.00");

        let err = service
            .compose_order(fx.tenant_id, request(ClientId::new(), vec![line(a.id, "1", None)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.starts_with("client")));

        let err = service
            .compose_order(
                fx.tenant_id,
                request(client.id, vec![line(ProductId::new(), "1", None)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.starts_with("product")));

        let mut with_salesperson = request(client.id, vec![line(a.id, "1", None)]);
        with_salesperson.salesperson_id = Some(SalespersonId::new());
        let err = service
            .compose_order(fx.tenant_id, with_salesperson)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(msg) if msg.starts_with("salesperson")));

        assert!(service.list_orders(fx.tenant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unpriced_lines_use_the_clients_group_table() {
        let fx = Fixture::new();
        let pricing = PriceResolutionService::new(fx.store.clone());
        let service: Service = OrderCompositionService::new(fx.store.clone());

        let group = pricing
            .create_group(
                fx.tenant_id,
                PriceGroupInput {
                    name: "Wholesale".to_string(),
                    active: true,
                },
            )
            .await
            .unwrap();
        let table = pricing
            .create_table(
                fx.tenant_id,
                group.id,
                PriceTableInput {
                    name: "Base".to_string(),
                    active: true,
                    default_discount: Percentage::ZERO,
                    client_activity: None,
                },
            )
            .await
            .unwrap();
        let x = fx.product("X", "12.00");
        let y = fx.product("Y", "5.00");
        pricing
            .resolve_or_create_item_price(fx.tenant_id, table.id, x.id, dec("9.99"))
            .await
            .unwrap();
        let client = fx.client("ACME", Some(group.id));

        let details = service
            .compose_order(
                fx.tenant_id,
                request(client.id, vec![line(x.id, "2", None), line(y.id, "1", None)]),
            )
            .await
            .unwrap();

        let lines = &details.order.lines;
        assert_eq!(lines[0].unit_price, dec("9.99"));
        assert_eq!(lines[1].unit_price, dec("5.00"));
        assert_eq!(details.order.totals.total, dec("24.98"));
    }

    #[tokio::test]
    async fn header_update_ignores_lines_and_checks_salesperson() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let client = fx.client("ACME", None);
        let a = fx.product("A", "10.00");
        let rep = fx.salesperson("Rita");

        let created = service
            .compose_order(fx.tenant_id, request(client.id, vec![line(a.id, "3", None)]))
            .await
            .unwrap()
            .order;

        let patch: OrderHeaderPatch = serde_json::from_value(serde_json::json!({
            "status": "approved",
            "notes": "ship friday",
            "salesperson_id": rep.id,
            "lines": [{ "product_id": a.id, "quantity": "99" }]
        }))
        .unwrap();
        let updated = service
            .update_order_header(fx.tenant_id, created.id, patch)
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Approved);
        assert_eq!(updated.notes.as_deref(), Some("ship friday"));
        assert_eq!(updated.salesperson_id, Some(rep.id));
        assert_eq!(updated.lines, created.lines);
        assert_eq!(updated.totals, created.totals);

        let err = service
            .update_order_header(
                fx.tenant_id,
                created.id,
                OrderHeaderPatch {
                    salesperson_id: Some(SalespersonId::new()),
                    ..OrderHeaderPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = service
            .update_order_header(fx.tenant_id, OrderId::new(), OrderHeaderPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_order_returns_client_and_products() {
        let fx = Fixture::new();
        let service: Service = OrderCompositionService::new(fx.store.clone());
        let client = fx.client("ACME", None);
        let a = fx.product("A", "10.00");

        let created = service
            .compose_order(fx.tenant_id, request(client.id, vec![line(a.id, "1", None)]))
            .await
            .unwrap();
        let fetched = service
            .get_order(fx.tenant_id, created.order.id)
            .await
            .unwrap();
        assert_eq!(fetched, created);

        let err = service
            .get_order(TenantId::new(), created.order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
