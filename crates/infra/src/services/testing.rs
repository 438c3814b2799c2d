//! Seeded in-memory fixtures for service tests.

use core::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use salesdesk_core::TenantId;
use salesdesk_parties::{ClientId, ClientRecord};
use salesdesk_pricing::PriceGroupId;
use salesdesk_products::{ProductId, ProductRecord};
use salesdesk_territory::{SalespersonId, SalespersonRecord};

use crate::store::InMemoryCommercialStore;

pub(crate) fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub(crate) struct Fixture {
    pub store: Arc<InMemoryCommercialStore>,
    pub tenant_id: TenantId,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryCommercialStore::new()),
            tenant_id: TenantId::new(),
        }
    }

    pub fn product(&self, name: &str, list_price: &str) -> ProductRecord {
        let product = ProductRecord {
            id: ProductId::new(),
            tenant_id: self.tenant_id,
            name: name.to_string(),
            list_price: dec(list_price),
            active: true,
        };
        self.store.put_product(product.clone()).unwrap();
        product
    }

    pub fn client(&self, name: &str, price_group_id: Option<PriceGroupId>) -> ClientRecord {
        let client = ClientRecord {
            id: ClientId::new(),
            tenant_id: self.tenant_id,
            name: name.to_string(),
            price_group_id,
            commercial_area_id: None,
        };
        self.store.put_client(client.clone()).unwrap();
        client
    }

    pub fn salesperson(&self, name: &str) -> SalespersonRecord {
        let salesperson = SalespersonRecord {
            id: SalespersonId::new(),
            tenant_id: self.tenant_id,
            name: name.to_string(),
        };
        self.store.put_salesperson(salesperson.clone()).unwrap();
        salesperson
    }
}
