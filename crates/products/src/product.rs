use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_core::{Entity, TenantId, TenantScoped, entity_id};

entity_id!(
    /// Product identifier (tenant-scoped via the record's `tenant_id`).
    ProductId
);

/// Product as seen by the pricing and order modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub tenant_id: TenantId,
    pub name: String,
    /// Default sale price (list price) used when no price-table override exists.
    pub list_price: Decimal,
    pub active: bool,
}

impl ProductRecord {
    /// Check if product can be sold.
    pub fn can_be_sold(&self) -> bool {
        self.active
    }
}

impl Entity for ProductRecord {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for ProductRecord {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
