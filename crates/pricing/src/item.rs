use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_core::{DomainResult, Entity, TenantId, TenantScoped, entity_id, money};
use salesdesk_products::ProductId;

use crate::table::PriceTableId;

entity_id!(
    /// Price item identifier (surrogate; the natural key is [`PriceItemKey`]).
    PriceItemId
);

/// Natural key of a price item: at most one item per product per table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PriceItemKey {
    pub table_id: PriceTableId,
    pub product_id: ProductId,
}

/// Resolved selling price of one product within one price table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceItem {
    pub id: PriceItemId,
    pub tenant_id: TenantId,
    pub table_id: PriceTableId,
    pub product_id: ProductId,
    pub unit_price: Decimal,
}

impl PriceItem {
    pub fn new(
        tenant_id: TenantId,
        table_id: PriceTableId,
        product_id: ProductId,
        unit_price: Decimal,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: PriceItemId::new(),
            tenant_id,
            table_id,
            product_id,
            unit_price: validate_unit_price(unit_price)?,
        })
    }

    pub fn key(&self) -> PriceItemKey {
        PriceItemKey {
            table_id: self.table_id,
            product_id: self.product_id,
        }
    }
}

/// Unit prices are money: non-negative and held at the minor unit.
pub fn validate_unit_price(unit_price: Decimal) -> DomainResult<Decimal> {
    money::non_negative("unit_price", unit_price)
}

impl Entity for PriceItem {
    type Id = PriceItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for PriceItem {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_price_is_rejected() {
        let err = PriceItem::new(
            TenantId::new(),
            PriceTableId::new(),
            ProductId::new(),
            Decimal::new(-1, 2),
        )
        .unwrap_err();
        assert!(matches!(err, salesdesk_core::DomainError::Validation(_)));
    }

    #[test]
    fn key_is_table_and_product() {
        let table_id = PriceTableId::new();
        let product_id = ProductId::new();
        let item =
            PriceItem::new(TenantId::new(), table_id, product_id, Decimal::new(999, 2)).unwrap();
        assert_eq!(
            item.key(),
            PriceItemKey {
                table_id,
                product_id
            }
        );
        assert_eq!(item.unit_price.to_string(), "9.99");
    }
}
