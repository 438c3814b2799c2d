//! Pure price-resolution rules.
//!
//! The store decides *what exists*; these functions decide *which price wins*
//! and *what a synchronization has to add*.

use std::collections::HashSet;

use rust_decimal::Decimal;
use salesdesk_core::money;
use salesdesk_products::{ProductId, ProductRecord};

use crate::item::PriceItem;

/// Pick the unit price for an order line.
///
/// An override in the selected table wins; otherwise the fallback (normally
/// the product's list price) is used unchanged.
pub fn resolve_unit_price(override_item: Option<&PriceItem>, fallback: Decimal) -> Decimal {
    match override_item {
        Some(item) => item.unit_price,
        None => fallback,
    }
}

/// A product that has no item yet in the table being synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingItem {
    pub product_id: ProductId,
    pub unit_price: Decimal,
}

/// Work out which items a synchronization must create.
///
/// Every product of the master without an item in `existing` yields one
/// [`MissingItem`] priced at the product's list price. Existing overrides are
/// never part of the plan, so applying the plan twice adds nothing the
/// second time.
pub fn plan_synchronization(existing: &[PriceItem], products: &[ProductRecord]) -> Vec<MissingItem> {
    let present: HashSet<ProductId> = existing.iter().map(|i| i.product_id).collect();

    products
        .iter()
        .filter(|p| !present.contains(&p.id))
        .map(|p| MissingItem {
            product_id: p.id,
            unit_price: money::to_minor_unit(p.list_price),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::PriceTableId;
    use proptest::prelude::*;
    use salesdesk_core::TenantId;

    fn product(tenant_id: TenantId, list_price: Decimal) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(),
            tenant_id,
            name: "Widget".to_string(),
            list_price,
            active: true,
        }
    }

    fn apply_plan(
        tenant_id: TenantId,
        table_id: PriceTableId,
        existing: &mut Vec<PriceItem>,
        plan: &[MissingItem],
    ) {
        for m in plan {
            existing.push(PriceItem::new(tenant_id, table_id, m.product_id, m.unit_price).unwrap());
        }
    }

    #[test]
    fn override_wins_over_fallback() {
        let item = PriceItem::new(
            TenantId::new(),
            PriceTableId::new(),
            ProductId::new(),
            Decimal::new(999, 2),
        )
        .unwrap();
        assert_eq!(
            resolve_unit_price(Some(&item), Decimal::new(1500, 2)),
            Decimal::new(999, 2)
        );
    }

    #[test]
    fn fallback_is_used_unchanged_without_override() {
        let fallback = Decimal::new(1234, 2);
        assert_eq!(resolve_unit_price(None, fallback), fallback);
    }

    #[test]
    fn plan_skips_products_with_overrides() {
        let tenant_id = TenantId::new();
        let table_id = PriceTableId::new();
        let priced = product(tenant_id, Decimal::new(2000, 2));
        let missing = product(tenant_id, Decimal::new(500, 2));
        let existing =
            vec![PriceItem::new(tenant_id, table_id, priced.id, Decimal::new(999, 2)).unwrap()];

        let plan = plan_synchronization(&existing, &[priced, missing.clone()]);
        assert_eq!(
            plan,
            vec![MissingItem {
                product_id: missing.id,
                unit_price: Decimal::new(500, 2),
            }]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: synchronizing twice yields the same item set as once.
        #[test]
        fn synchronization_is_idempotent(
            prices in prop::collection::vec(0i64..1_000_000i64, 0..20),
            pre_priced in 0usize..20,
        ) {
            let tenant_id = TenantId::new();
            let table_id = PriceTableId::new();
            let products: Vec<ProductRecord> = prices
                .iter()
                .map(|p| product(tenant_id, Decimal::new(*p, 2)))
                .collect();

            let mut items: Vec<PriceItem> = products
                .iter()
                .take(pre_priced)
                .map(|p| PriceItem::new(tenant_id, table_id, p.id, Decimal::ONE).unwrap())
                .collect();

            let first = plan_synchronization(&items, &products);
            apply_plan(tenant_id, table_id, &mut items, &first);
            let after_once = items.clone();

            let second = plan_synchronization(&items, &products);
            prop_assert!(second.is_empty());
            apply_plan(tenant_id, table_id, &mut items, &second);
            prop_assert_eq!(items, after_once);
        }
    }
}
