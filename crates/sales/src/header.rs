use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use salesdesk_parties::PaymentConditionId;
use salesdesk_territory::SalespersonId;

use crate::order::{Order, OrderStatus};

/// Partial update of header-level fields.
///
/// Absent fields are left untouched. Lines and totals are not reachable from
/// here: once composed, an order's lines are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderHeaderPatch {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_condition_id: Option<PaymentConditionId>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub salesperson_id: Option<SalespersonId>,
}

impl OrderHeaderPatch {
    pub fn is_empty(&self) -> bool {
        self == &OrderHeaderPatch::default()
    }

    /// Apply the patch; returns whether anything changed.
    pub fn apply_to(&self, order: &mut Order, now: DateTime<Utc>) -> bool {
        let before = (
            order.status,
            order.notes.clone(),
            order.payment_condition_id,
            order.valid_until,
            order.salesperson_id,
        );

        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(notes) = &self.notes {
            let trimmed = notes.trim();
            order.notes = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(pc) = self.payment_condition_id {
            order.payment_condition_id = Some(pc);
        }
        if let Some(valid_until) = self.valid_until {
            order.valid_until = Some(valid_until);
        }
        if let Some(sp) = self.salesperson_id {
            order.salesperson_id = Some(sp);
        }

        let after = (
            order.status,
            order.notes.clone(),
            order.payment_condition_id,
            order.valid_until,
            order.salesperson_id,
        );
        let changed = before != after;
        if changed {
            order.updated_at = now;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{OrderHeader, RequestedLine, compose};
    use crate::order::OrderNumber;
    use rust_decimal::Decimal;
    use salesdesk_core::TenantId;
    use salesdesk_parties::ClientId;
    use salesdesk_products::ProductId;

    fn test_order() -> Order {
        let header = OrderHeader {
            client_id: Some(ClientId::new()),
            notes: Some("first".to_string()),
            ..OrderHeader::default()
        };
        let lines = vec![RequestedLine {
            product_id: ProductId::new(),
            quantity: Decimal::new(2, 0),
            unit_price: Decimal::new(1000, 2),
            discount: None,
        }];
        compose(TenantId::new(), header, &lines, Utc::now())
            .unwrap()
            .into_order(OrderNumber::FIRST)
    }

    #[test]
    fn patch_touches_only_given_fields() {
        let mut order = test_order();
        let lines_before = order.lines.clone();
        let totals_before = order.totals;

        let patch = OrderHeaderPatch {
            status: Some(OrderStatus::Approved),
            ..OrderHeaderPatch::default()
        };
        assert!(patch.apply_to(&mut order, Utc::now()));

        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(order.notes.as_deref(), Some("first"));
        assert_eq!(order.lines, lines_before);
        assert_eq!(order.totals, totals_before);
    }

    #[test]
    fn blank_notes_clear_the_field() {
        let mut order = test_order();
        let patch = OrderHeaderPatch {
            notes: Some("  ".to_string()),
            ..OrderHeaderPatch::default()
        };
        patch.apply_to(&mut order, Utc::now());
        assert_eq!(order.notes, None);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut order = test_order();
        let updated_at = order.updated_at;
        let patch = OrderHeaderPatch::default();
        assert!(patch.is_empty());
        assert!(!patch.apply_to(&mut order, Utc::now()));
        assert_eq!(order.updated_at, updated_at);
    }

    #[test]
    fn submitted_lines_are_ignored_on_deserialize() {
        let raw = r#"{"status":"cancelled","lines":[{"product_id":"x"}]}"#;
        let patch: OrderHeaderPatch = serde_json::from_str(raw).unwrap();
        assert_eq!(patch.status, Some(OrderStatus::Cancelled));
    }
}
