//! Order composition: requested lines in, priced lines and totals out.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_core::{DomainError, DomainResult, Quantity, TenantId, money};
use salesdesk_parties::{ClientId, PaymentConditionId};
use salesdesk_products::ProductId;
use salesdesk_territory::SalespersonId;

use crate::order::{Order, OrderId, OrderLine, OrderNumber, OrderStatus, OrderTotals};

/// One requested line with its unit price already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount: Option<Decimal>,
}

/// Header fields chosen by the caller at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderHeader {
    pub client_id: Option<ClientId>,
    pub salesperson_id: Option<SalespersonId>,
    pub status: OrderStatus,
    pub valid_until: Option<NaiveDate>,
    pub payment_condition_id: Option<PaymentConditionId>,
    pub notes: Option<String>,
}

/// A fully priced order that has not been numbered or persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub salesperson_id: Option<SalespersonId>,
    pub status: OrderStatus,
    pub valid_until: Option<NaiveDate>,
    pub payment_condition_id: Option<PaymentConditionId>,
    pub notes: Option<String>,
    pub totals: OrderTotals,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Attach the number handed out by the store.
    pub fn into_order(self, number: OrderNumber) -> Order {
        Order {
            id: self.id,
            tenant_id: self.tenant_id,
            number,
            client_id: self.client_id,
            salesperson_id: self.salesperson_id,
            status: self.status,
            valid_until: self.valid_until,
            payment_condition_id: self.payment_condition_id,
            notes: self.notes,
            totals: self.totals,
            lines: self.lines,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Price a single line: `line_total = quantity * unit_price - discount`.
///
/// A missing discount counts as zero.
pub fn price_line(line_no: u32, requested: &RequestedLine) -> DomainResult<OrderLine> {
    let quantity = Quantity::new(requested.quantity).map_err(|_| {
        DomainError::validation(format!("line {line_no}: quantity must be greater than zero"))
    })?;
    let unit_price = money::non_negative("unit_price", requested.unit_price)
        .map_err(|e| DomainError::validation(format!("line {line_no}: {}", validation_msg(e))))?;
    let discount = money::non_negative("discount", requested.discount.unwrap_or(Decimal::ZERO))
        .map_err(|e| DomainError::validation(format!("line {line_no}: {}", validation_msg(e))))?;

    let out_of_range = || DomainError::validation(format!("line {line_no}: amount out of range"));
    let gross = quantity
        .value()
        .checked_mul(unit_price)
        .map(money::to_minor_unit)
        .ok_or_else(out_of_range)?;
    let line_total = gross.checked_sub(discount).ok_or_else(out_of_range)?;

    Ok(OrderLine {
        line_no,
        product_id: requested.product_id,
        quantity,
        unit_price,
        discount,
        line_total,
    })
}

fn validation_msg(e: DomainError) -> String {
    match e {
        DomainError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

/// Aggregate totals.
///
/// Subtotal and discount are accumulated independently of the line totals and
/// `total` is derived from them, which equals the sum of line totals.
///
/// Sums that leave the decimal range fail with `Validation`.
pub fn compute_totals(lines: &[OrderLine]) -> DomainResult<OrderTotals> {
    let mut subtotal = Decimal::ZERO;
    let mut total_discount = Decimal::ZERO;
    for line in lines {
        let out_of_range = || {
            DomainError::validation(format!("line {}: amount out of range", line.line_no))
        };
        subtotal = line
            .gross()
            .and_then(|gross| subtotal.checked_add(gross))
            .ok_or_else(out_of_range)?;
        total_discount = total_discount
            .checked_add(line.discount)
            .ok_or_else(out_of_range)?;
    }
    let total = subtotal
        .checked_sub(total_discount)
        .ok_or_else(|| DomainError::validation("order total out of range"))?;

    Ok(OrderTotals {
        subtotal: money::to_minor_unit(subtotal),
        total_discount: money::to_minor_unit(total_discount),
        total: money::to_minor_unit(total),
    })
}

/// Compose an order from a header and its requested lines.
///
/// Fails with `Validation` before anything is built if the client is missing,
/// there are no lines, or any line is malformed.
pub fn compose(
    tenant_id: TenantId,
    header: OrderHeader,
    requested: &[RequestedLine],
    now: DateTime<Utc>,
) -> DomainResult<NewOrder> {
    let client_id = header
        .client_id
        .ok_or_else(|| DomainError::validation("client_id is required"))?;

    if requested.is_empty() {
        return Err(DomainError::validation("order must have at least one line"));
    }

    let lines = requested
        .iter()
        .enumerate()
        .map(|(idx, r)| price_line((idx as u32) + 1, r))
        .collect::<DomainResult<Vec<_>>>()?;

    let totals = compute_totals(&lines)?;

    Ok(NewOrder {
        id: OrderId::new(),
        tenant_id,
        client_id,
        salesperson_id: header.salesperson_id,
        status: header.status,
        valid_until: header.valid_until,
        payment_condition_id: header.payment_condition_id,
        notes: header.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        totals,
        lines,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use proptest::prelude::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(quantity: &str, unit_price: &str, discount: Option<&str>) -> RequestedLine {
        RequestedLine {
            product_id: ProductId::new(),
            quantity: d(quantity),
            unit_price: d(unit_price),
            discount: discount.map(d),
        }
    }

    fn header() -> OrderHeader {
        OrderHeader {
            client_id: Some(ClientId::new()),
            ..OrderHeader::default()
        }
    }

    #[test]
    fn two_line_scenario_totals() {
        let lines = vec![line("5", "10.00", Some("0")), line("1", "3.50", Some("0.50"))];
        let order = compose(TenantId::new(), header(), &lines, Utc::now()).unwrap();

        assert_eq!(order.totals.subtotal, d("53.50"));
        assert_eq!(order.totals.total_discount, d("0.50"));
        assert_eq!(order.totals.total, d("53.00"));
        assert_eq!(order.lines[0].line_total, d("50.00"));
        assert_eq!(order.lines[1].line_total, d("3.00"));
        assert_eq!(order.lines[1].line_no, 2);
        assert_eq!(order.status, OrderStatus::Quotation);
    }

    #[test]
    fn oversized_line_amount_is_rejected() {
        let huge = Decimal::new(100_000_000_000_000_000, 0);
        let requested = RequestedLine {
            product_id: ProductId::new(),
            quantity: huge,
            unit_price: huge,
            discount: None,
        };
        let err = compose(TenantId::new(), header(), &[requested], Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("line 1: amount out of range")
        );
    }

    #[test]
    fn subtotal_overflow_is_rejected() {
        // Each line fits; their sum does not.
        let near_max = Decimal::from_i128_with_scale(40_000_000_000_000_000_000_000_000_000, 0);
        let requested: Vec<RequestedLine> = (0..2)
            .map(|_| RequestedLine {
                product_id: ProductId::new(),
                quantity: Decimal::ONE,
                unit_price: near_max,
                discount: None,
            })
            .collect();
        let err = compose(TenantId::new(), header(), &requested, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("line 2: amount out of range")
        );
    }

    #[test]
    fn missing_discount_defaults_to_zero() {
        let priced = price_line(1, &line("2", "7.25", None)).unwrap();
        assert_eq!(priced.discount, Decimal::ZERO);
        assert_eq!(priced.line_total, d("14.50"));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        for qty in ["0", "-1"] {
            let err = compose(TenantId::new(), header(), &[line(qty, "1.00", None)], Utc::now())
                .unwrap_err();
            match err {
                DomainError::Validation(msg) if msg.contains("quantity") => {}
                other => panic!("expected Validation, got {other:?}"),
            }
        }
    }

    #[test]
    fn negative_discount_is_rejected() {
        let err = price_line(1, &line("1", "1.00", Some("-0.01"))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn order_without_lines_is_rejected() {
        let err = compose(TenantId::new(), header(), &[], Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn order_without_client_is_rejected() {
        let err = compose(
            TenantId::new(),
            OrderHeader::default(),
            &[line("1", "1.00", None)],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn fractional_quantities_round_to_minor_unit() {
        let priced = price_line(1, &line("0.333", "10.00", None)).unwrap();
        assert_eq!(priced.line_total, d("3.33"));
    }

    #[test]
    fn into_order_keeps_composed_values() {
        let composed = compose(TenantId::new(), header(), &[line("1", "2.00", None)], Utc::now())
            .unwrap();
        let order = composed.clone().into_order(OrderNumber(4));
        assert_eq!(order.number, OrderNumber(4));
        assert_eq!(order.totals, composed.totals);
        assert_eq!(order.created_at, order.updated_at);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: total = subtotal - total_discount = sum of line totals,
        /// and every line total is quantity * unit_price - discount.
        #[test]
        fn totals_match_line_totals(
            raw in prop::collection::vec((1i64..10_000i64, 0i64..1_000_000i64, 0i64..10_000i64), 1..12)
        ) {
            let requested: Vec<RequestedLine> = raw
                .iter()
                .map(|(q, p, disc)| RequestedLine {
                    product_id: ProductId::new(),
                    quantity: Decimal::new(*q, 2),
                    unit_price: Decimal::new(*p, 2),
                    discount: if *disc == 0 { None } else { Some(Decimal::new(*disc, 2)) },
                })
                .collect();

            let order = compose(TenantId::new(), header(), &requested, Utc::now()).unwrap();

            let mut sum_lines = Decimal::ZERO;
            for (l, r) in order.lines.iter().zip(&requested) {
                let expected = money::to_minor_unit(r.quantity * r.unit_price)
                    - r.discount.unwrap_or(Decimal::ZERO);
                prop_assert_eq!(l.line_total, expected);
                sum_lines += l.line_total;
            }

            prop_assert_eq!(order.totals.total, order.totals.subtotal - order.totals.total_discount);
            prop_assert_eq!(order.totals.total, sum_lines);
        }
    }
}
