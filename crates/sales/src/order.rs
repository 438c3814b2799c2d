use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use salesdesk_core::{Entity, Quantity, TenantId, TenantScoped, entity_id};
use salesdesk_parties::{ClientId, PaymentConditionId};
use salesdesk_products::ProductId;
use salesdesk_territory::SalespersonId;

entity_id!(
    /// Sales order identifier (tenant-scoped via `tenant_id`).
    OrderId
);

/// Human-facing, per-tenant sequential order number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(pub u64);

impl OrderNumber {
    pub const FIRST: OrderNumber = OrderNumber(1);

    pub fn value(self) -> u64 {
        self.0
    }

    /// The number after this one; `None` once the counter is exhausted.
    pub fn next(self) -> Option<OrderNumber> {
        self.0.checked_add(1).map(OrderNumber)
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Quotation: priced and numbered, not yet committed by the client.
    #[default]
    Quotation,
    Pending,
    Approved,
    Invoiced,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Quotation => "quotation",
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Invoiced => "invoiced",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quotation" => Some(OrderStatus::Quotation),
            "pending" => Some(OrderStatus::Pending),
            "approved" => Some(OrderStatus::Approved),
            "invoiced" => Some(OrderStatus::Invoiced),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Order line: product, quantity, unit price, discount and the derived total.
///
/// Lines are write-once: they are fixed when the order is composed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Decimal,
    /// Absolute discount amount for the whole line (not a percentage).
    pub discount: Decimal,
    pub line_total: Decimal,
}

impl OrderLine {
    /// `quantity * unit_price`, before discount; `None` if out of range.
    pub fn gross(&self) -> Option<Decimal> {
        self.quantity
            .value()
            .checked_mul(self.unit_price)
            .map(salesdesk_core::money::to_minor_unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub total_discount: Decimal,
    pub total: Decimal,
}

/// Aggregate root: a persisted sales order (or quotation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub tenant_id: TenantId,
    pub number: OrderNumber,
    pub client_id: ClientId,
    pub salesperson_id: Option<SalespersonId>,
    pub status: OrderStatus,
    pub valid_until: Option<NaiveDate>,
    pub payment_condition_id: Option<PaymentConditionId>,
    pub notes: Option<String>,
    pub totals: OrderTotals,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.lines.iter().map(|l| l.product_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for Order {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
