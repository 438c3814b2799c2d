//! Sales orders domain module.
//!
//! Line pricing, order totals and header edits, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). Order numbers are
//! assigned by the store when the composed order is persisted.

pub mod compose;
pub mod header;
pub mod order;

pub use compose::{NewOrder, OrderHeader, RequestedLine, compose, compute_totals, price_line};
pub use header::OrderHeaderPatch;
pub use order::{Order, OrderId, OrderLine, OrderNumber, OrderStatus, OrderTotals};
