//! Price catalog domain module.
//!
//! Two-level hierarchy: price groups own price tables, price tables own
//! per-product price items. Everything here is deterministic domain logic
//! (no IO, no HTTP, no storage); persistence lives in `salesdesk-infra`.

pub mod group;
pub mod item;
pub mod resolution;
pub mod table;

pub use group::{PriceGroup, PriceGroupId, PriceGroupInput};
pub use item::{PriceItem, PriceItemId, PriceItemKey};
pub use resolution::{MissingItem, plan_synchronization, resolve_unit_price};
pub use table::{PriceTable, PriceTableId, PriceTableInput};
