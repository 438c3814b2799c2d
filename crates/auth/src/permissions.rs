use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. `"sales.orders.create"`).
///
/// The wildcard `"*"` grants everything within the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const PRICING_CATALOG_WRITE: Permission = Permission(Cow::Borrowed("pricing.catalog.write"));
    pub const SALES_ORDERS_CREATE: Permission = Permission(Cow::Borrowed("sales.orders.create"));
    pub const SALES_ORDERS_UPDATE: Permission = Permission(Cow::Borrowed("sales.orders.update"));
    pub const TERRITORY_AREAS_WRITE: Permission = Permission(Cow::Borrowed("territory.areas.write"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
