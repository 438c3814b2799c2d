use serde::{Deserialize, Serialize};

use salesdesk_core::{Entity, TenantId, TenantScoped, entity_id};
use salesdesk_pricing::PriceGroupId;
use salesdesk_territory::CommercialAreaId;

entity_id!(
    /// Client identifier.
    ClientId
);

entity_id!(
    /// Payment-condition identifier (referenced by id only).
    PaymentConditionId
);

/// Client as seen by the order module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: ClientId,
    pub tenant_id: TenantId,
    pub name: String,
    /// Price group the client buys under, if any.
    pub price_group_id: Option<PriceGroupId>,
    /// Sales territory the client belongs to, if any.
    pub commercial_area_id: Option<CommercialAreaId>,
}

impl Entity for ClientRecord {
    type Id = ClientId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for ClientRecord {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
