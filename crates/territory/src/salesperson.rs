use serde::{Deserialize, Serialize};

use salesdesk_core::{Entity, TenantId, TenantScoped, entity_id};

entity_id!(
    /// Salesperson identifier (personnel registry).
    SalespersonId
);

/// Salesperson as seen by the territory and order modules (read-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalespersonRecord {
    pub id: SalespersonId,
    pub tenant_id: TenantId,
    pub name: String,
}

impl Entity for SalespersonRecord {
    type Id = SalespersonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for SalespersonRecord {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
