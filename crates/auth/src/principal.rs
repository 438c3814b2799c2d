use serde::{Deserialize, Serialize};

use salesdesk_core::{TenantId, entity_id};

entity_id!(
    /// Identity of an authenticated principal (back-office user, service account).
    PrincipalId
);

/// A principal's membership in a tenant: which tenant it acts within and what
/// it is granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<crate::Role>,
    pub permissions: Vec<crate::Permission>,
}
