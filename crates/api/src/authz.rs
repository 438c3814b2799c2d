//! API-side authorization guard for writes.
//!
//! Checked at the handler boundary before a service call, keeping the
//! services and domain crates auth-agnostic.

use salesdesk_auth::{
    AuthzError, CommandAuthorization, Principal, TenantMembership, authorize,
    permissions_for_roles,
};

use crate::context::{PrincipalContext, TenantContext};

/// Check authorization for a write in the current request context.
pub fn authorize_command<C: CommandAuthorization>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let membership = TenantMembership {
        tenant_id: tenant.tenant_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_for_roles(principal.roles()),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_tenant_id: tenant.tenant_id(),
        membership,
    };

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::routes::common::CmdAuth;
    use salesdesk_auth::{Permission, PrincipalId, Role};
    use salesdesk_core::TenantId;

    fn contexts(roles: Vec<Role>) -> (TenantContext, PrincipalContext) {
        (
            TenantContext::new(TenantId::new()),
            PrincipalContext::new(PrincipalId::new(), roles),
        )
    }

    #[test]
    fn role_grants_only_its_permissions() {
        let (tenant, principal) = contexts(vec![Role::SALES_REP]);
        let create = CmdAuth {
            inner: (),
            required: vec![Permission::SALES_ORDERS_CREATE],
        };
        let catalog = CmdAuth {
            inner: (),
            required: vec![Permission::PRICING_CATALOG_WRITE],
        };
        assert!(authorize_command(&tenant, &principal, &create).is_ok());
        assert!(matches!(
            authorize_command(&tenant, &principal, &catalog),
            Err(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_is_allowed_everything() {
        let (tenant, principal) = contexts(vec![Role::ADMIN]);
        let cmd = CmdAuth {
            inner: (),
            required: vec![
                Permission::TERRITORY_AREAS_WRITE,
                Permission::SALES_ORDERS_UPDATE,
            ],
        };
        assert!(authorize_command(&tenant, &principal, &cmd).is_ok());
    }
}
