use axum::response::Response;

use salesdesk_auth::{CommandAuthorization, Permission};
use salesdesk_infra::ServiceResult;

use crate::app::errors;
use crate::context::{PrincipalContext, TenantContext};

pub type ApiResult = Result<Response, Response>;

/// A request payload paired with the permissions needed to act on it.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// Authorize a write and hand the payload back.
pub fn authorized<C>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    inner: C,
    permission: Permission,
) -> Result<C, Response> {
    let cmd = CmdAuth {
        inner,
        required: vec![permission],
    };
    crate::authz::authorize_command(tenant, principal, &cmd)
        .map_err(errors::authz_error_to_response)?;
    Ok(cmd.inner)
}

pub fn service<T>(result: ServiceResult<T>) -> Result<T, Response> {
    result.map_err(errors::service_error_to_response)
}
