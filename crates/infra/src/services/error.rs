use thiserror::Error;

use salesdesk_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure surfaced to callers of the commercial services.
///
/// Nothing is retried; the first failure is returned as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("store error: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ServiceError::Validation(msg)
            }
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            DomainError::Unauthorized => ServiceError::Unauthorized,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::TenantIsolation(msg) | StoreError::Backend(msg) => {
                ServiceError::Store(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_kind() {
        assert_eq!(
            ServiceError::from(DomainError::validation("quantity must be greater than zero")),
            ServiceError::Validation("quantity must be greater than zero".to_string())
        );
        assert_eq!(
            ServiceError::from(DomainError::conflict("function taken")),
            ServiceError::Conflict("function taken".to_string())
        );
        assert_eq!(
            ServiceError::from(DomainError::not_found("client")),
            ServiceError::NotFound("client".to_string())
        );
    }

    #[test]
    fn backend_failures_become_store_errors() {
        let err = ServiceError::from(StoreError::Backend("connection reset".to_string()));
        assert_eq!(err, ServiceError::Store("connection reset".to_string()));
        assert!(matches!(
            ServiceError::from(StoreError::Conflict("dup".to_string())),
            ServiceError::Conflict(_)
        ));
    }
}
