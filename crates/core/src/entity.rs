//! Entity trait: identity + continuity across state changes.

use crate::id::TenantId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that lives inside exactly one tenant.
///
/// Stores use this to refuse cross-tenant reads and writes.
pub trait TenantScoped: Entity {
    fn tenant_id(&self) -> TenantId;
}
