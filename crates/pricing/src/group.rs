use serde::{Deserialize, Serialize};

use salesdesk_core::{DomainResult, Entity, TenantId, TenantScoped, entity_id, require_non_blank};

entity_id!(
    /// Price group identifier.
    PriceGroupId
);

/// Top-level container of price tables (e.g. "Retail", "Wholesale").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceGroup {
    pub id: PriceGroupId,
    pub tenant_id: TenantId,
    pub name: String,
    pub active: bool,
}

/// Editable fields of a price group (create and update share the shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceGroupInput {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PriceGroupInput {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("price group name", &self.name)
    }
}

impl PriceGroup {
    pub fn create(tenant_id: TenantId, input: PriceGroupInput) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id: PriceGroupId::new(),
            tenant_id,
            name: input.name.trim().to_string(),
            active: input.active,
        })
    }

    /// Overwrite the editable fields; identity and tenant never change.
    pub fn apply(&mut self, input: PriceGroupInput) -> DomainResult<()> {
        input.validate()?;
        self.name = input.name.trim().to_string();
        self.active = input.active;
        Ok(())
    }
}

impl Entity for PriceGroup {
    type Id = PriceGroupId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for PriceGroup {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}
