use serde::{Deserialize, Serialize};

use salesdesk_core::{
    DomainResult, Entity, Percentage, TenantId, TenantScoped, entity_id, require_non_blank,
};

use crate::group::PriceGroupId;

entity_id!(
    /// Price table identifier.
    PriceTableId
);

/// A named list of per-product prices belonging to exactly one price group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub id: PriceTableId,
    pub tenant_id: TenantId,
    pub group_id: PriceGroupId,
    pub name: String,
    pub active: bool,
    pub default_discount: Percentage,
    /// Free-text tag describing the kind of client the table targets.
    pub client_activity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTableInput {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub default_discount: Percentage,
    #[serde(default)]
    pub client_activity: Option<String>,
}

fn default_active() -> bool {
    true
}

impl PriceTableInput {
    fn validate(&self) -> DomainResult<()> {
        require_non_blank("price table name", &self.name)
    }

    fn normalized_activity(&self) -> Option<String> {
        self.client_activity
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

impl PriceTable {
    pub fn create(
        tenant_id: TenantId,
        group_id: PriceGroupId,
        input: PriceTableInput,
    ) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id: PriceTableId::new(),
            tenant_id,
            group_id,
            name: input.name.trim().to_string(),
            active: input.active,
            default_discount: input.default_discount,
            client_activity: input.normalized_activity(),
        })
    }

    /// Overwrite the editable fields. The owning group is fixed at creation.
    pub fn apply(&mut self, input: PriceTableInput) -> DomainResult<()> {
        input.validate()?;
        self.client_activity = input.normalized_activity();
        self.name = input.name.trim().to_string();
        self.active = input.active;
        self.default_discount = input.default_discount;
        Ok(())
    }
}

impl Entity for PriceTable {
    type Id = PriceTableId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for PriceTable {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn input(name: &str, activity: Option<&str>) -> PriceTableInput {
        PriceTableInput {
            name: name.to_string(),
            active: true,
            default_discount: Percentage::new(Decimal::new(5, 0)).unwrap(),
            client_activity: activity.map(str::to_string),
        }
    }

    #[test]
    fn blank_activity_becomes_none() {
        let table =
            PriceTable::create(TenantId::new(), PriceGroupId::new(), input("Base", Some("  ")))
                .unwrap();
        assert_eq!(table.client_activity, None);
        assert_eq!(table.default_discount.value(), Decimal::new(5, 0));
    }

    #[test]
    fn apply_does_not_move_table_between_groups() {
        let group_id = PriceGroupId::new();
        let mut table =
            PriceTable::create(TenantId::new(), group_id, input("Base", None)).unwrap();
        table.apply(input("Promo", Some("restaurants"))).unwrap();
        assert_eq!(table.group_id, group_id);
        assert_eq!(table.name, "Promo");
        assert_eq!(table.client_activity.as_deref(), Some("restaurants"));
    }

    #[test]
    fn out_of_range_discount_fails_to_deserialize() {
        let raw = r#"{"name":"Base","default_discount":"150"}"#;
        assert!(serde_json::from_str::<PriceTableInput>(raw).is_err());

        let raw = r#"{"name":"Base"}"#;
        let parsed: PriceTableInput = serde_json::from_str(raw).unwrap();
        assert!(parsed.active);
        assert_eq!(parsed.default_discount, Percentage::ZERO);
    }
}
