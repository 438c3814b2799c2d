use serde::{Deserialize, Serialize};

use salesdesk_core::{
    DomainError, DomainResult, Entity, TenantId, TenantScoped, entity_id, require_non_blank,
};

use crate::function::CommercialFunction;
use crate::salesperson::SalespersonId;

entity_id!(
    /// Commercial area (sales territory) identifier.
    CommercialAreaId
);

entity_id!(
    /// Representative assignment identifier.
    AssignmentId
);

entity_id!(
    /// Commission profile identifier (referenced by id only).
    CommissionProfileId
);

/// Binding of one salesperson to one commercial function and one commission
/// profile inside an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeAssignment {
    pub id: AssignmentId,
    pub salesperson_id: SalespersonId,
    pub function: CommercialFunction,
    pub commission_profile_id: CommissionProfileId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeInput {
    pub salesperson_id: SalespersonId,
    pub function: CommercialFunction,
    pub commission_profile_id: CommissionProfileId,
}

/// Area fields plus the full roster, as submitted by an editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialAreaInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub representatives: Vec<RepresentativeInput>,
}

/// A sales territory and its representative roster.
///
/// An area is edited in memory (`draft` / roster changes) and may lack a
/// salesperson while being edited; only [`CommercialArea::validate_before_save`]
/// demands one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialArea {
    pub id: CommercialAreaId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub representatives: Vec<RepresentativeAssignment>,
}

impl CommercialArea {
    /// Start a new, unsaved area with an empty roster.
    pub fn draft(
        tenant_id: TenantId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let mut area = Self {
            id: CommercialAreaId::new(),
            tenant_id,
            name: String::new(),
            description: None,
            representatives: Vec::new(),
        };
        area.describe(name, description)?;
        Ok(area)
    }

    /// Build a draft from submitted fields, adding representatives one by one
    /// so a duplicated function fails exactly like an interactive add.
    pub fn from_input(tenant_id: TenantId, input: CommercialAreaInput) -> DomainResult<Self> {
        let mut area = Self::draft(tenant_id, input.name, input.description)?;
        area.replace_roster(input.representatives)?;
        Ok(area)
    }

    pub fn describe(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> DomainResult<()> {
        let name = name.into();
        require_non_blank("area name", &name)?;
        self.name = name.trim().to_string();
        self.description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(())
    }

    /// Current holder of `function`, if any.
    pub fn occupant(&self, function: CommercialFunction) -> Option<&RepresentativeAssignment> {
        self.representatives.iter().find(|r| r.function == function)
    }

    /// Append a representative, refusing a function that is already taken.
    pub fn add_representative(&mut self, input: RepresentativeInput) -> DomainResult<AssignmentId> {
        if self.occupant(input.function).is_some() {
            return Err(DomainError::conflict(format!(
                "function '{}' already occupied in this area",
                input.function
            )));
        }

        let id = AssignmentId::new();
        self.representatives.push(RepresentativeAssignment {
            id,
            salesperson_id: input.salesperson_id,
            function: input.function,
            commission_profile_id: input.commission_profile_id,
        });
        Ok(id)
    }

    pub fn remove_representative(
        &mut self,
        assignment_id: AssignmentId,
    ) -> DomainResult<RepresentativeAssignment> {
        let idx = self
            .representatives
            .iter()
            .position(|r| r.id == assignment_id)
            .ok_or_else(|| DomainError::not_found("representative assignment"))?;
        Ok(self.representatives.remove(idx))
    }

    /// Replace the whole roster with `inputs`, in order.
    ///
    /// On error the area keeps its previous roster.
    pub fn replace_roster(&mut self, inputs: Vec<RepresentativeInput>) -> DomainResult<()> {
        let previous = std::mem::take(&mut self.representatives);
        for input in inputs {
            if let Err(e) = self.add_representative(input) {
                self.representatives = previous;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Save-time check over the full roster.
    pub fn validate_before_save(&self) -> DomainResult<()> {
        require_non_blank("area name", &self.name)?;

        for (idx, r) in self.representatives.iter().enumerate() {
            if self.representatives[..idx]
                .iter()
                .any(|other| other.function == r.function)
            {
                return Err(DomainError::conflict(format!(
                    "function '{}' already occupied in this area",
                    r.function
                )));
            }
        }

        if !self.representatives.iter().any(|r| r.function.is_mandatory()) {
            return Err(DomainError::validation(
                "area must have at least one representative with the salesperson function",
            ));
        }
        Ok(())
    }
}

impl Entity for CommercialArea {
    type Id = CommercialAreaId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for CommercialArea {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(function: CommercialFunction) -> RepresentativeInput {
        RepresentativeInput {
            salesperson_id: SalespersonId::new(),
            function,
            commission_profile_id: CommissionProfileId::new(),
        }
    }

    fn test_area() -> CommercialArea {
        CommercialArea::draft(TenantId::new(), "North", Some("Northern routes".to_string())).unwrap()
    }

    #[test]
    fn second_holder_of_a_function_is_a_conflict() {
        let mut area = test_area();
        area.add_representative(rep(CommercialFunction::Supervisor)).unwrap();

        let err = area
            .add_representative(rep(CommercialFunction::Supervisor))
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) if msg.contains("already occupied") => {}
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert_eq!(area.representatives.len(), 1);
    }

    #[test]
    fn distinct_functions_can_coexist() {
        let mut area = test_area();
        area.add_representative(rep(CommercialFunction::Supervisor)).unwrap();
        area.add_representative(rep(CommercialFunction::Salesperson)).unwrap();
        assert_eq!(area.representatives.len(), 2);
    }

    #[test]
    fn save_requires_a_salesperson() {
        let mut area = test_area();
        area.add_representative(rep(CommercialFunction::Manager)).unwrap();
        assert!(matches!(
            area.validate_before_save(),
            Err(DomainError::Validation(_))
        ));

        area.add_representative(rep(CommercialFunction::Salesperson)).unwrap();
        assert!(area.validate_before_save().is_ok());
    }

    #[test]
    fn area_may_lack_salesperson_while_editing() {
        let mut area = test_area();
        let id = area
            .add_representative(rep(CommercialFunction::Salesperson))
            .unwrap();
        area.remove_representative(id).unwrap();
        area.add_representative(rep(CommercialFunction::Salesperson)).unwrap();
        assert!(area.validate_before_save().is_ok());
    }

    #[test]
    fn removing_unknown_assignment_is_not_found() {
        let mut area = test_area();
        let err = area.remove_representative(AssignmentId::new()).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn failed_roster_replacement_keeps_previous_roster() {
        let mut area = test_area();
        area.add_representative(rep(CommercialFunction::Salesperson)).unwrap();
        let before = area.representatives.clone();

        let err = area
            .replace_roster(vec![rep(CommercialFunction::Agent), rep(CommercialFunction::Agent)])
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(area.representatives, before);
    }

    #[test]
    fn validate_catches_duplicates_introduced_directly() {
        let mut area = test_area();
        area.add_representative(rep(CommercialFunction::Salesperson)).unwrap();
        let dup = area.representatives[0].clone();
        area.representatives.push(RepresentativeAssignment {
            id: AssignmentId::new(),
            ..dup
        });
        assert!(matches!(
            area.validate_before_save(),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn from_input_builds_roster_in_order() {
        let input = CommercialAreaInput {
            name: " South ".to_string(),
            description: Some("  ".to_string()),
            representatives: vec![
                rep(CommercialFunction::Salesperson),
                rep(CommercialFunction::Supervisor),
            ],
        };
        let area = CommercialArea::from_input(TenantId::new(), input).unwrap();
        assert_eq!(area.name, "South");
        assert_eq!(area.description, None);
        assert_eq!(area.representatives[0].function, CommercialFunction::Salesperson);
        assert_eq!(area.representatives[1].function, CommercialFunction::Supervisor);
    }
}
