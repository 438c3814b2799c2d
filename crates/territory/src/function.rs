use serde::{Deserialize, Serialize};

/// Role a representative plays inside a commercial area.
///
/// Each function can be occupied by at most one person per area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommercialFunction {
    Salesperson,
    Supervisor,
    Manager,
    Agent,
}

impl CommercialFunction {
    pub const ALL: [CommercialFunction; 4] = [
        CommercialFunction::Salesperson,
        CommercialFunction::Supervisor,
        CommercialFunction::Manager,
        CommercialFunction::Agent,
    ];

    /// Every area needs this function filled before it can be saved.
    pub fn is_mandatory(self) -> bool {
        matches!(self, CommercialFunction::Salesperson)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CommercialFunction::Salesperson => "salesperson",
            CommercialFunction::Supervisor => "supervisor",
            CommercialFunction::Manager => "manager",
            CommercialFunction::Agent => "agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

impl core::fmt::Display for CommercialFunction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
