//! Derived facts

use mimizuku_core::{ConceptId, RoleId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `sub ⊑ sup`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubsumptionFact {
    pub sub: ConceptId,
    pub sup: ConceptId,
}

impl SubsumptionFact {
    pub fn new(sub: ConceptId, sup: ConceptId) -> Self {
        Self { sub, sup }
    }
}

impl fmt::Display for SubsumptionFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ⊑ {}", self.sub, self.sup)
    }
}

/// `role(first, second)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleFact {
    pub role: RoleId,
    pub first: ConceptId,
    pub second: ConceptId,
}

impl RoleFact {
    pub fn new(role: RoleId, first: ConceptId, second: ConceptId) -> Self {
        Self { role, first, second }
    }
}

impl fmt::Display for RoleFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.role, self.first, self.second)
    }
}
