//! Rule traits and interfaces

use mimizuku_core::{ConceptId, OntologyIndex, RoleId};
use mimizuku_store::{FactView, NodeKey, RoleFact, StoreError, SubsumptionFact};
use serde::{Deserialize, Serialize};

/// A fact implied by a rule application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inference {
    Subsumption(SubsumptionFact),
    Role(RoleFact),
    /// `role(source, node)` where `node` is interned by the driver
    Successor {
        role: RoleId,
        source: ConceptId,
        node: NodeKey,
    },
}

impl Inference {
    pub fn subsumption(sub: ConceptId, sup: ConceptId) -> Self {
        Inference::Subsumption(SubsumptionFact::new(sub, sup))
    }

    pub fn role(role: RoleId, first: ConceptId, second: ConceptId) -> Self {
        Inference::Role(RoleFact::new(role, first, second))
    }
}

/// Everything a rule may read: the static index and the current facts
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub index: &'a OntologyIndex,
    pub facts: &'a dyn FactView,
}

impl<'a> RuleContext<'a> {
    pub fn new(index: &'a OntologyIndex, facts: &'a dyn FactView) -> Self {
        Self { index, facts }
    }
}

/// Whether a rule produced anything, reported back to the chain
pub type RuleResult = Result<bool, StoreError>;

/// Rule triggered by a newly confirmed subsumption `sub ⊑ sup`
pub trait SubsumptionRule: Send + Sync {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Get the rule description
    fn description(&self) -> &'static str;

    /// Push implied facts into `out`; never mutates the store
    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult;
}

/// Rule triggered by a newly confirmed role fact
pub trait RoleRule: Send + Sync {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Get the rule description
    fn description(&self) -> &'static str;

    /// Push implied facts into `out`; never mutates the store
    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult;
}
