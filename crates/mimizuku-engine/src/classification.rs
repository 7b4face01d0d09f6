//! Classification result

use crate::hierarchy::Hierarchy;
use crate::postprocess::IndividualTypes;
use crate::saturation::SaturationStats;
use mimizuku_core::{ConceptId, IndividualId, RoleId};
use mimizuku_rules::ChainStatistics;
use mimizuku_store::StoreStatistics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether queries may be answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStatus {
    Unclassified,
    Classified,
}

/// Counters collected over one classification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStats {
    /// Main fixpoint run
    pub saturation: SaturationStats,
    /// Re-saturation triggered by nominal closure
    pub closure: SaturationStats,
    pub nominal_rounds: usize,
    pub store: StoreStatistics,
    pub chain: ChainStatistics,
    pub workers: usize,
    pub elapsed_ms: u64,
}

/// Concept and role hierarchies plus per-individual results
#[derive(Debug, Clone)]
pub struct Classification {
    pub concepts: Hierarchy<ConceptId>,
    pub roles: Hierarchy<RoleId>,
    pub individuals: BTreeMap<IndividualId, IndividualTypes>,
    /// ⊤ ⊑ ⊥ was derived; every concept is equivalent to ⊥
    pub inconsistent: bool,
    pub stats: ClassificationStats,
}

impl Classification {
    pub fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }

    pub fn individual(&self, individual: IndividualId) -> Option<&IndividualTypes> {
        self.individuals.get(&individual)
    }
}
