//! Fact store used by the sequential driver

use crate::fact::{RoleFact, SubsumptionFact};
use crate::graph::{RoleGraph, SubsumptionGraph};
use crate::nodes::{NodeKey, NodeTable};
use crate::pending::{PendingQueue, Queue};
use crate::StoreError;
use mimizuku_core::{ConceptId, RoleId};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Read access to saturated or in-progress facts, shared by both store flavours
pub trait FactView {
    fn is_subsumed(&self, sub: ConceptId, sup: ConceptId) -> bool;

    /// Materialized subsumers of `concept`
    fn subsumers_of(&self, concept: ConceptId) -> Vec<ConceptId>;

    fn is_unsatisfiable(&self, concept: ConceptId) -> bool;

    fn has_role(&self, fact: &RoleFact) -> bool;

    fn successors(&self, role: RoleId, first: ConceptId) -> Vec<ConceptId>;

    fn predecessors(&self, role: RoleId, second: ConceptId) -> Vec<ConceptId>;

    fn roles_from(&self, first: ConceptId) -> Vec<RoleId>;

    fn roles_into(&self, second: ConceptId) -> Vec<RoleId>;

    /// Node content of `id`; registry concepts resolve to plain nodes
    fn node(&self, id: ConceptId) -> Result<NodeKey, StoreError>;

    /// Id of an already interned node, if any
    fn find_node(&self, key: &NodeKey) -> Option<ConceptId>;
}

/// Store statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub subsumptions: usize,
    pub roles: usize,
    pub nodes: usize,
    pub unsatisfiable: usize,
    pub pending_subsumptions: usize,
    pub pending_roles: usize,
}

/// Owner of S, R, V and the two pending sets
#[derive(Debug, Clone)]
pub struct FactStore {
    subsumptions: SubsumptionGraph,
    roles: RoleGraph,
    nodes: NodeTable,
    pending_subsumptions: PendingQueue<SubsumptionFact>,
    pending_roles: PendingQueue<RoleFact>,
}

impl FactStore {
    /// Create an empty store whose synthetic node ids start at `first_node_id`
    pub fn new(first_node_id: u32) -> Self {
        Self {
            subsumptions: SubsumptionGraph::new(),
            roles: RoleGraph::new(),
            nodes: NodeTable::new(first_node_id),
            pending_subsumptions: PendingQueue::new(),
            pending_roles: PendingQueue::new(),
        }
    }

    /// Queue `(X, X)` and `(X, ⊤)` for every concept
    pub fn seed<I: IntoIterator<Item = ConceptId>>(&mut self, concepts: I) {
        for concept in concepts {
            self.enqueue_subsumption(SubsumptionFact::new(concept, concept));
            self.enqueue_subsumption(SubsumptionFact::new(concept, ConceptId::TOP));
        }
    }

    pub fn try_add_subsumption(&mut self, fact: SubsumptionFact) -> bool {
        self.subsumptions.insert(fact.sub, fact.sup)
    }

    pub fn try_add_role(&mut self, fact: RoleFact) -> bool {
        self.roles.insert(fact)
    }

    pub fn enqueue_subsumption(&mut self, fact: SubsumptionFact) -> bool {
        self.pending_subsumptions.push(fact)
    }

    pub fn enqueue_role(&mut self, fact: RoleFact) -> bool {
        self.pending_roles.push(fact)
    }

    pub fn pop_subsumption(&mut self) -> Option<SubsumptionFact> {
        self.pending_subsumptions.pop()
    }

    pub fn pop_role(&mut self) -> Option<RoleFact> {
        self.pending_roles.pop()
    }

    /// Pop a fact the caller knows to be pending
    pub fn take_subsumption(&mut self) -> Result<SubsumptionFact, StoreError> {
        self.pop_subsumption()
            .ok_or(StoreError::PendingUnderflow(Queue::Subsumption))
    }

    /// Pop a fact the caller knows to be pending
    pub fn take_role(&mut self) -> Result<RoleFact, StoreError> {
        self.pop_role().ok_or(StoreError::PendingUnderflow(Queue::Role))
    }

    pub fn pending(&self, queue: Queue) -> usize {
        match queue {
            Queue::Subsumption => self.pending_subsumptions.len(),
            Queue::Role => self.pending_roles.len(),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_subsumptions.is_empty() || !self.pending_roles.is_empty()
    }

    /// Look up or create the node for `key`; `true` when it was created
    pub fn intern_node(&mut self, key: NodeKey) -> (ConceptId, bool) {
        let (id, created) = self.nodes.intern(key);
        if created {
            trace!(node = %id, "extended node created");
        }
        (id, created)
    }

    pub fn subsumptions(&self) -> &SubsumptionGraph {
        &self.subsumptions
    }

    pub fn roles(&self) -> &RoleGraph {
        &self.roles
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn statistics(&self) -> StoreStatistics {
        StoreStatistics {
            subsumptions: self.subsumptions.len(),
            roles: self.roles.len(),
            nodes: self.nodes.len(),
            unsatisfiable: self.subsumptions.unsatisfiable().count(),
            pending_subsumptions: self.pending_subsumptions.len(),
            pending_roles: self.pending_roles.len(),
        }
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        SubsumptionGraph,
        RoleGraph,
        NodeTable,
        PendingQueue<SubsumptionFact>,
        PendingQueue<RoleFact>,
    ) {
        (
            self.subsumptions,
            self.roles,
            self.nodes,
            self.pending_subsumptions,
            self.pending_roles,
        )
    }

    pub(crate) fn from_parts(
        subsumptions: SubsumptionGraph,
        roles: RoleGraph,
        nodes: NodeTable,
        pending_subsumptions: PendingQueue<SubsumptionFact>,
        pending_roles: PendingQueue<RoleFact>,
    ) -> Self {
        Self { subsumptions, roles, nodes, pending_subsumptions, pending_roles }
    }
}

impl FactView for FactStore {
    fn is_subsumed(&self, sub: ConceptId, sup: ConceptId) -> bool {
        self.subsumptions.contains(sub, sup)
    }

    fn subsumers_of(&self, concept: ConceptId) -> Vec<ConceptId> {
        self.subsumptions.subsumers(concept).collect()
    }

    fn is_unsatisfiable(&self, concept: ConceptId) -> bool {
        self.subsumptions.is_unsatisfiable(concept)
    }

    fn has_role(&self, fact: &RoleFact) -> bool {
        self.roles.contains(fact)
    }

    fn successors(&self, role: RoleId, first: ConceptId) -> Vec<ConceptId> {
        self.roles.successors(role, first).collect()
    }

    fn predecessors(&self, role: RoleId, second: ConceptId) -> Vec<ConceptId> {
        self.roles.predecessors(role, second).collect()
    }

    fn roles_from(&self, first: ConceptId) -> Vec<RoleId> {
        self.roles.roles_from(first).collect()
    }

    fn roles_into(&self, second: ConceptId) -> Vec<RoleId> {
        self.roles.roles_into(second).collect()
    }

    fn node(&self, id: ConceptId) -> Result<NodeKey, StoreError> {
        self.nodes.resolve(id)
    }

    fn find_node(&self, key: &NodeKey) -> Option<ConceptId> {
        self.nodes.find(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Existential;

    const A: ConceptId = ConceptId(2);
    const B: ConceptId = ConceptId(3);
    const R: RoleId = RoleId(2);

    #[test]
    fn test_seed_queues_reflexive_and_top() {
        let mut store = FactStore::new(4);
        store.seed([A, B]);

        assert_eq!(store.pending(Queue::Subsumption), 4);
        assert_eq!(store.pop_subsumption(), Some(SubsumptionFact::new(A, A)));
        assert_eq!(store.pop_subsumption(), Some(SubsumptionFact::new(A, ConceptId::TOP)));
    }

    #[test]
    fn test_try_add_reports_novelty() {
        let mut store = FactStore::new(4);
        assert!(store.try_add_subsumption(SubsumptionFact::new(A, B)));
        assert!(!store.try_add_subsumption(SubsumptionFact::new(A, B)));
        assert!(store.try_add_role(RoleFact::new(R, A, B)));
        assert!(!store.try_add_role(RoleFact::new(R, A, B)));

        assert!(store.is_subsumed(A, B));
        assert!(store.has_role(&RoleFact::new(R, A, B)));
        assert_eq!(store.successors(R, A), vec![B]);
        assert_eq!(store.predecessors(R, B), vec![A]);
    }

    #[test]
    fn test_pop_on_empty_is_soft_and_take_is_loud() {
        let mut store = FactStore::new(4);
        assert_eq!(store.pop_subsumption(), None);
        assert_eq!(store.pop_role(), None);
        assert_eq!(
            store.take_subsumption(),
            Err(StoreError::PendingUnderflow(Queue::Subsumption))
        );
        assert_eq!(store.take_role(), Err(StoreError::PendingUnderflow(Queue::Role)));
    }

    #[test]
    fn test_nodes_are_interned_past_registry_ids() {
        let mut store = FactStore::new(4);
        let key = NodeKey::new(A, [Existential::new(R, B)]);
        let (id, created) = store.intern_node(key.clone());

        assert!(created);
        assert_eq!(id, ConceptId(4));
        assert_eq!(store.intern_node(key.clone()), (id, false));
        assert_eq!(store.node(id).unwrap(), key);
        assert_eq!(store.find_node(&key), Some(id));
        assert!(matches!(store.node(ConceptId(5)), Err(StoreError::UnknownNode(_))));
    }

    #[test]
    fn test_statistics() {
        let mut store = FactStore::new(4);
        store.seed([A]);
        store.try_add_subsumption(SubsumptionFact::new(B, ConceptId::BOTTOM));
        store.enqueue_role(RoleFact::new(R, A, B));
        let stats = store.statistics();

        assert_eq!(stats.subsumptions, 1);
        assert_eq!(stats.unsatisfiable, 1);
        assert_eq!(stats.pending_subsumptions, 2);
        assert_eq!(stats.pending_roles, 1);
        assert!(store.has_pending());
    }
}
