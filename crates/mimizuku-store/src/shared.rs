//! 並列ワーカー向けの共有ストア
//!
//! S・R・V・Q_S・Q_R はそれぞれ独立したロックで保護され、
//! どの操作も同時に二つ以上のロックを保持しない。

use crate::fact::{RoleFact, SubsumptionFact};
use crate::graph::{RoleGraph, SubsumptionGraph};
use crate::nodes::{NodeKey, NodeTable};
use crate::pending::{PendingQueue, Queue};
use crate::store::{FactStore, FactView};
use crate::StoreError;
use mimizuku_core::{ConceptId, RoleId};
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Fact store shared by worker threads
#[derive(Debug)]
pub struct SharedFactStore {
    subsumptions: RwLock<SubsumptionGraph>,
    roles: RwLock<RoleGraph>,
    nodes: RwLock<NodeTable>,
    pending_subsumptions: Mutex<PendingQueue<SubsumptionFact>>,
    pending_roles: Mutex<PendingQueue<RoleFact>>,
}

fn read<'a, T>(lock: &'a RwLock<T>) -> RwLockReadGuard<'a, T> {
    // A poisoned table is still consistent: every mutation is a single insert
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<'a, T>(lock: &'a RwLock<T>, name: &'static str) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned(name))
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &'static str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Poisoned(name))
}

impl SharedFactStore {
    pub fn new(store: FactStore) -> Self {
        let (subsumptions, roles, nodes, pending_subsumptions, pending_roles) = store.into_parts();
        Self {
            subsumptions: RwLock::new(subsumptions),
            roles: RwLock::new(roles),
            nodes: RwLock::new(nodes),
            pending_subsumptions: Mutex::new(pending_subsumptions),
            pending_roles: Mutex::new(pending_roles),
        }
    }

    /// Unwrap back into a plain store once every worker has joined
    pub fn into_inner(self) -> Result<FactStore, StoreError> {
        let subsumptions = self.subsumptions.into_inner().map_err(|_| StoreError::Poisoned("subsumptions"))?;
        let roles = self.roles.into_inner().map_err(|_| StoreError::Poisoned("roles"))?;
        let nodes = self.nodes.into_inner().map_err(|_| StoreError::Poisoned("nodes"))?;
        let pending_subsumptions = self
            .pending_subsumptions
            .into_inner()
            .map_err(|_| StoreError::Poisoned("pending subsumptions"))?;
        let pending_roles = self
            .pending_roles
            .into_inner()
            .map_err(|_| StoreError::Poisoned("pending roles"))?;

        Ok(FactStore::from_parts(subsumptions, roles, nodes, pending_subsumptions, pending_roles))
    }

    /// Atomic insert-if-absent on S
    pub fn try_add_subsumption(&self, fact: SubsumptionFact) -> Result<bool, StoreError> {
        Ok(write(&self.subsumptions, "subsumptions")?.insert(fact.sub, fact.sup))
    }

    /// Atomic insert-if-absent on R
    pub fn try_add_role(&self, fact: RoleFact) -> Result<bool, StoreError> {
        Ok(write(&self.roles, "roles")?.insert(fact))
    }

    pub fn enqueue_subsumption(&self, fact: SubsumptionFact) -> Result<bool, StoreError> {
        Ok(lock(&self.pending_subsumptions, "pending subsumptions")?.push(fact))
    }

    pub fn enqueue_role(&self, fact: RoleFact) -> Result<bool, StoreError> {
        Ok(lock(&self.pending_roles, "pending roles")?.push(fact))
    }

    /// Remove one pending fact; a popped fact is handed to exactly one caller
    pub fn pop_subsumption(&self) -> Result<Option<SubsumptionFact>, StoreError> {
        Ok(lock(&self.pending_subsumptions, "pending subsumptions")?.pop())
    }

    pub fn pop_role(&self) -> Result<Option<RoleFact>, StoreError> {
        Ok(lock(&self.pending_roles, "pending roles")?.pop())
    }

    pub fn pending(&self, queue: Queue) -> Result<usize, StoreError> {
        match queue {
            Queue::Subsumption => Ok(lock(&self.pending_subsumptions, "pending subsumptions")?.len()),
            Queue::Role => Ok(lock(&self.pending_roles, "pending roles")?.len()),
        }
    }

    pub fn has_pending(&self) -> Result<bool, StoreError> {
        Ok(self.pending(Queue::Subsumption)? > 0 || self.pending(Queue::Role)? > 0)
    }

    /// Atomic check-and-create on V
    pub fn intern_node(&self, key: NodeKey) -> Result<(ConceptId, bool), StoreError> {
        let (id, created) = write(&self.nodes, "nodes")?.intern(key);
        if created {
            trace!(node = %id, "extended node created");
        }
        Ok((id, created))
    }
}

impl FactView for SharedFactStore {
    fn is_subsumed(&self, sub: ConceptId, sup: ConceptId) -> bool {
        read(&self.subsumptions).contains(sub, sup)
    }

    fn subsumers_of(&self, concept: ConceptId) -> Vec<ConceptId> {
        read(&self.subsumptions).subsumers(concept).collect()
    }

    fn is_unsatisfiable(&self, concept: ConceptId) -> bool {
        read(&self.subsumptions).is_unsatisfiable(concept)
    }

    fn has_role(&self, fact: &RoleFact) -> bool {
        read(&self.roles).contains(fact)
    }

    fn successors(&self, role: RoleId, first: ConceptId) -> Vec<ConceptId> {
        read(&self.roles).successors(role, first).collect()
    }

    fn predecessors(&self, role: RoleId, second: ConceptId) -> Vec<ConceptId> {
        read(&self.roles).predecessors(role, second).collect()
    }

    fn roles_from(&self, first: ConceptId) -> Vec<RoleId> {
        read(&self.roles).roles_from(first).collect()
    }

    fn roles_into(&self, second: ConceptId) -> Vec<RoleId> {
        read(&self.roles).roles_into(second).collect()
    }

    fn node(&self, id: ConceptId) -> Result<NodeKey, StoreError> {
        read(&self.nodes).resolve(id)
    }

    fn find_node(&self, key: &NodeKey) -> Option<ConceptId> {
        read(&self.nodes).find(key)
    }
}
