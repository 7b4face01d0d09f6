//! 包摂グラフとロールグラフ

use crate::fact::{RoleFact, SubsumptionFact};
use mimizuku_core::{ConceptId, RoleId};
use std::collections::{HashMap, HashSet};

/// Derived subsumption relation S.
///
/// Once `x ⊑ ⊥` is recorded, `x` is unsatisfiable and every `x ⊑ y` holds
/// without being materialized; later insertions for `x` are absorbed.
#[derive(Debug, Clone, Default)]
pub struct SubsumptionGraph {
    subsumers: HashMap<ConceptId, HashSet<ConceptId>>,
    unsatisfiable: HashSet<ConceptId>,
    len: usize,
}

impl SubsumptionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `sub ⊑ sup`, returning whether the fact is new
    pub fn insert(&mut self, sub: ConceptId, sup: ConceptId) -> bool {
        if self.unsatisfiable.contains(&sub) {
            return false;
        }
        if sup.is_bottom() {
            self.unsatisfiable.insert(sub);
        }

        let inserted = self.subsumers.entry(sub).or_default().insert(sup);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn contains(&self, sub: ConceptId, sup: ConceptId) -> bool {
        self.unsatisfiable.contains(&sub)
            || self.subsumers.get(&sub).map_or(false, |set| set.contains(&sup))
    }

    pub fn is_unsatisfiable(&self, concept: ConceptId) -> bool {
        self.unsatisfiable.contains(&concept)
    }

    /// Materialized subsumers of `concept` (⊥ stands for "everything")
    pub fn subsumers(&self, concept: ConceptId) -> impl Iterator<Item = ConceptId> + '_ {
        self.subsumers.get(&concept).into_iter().flatten().copied()
    }

    /// Concepts with at least one recorded subsumer
    pub fn concepts(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.subsumers.keys().copied()
    }

    pub fn unsatisfiable(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.unsatisfiable.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = SubsumptionFact> + '_ {
        self.subsumers
            .iter()
            .flat_map(|(sub, sups)| sups.iter().map(move |sup| SubsumptionFact::new(*sub, *sup)))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

type Adjacency = HashMap<ConceptId, HashSet<ConceptId>>;

/// Derived role relation family R, indexed in both directions
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    by_first: HashMap<RoleId, Adjacency>,
    by_second: HashMap<RoleId, Adjacency>,
    outgoing: HashMap<ConceptId, HashSet<RoleId>>,
    incoming: HashMap<ConceptId, HashSet<RoleId>>,
    len: usize,
}

impl RoleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fact: RoleFact) -> bool {
        let RoleFact { role, first, second } = fact;
        let inserted = self
            .by_first
            .entry(role)
            .or_default()
            .entry(first)
            .or_default()
            .insert(second);
        if !inserted {
            return false;
        }

        self.by_second.entry(role).or_default().entry(second).or_default().insert(first);
        self.outgoing.entry(first).or_default().insert(role);
        self.incoming.entry(second).or_default().insert(role);
        self.len += 1;
        true
    }

    pub fn contains(&self, fact: &RoleFact) -> bool {
        self.by_first
            .get(&fact.role)
            .and_then(|adjacency| adjacency.get(&fact.first))
            .map_or(false, |seconds| seconds.contains(&fact.second))
    }

    /// `y` with `role(first, y)`
    pub fn successors(&self, role: RoleId, first: ConceptId) -> impl Iterator<Item = ConceptId> + '_ {
        self.by_first
            .get(&role)
            .and_then(|adjacency| adjacency.get(&first))
            .into_iter()
            .flatten()
            .copied()
    }

    /// `x` with `role(x, second)`
    pub fn predecessors(&self, role: RoleId, second: ConceptId) -> impl Iterator<Item = ConceptId> + '_ {
        self.by_second
            .get(&role)
            .and_then(|adjacency| adjacency.get(&second))
            .into_iter()
            .flatten()
            .copied()
    }

    /// Roles with at least one fact leaving `first`
    pub fn roles_from(&self, first: ConceptId) -> impl Iterator<Item = RoleId> + '_ {
        self.outgoing.get(&first).into_iter().flatten().copied()
    }

    /// Roles with at least one fact entering `second`
    pub fn roles_into(&self, second: ConceptId) -> impl Iterator<Item = RoleId> + '_ {
        self.incoming.get(&second).into_iter().flatten().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = RoleFact> + '_ {
        self.by_first.iter().flat_map(|(role, adjacency)| {
            adjacency.iter().flat_map(move |(first, seconds)| {
                seconds.iter().map(move |second| RoleFact::new(*role, *first, *second))
            })
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
