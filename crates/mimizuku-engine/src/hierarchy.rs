//! 階層構築
//!
//! 飽和済みの包摂関係から直接の親子関係と同値類を求める。
//! 依存順の分類は明示的なスタックで行い、再帰の深さに依存しない。

use crate::error::HierarchyError;
use mimizuku_core::{OntologyIndex, RoleId};
use mimizuku_store::SubsumptionGraph;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Display;

/// Read access to a (transitively closed) subsumption relation
pub trait SubsumptionSource<T> {
    /// Known subsumers of `item`, in no particular order
    fn subsumers(&self, item: T) -> Vec<T>;

    fn is_subsumed(&self, sub: T, sup: T) -> bool;
}

impl SubsumptionSource<mimizuku_core::ConceptId> for SubsumptionGraph {
    fn subsumers(&self, item: mimizuku_core::ConceptId) -> Vec<mimizuku_core::ConceptId> {
        SubsumptionGraph::subsumers(self, item).collect()
    }

    fn is_subsumed(&self, sub: mimizuku_core::ConceptId, sup: mimizuku_core::ConceptId) -> bool {
        self.contains(sub, sup)
    }
}

impl<T: Ord + Copy> SubsumptionSource<T> for BTreeMap<T, BTreeSet<T>> {
    fn subsumers(&self, item: T) -> Vec<T> {
        self.get(&item).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    fn is_subsumed(&self, sub: T, sup: T) -> bool {
        sub == sup || self.get(&sub).map_or(false, |set| set.contains(&sup))
    }
}

/// Role inclusions as closed by the ontology index
pub struct RoleSubsumptions<'a> {
    index: &'a OntologyIndex,
}

impl<'a> RoleSubsumptions<'a> {
    pub fn new(index: &'a OntologyIndex) -> Self {
        Self { index }
    }
}

impl SubsumptionSource<RoleId> for RoleSubsumptions<'_> {
    fn subsumers(&self, item: RoleId) -> Vec<RoleId> {
        let mut subsumers = vec![item, RoleId::TOP];
        subsumers.extend_from_slice(self.index.super_roles(item));
        subsumers
    }

    fn is_subsumed(&self, sub: RoleId, sup: RoleId) -> bool {
        self.index.is_sub_role(sub, sup)
    }
}

/// Disjoint sets keyed by entity; the sentinels always win, otherwise the smaller id
struct EquivalenceClasses<T> {
    top: T,
    bottom: T,
    parent: BTreeMap<T, T>,
}

impl<T: Ord + Copy> EquivalenceClasses<T> {
    fn new(top: T, bottom: T) -> Self {
        Self { top, bottom, parent: BTreeMap::new() }
    }

    fn find(&mut self, item: T) -> T {
        let mut root = item;
        while let Some(&next) = self.parent.get(&root) {
            if next == root {
                break;
            }
            root = next;
        }
        // path compression
        let mut current = item;
        while current != root {
            let next = self.parent.get(&current).copied().unwrap_or(root);
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    fn union(&mut self, left: T, right: T) {
        let (a, b) = (self.find(left), self.find(right));
        if a == b {
            return;
        }
        let winner = if a == self.bottom || b == self.bottom {
            self.bottom
        } else if a == self.top || b == self.top {
            self.top
        } else {
            a.min(b)
        };
        let loser = if winner == a { b } else { a };
        self.parent.insert(loser, winner);
        self.parent.insert(winner, winner);
    }
}

/// Builds a [`Hierarchy`] over a chosen entity set
#[derive(Debug, Clone, Copy)]
pub struct HierarchyBuilder<T> {
    top: T,
    bottom: T,
}

impl<T: Ord + Copy + Display> HierarchyBuilder<T> {
    pub fn new(top: T, bottom: T) -> Self {
        Self { top, bottom }
    }

    pub fn build<I, S>(&self, entities: I, source: &S) -> Hierarchy<T>
    where
        I: IntoIterator<Item = T>,
        S: SubsumptionSource<T> + ?Sized,
    {
        let mut entities: BTreeSet<T> = entities.into_iter().collect();
        entities.insert(self.top);
        entities.insert(self.bottom);

        if source.is_subsumed(self.top, self.bottom) {
            return Hierarchy::inconsistent(self.top, self.bottom, entities);
        }

        let mut classes = EquivalenceClasses::new(self.top, self.bottom);
        let mut settled: BTreeSet<T> = BTreeSet::new();
        for &entity in &entities {
            if entity == self.top || entity == self.bottom {
                settled.insert(entity);
            } else if source.is_subsumed(entity, self.bottom) {
                classes.union(entity, self.bottom);
                settled.insert(entity);
            } else if source.is_subsumed(self.top, entity) {
                classes.union(entity, self.top);
                settled.insert(entity);
            }
        }

        // Explicit-stack classification: every strict subsumer is classified
        // before the concept whose candidate set it belongs to.
        let mut candidates: BTreeMap<T, Vec<T>> = BTreeMap::new();
        let mut classified: BTreeSet<T> = BTreeSet::new();
        let mut visiting: BTreeSet<T> = BTreeSet::new();
        for &start in &entities {
            if settled.contains(&start) || classified.contains(&start) {
                continue;
            }
            let mut stack = vec![(start, false)];
            while let Some((current, expanded)) = stack.pop() {
                if classified.contains(&current) {
                    continue;
                }
                if expanded {
                    visiting.remove(&current);
                    classified.insert(current);
                    continue;
                }
                visiting.insert(current);
                stack.push((current, true));

                let mut strict = Vec::new();
                for other in source.subsumers(current) {
                    if other == current || !entities.contains(&other) || settled.contains(&other) {
                        continue;
                    }
                    if source.is_subsumed(other, current) {
                        classes.union(current, other);
                    } else {
                        strict.push(other);
                        if !classified.contains(&other) && !visiting.contains(&other) {
                            stack.push((other, false));
                        }
                    }
                }
                candidates.insert(current, strict);
            }
        }

        let mut hierarchy = Hierarchy::empty(self.top, self.bottom, false);
        for &entity in &entities {
            let representative = classes.find(entity);
            hierarchy.representatives.insert(entity, representative);
            hierarchy.classes.entry(representative).or_default().insert(entity);
        }
        for representative in hierarchy.classes.keys() {
            hierarchy.parents.entry(*representative).or_default();
            hierarchy.children.entry(*representative).or_default();
        }

        for (entity, strict) in &candidates {
            let representative = classes.find(*entity);
            let mut reps: Vec<T> = strict.iter().map(|c| classes.find(*c)).collect();
            reps.sort();
            reps.dedup();

            // covering edges only: drop candidates implied by another candidate
            let direct: Vec<T> = reps
                .iter()
                .copied()
                .filter(|candidate| {
                    !reps
                        .iter()
                        .any(|other| other != candidate && source.is_subsumed(*other, *candidate))
                })
                .collect();
            let direct = if direct.is_empty() { vec![self.top] } else { direct };
            for parent in direct {
                hierarchy.link(representative, parent);
            }
        }

        let leaves: Vec<T> = hierarchy
            .classes
            .keys()
            .copied()
            .filter(|rep| *rep != self.bottom && *rep != self.top)
            .filter(|rep| hierarchy.children.get(rep).map_or(true, |c| c.is_empty()))
            .collect();
        if leaves.is_empty() {
            hierarchy.link(self.bottom, self.top);
        } else {
            for leaf in leaves {
                hierarchy.link(self.bottom, leaf);
            }
        }
        hierarchy
    }
}

/// Direct parent/child edges between equivalence classes
#[derive(Debug, Clone)]
pub struct Hierarchy<T> {
    top: T,
    bottom: T,
    representatives: BTreeMap<T, T>,
    classes: BTreeMap<T, BTreeSet<T>>,
    parents: BTreeMap<T, BTreeSet<T>>,
    children: BTreeMap<T, BTreeSet<T>>,
    inconsistent: bool,
}

impl<T: Ord + Copy + Display> Hierarchy<T> {
    fn empty(top: T, bottom: T, inconsistent: bool) -> Self {
        Self {
            top,
            bottom,
            representatives: BTreeMap::new(),
            classes: BTreeMap::new(),
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
            inconsistent,
        }
    }

    /// Every entity collapses into the class of ⊥
    fn inconsistent(top: T, bottom: T, entities: BTreeSet<T>) -> Self {
        let mut hierarchy = Self::empty(top, bottom, true);
        for &entity in &entities {
            hierarchy.representatives.insert(entity, bottom);
        }
        hierarchy.classes.insert(bottom, entities);
        hierarchy.parents.insert(bottom, BTreeSet::new());
        hierarchy.children.insert(bottom, BTreeSet::new());
        hierarchy
    }

    fn link(&mut self, child: T, parent: T) {
        self.parents.entry(child).or_default().insert(parent);
        self.children.entry(parent).or_default().insert(child);
    }

    fn class_of(&self, item: T) -> Result<T, HierarchyError> {
        self.representatives
            .get(&item)
            .copied()
            .ok_or_else(|| HierarchyError::UnknownEntity(item.to_string()))
    }

    fn edges(map: &BTreeMap<T, BTreeSet<T>>, rep: T) -> Vec<T> {
        map.get(&rep).map(|set| set.iter().copied().collect()).unwrap_or_default()
    }

    pub fn top(&self) -> T {
        self.top
    }

    pub fn bottom(&self) -> T {
        self.bottom
    }

    pub fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }

    pub fn contains(&self, item: T) -> bool {
        self.representatives.contains_key(&item)
    }

    /// Canonical member of the class of `item` (smallest id, or a sentinel)
    pub fn representative(&self, item: T) -> Result<T, HierarchyError> {
        self.class_of(item)
    }

    /// Direct parents, as class representatives
    pub fn parents(&self, item: T) -> Result<Vec<T>, HierarchyError> {
        Ok(Self::edges(&self.parents, self.class_of(item)?))
    }

    /// Direct children, as class representatives
    pub fn children(&self, item: T) -> Result<Vec<T>, HierarchyError> {
        Ok(Self::edges(&self.children, self.class_of(item)?))
    }

    /// Other members of the class of `item`
    pub fn equivalents(&self, item: T) -> Result<Vec<T>, HierarchyError> {
        let rep = self.class_of(item)?;
        Ok(self
            .classes
            .get(&rep)
            .into_iter()
            .flatten()
            .copied()
            .filter(|member| *member != item)
            .collect())
    }

    /// Strict ancestors (class representatives), breadth first
    pub fn ancestors(&self, item: T) -> Result<BTreeSet<T>, HierarchyError> {
        Ok(Self::reach(&self.parents, self.class_of(item)?))
    }

    /// Strict descendants (class representatives), breadth first
    pub fn descendants(&self, item: T) -> Result<BTreeSet<T>, HierarchyError> {
        Ok(Self::reach(&self.children, self.class_of(item)?))
    }

    fn reach(edges: &BTreeMap<T, BTreeSet<T>>, start: T) -> BTreeSet<T> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<T> = edges.get(&start).into_iter().flatten().copied().collect();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                queue.extend(edges.get(&next).into_iter().flatten().copied());
            }
        }
        seen
    }

    pub fn is_subsumed_by(&self, sub: T, sup: T) -> Result<bool, HierarchyError> {
        let (sub, sup) = (self.class_of(sub)?, self.class_of(sup)?);
        Ok(sub == sup || Self::reach(&self.parents, sub).contains(&sup))
    }

    /// (representative, members) for every class
    pub fn classes(&self) -> impl Iterator<Item = (T, &BTreeSet<T>)> + '_ {
        self.classes.iter().map(|(rep, members)| (*rep, members))
    }

    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }
}
