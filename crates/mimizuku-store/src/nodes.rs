//! 拡張ノード表 (構造的に正規化された合成概念)

use crate::StoreError;
use mimizuku_core::{ConceptId, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Existential entry `∃role.filler`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Existential {
    pub role: RoleId,
    pub filler: ConceptId,
}

impl Existential {
    pub fn new(role: RoleId, filler: ConceptId) -> Self {
        Self { role, filler }
    }
}

/// Content of an extended node: `base ⊓ ∃r1.C1 ⊓ ... ⊓ ∃rn.Cn`.
///
/// The entry set is ordered, so structurally equal nodes hash equally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub base: ConceptId,
    pub existentials: BTreeSet<Existential>,
}

impl NodeKey {
    /// A registry concept viewed as a node without entries
    pub fn plain(base: ConceptId) -> Self {
        Self { base, existentials: BTreeSet::new() }
    }

    pub fn new<I: IntoIterator<Item = Existential>>(base: ConceptId, existentials: I) -> Self {
        Self { base, existentials: existentials.into_iter().collect() }
    }

    pub fn is_plain(&self) -> bool {
        self.existentials.is_empty()
    }

    /// Same entries on a different base
    pub fn rebase(&self, base: ConceptId) -> Self {
        Self { base, existentials: self.existentials.clone() }
    }

    /// Entry-set union of two nodes on `base`
    pub fn merged(base: ConceptId, left: &NodeKey, right: &NodeKey) -> Self {
        Self {
            base,
            existentials: left.existentials.union(&right.existentials).copied().collect(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "⟨{}, {{", self.base)?;
        for (i, entry) in self.existentials.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "∃{}.{}", entry.role, entry.filler)?;
        }
        write!(f, "}}⟩")
    }
}

/// Interning table `NodeKey <-> ConceptId` for synthetic nodes.
///
/// Ids start at `first_id`, past every registry concept.
#[derive(Debug, Clone)]
pub struct NodeTable {
    first_id: u32,
    nodes: Vec<NodeKey>,
    ids: HashMap<NodeKey, ConceptId>,
}

impl NodeTable {
    pub fn new(first_id: u32) -> Self {
        Self { first_id, nodes: Vec::new(), ids: HashMap::new() }
    }

    /// Look up or create the id for `key`. Plain keys resolve to their base.
    pub fn intern(&mut self, key: NodeKey) -> (ConceptId, bool) {
        if key.is_plain() {
            return (key.base, false);
        }
        if let Some(id) = self.ids.get(&key) {
            return (*id, false);
        }

        let id = ConceptId(self.first_id + self.nodes.len() as u32);
        self.ids.insert(key.clone(), id);
        self.nodes.push(key);
        (id, true)
    }

    pub fn find(&self, key: &NodeKey) -> Option<ConceptId> {
        if key.is_plain() {
            return Some(key.base);
        }
        self.ids.get(key).copied()
    }

    /// Whether `id` names a synthetic node
    pub fn is_node(&self, id: ConceptId) -> bool {
        id.0 >= self.first_id && ((id.0 - self.first_id) as usize) < self.nodes.len()
    }

    pub fn get(&self, id: ConceptId) -> Option<&NodeKey> {
        id.0.checked_sub(self.first_id)
            .and_then(|offset| self.nodes.get(offset as usize))
    }

    /// Node content of any id: registry concepts are plain nodes
    pub fn resolve(&self, id: ConceptId) -> Result<NodeKey, StoreError> {
        if id.0 < self.first_id {
            return Ok(NodeKey::plain(id));
        }
        self.get(id).cloned().ok_or(StoreError::UnknownNode(id))
    }

    pub fn first_id(&self) -> u32 {
        self.first_id
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConceptId, &NodeKey)> + '_ {
        let first = self.first_id;
        self.nodes
            .iter()
            .enumerate()
            .map(move |(i, key)| (ConceptId(first + i as u32), key))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
