//! 識別子と正規化済み公理のデータモデル

use crate::entities::EntityRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense concept identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ConceptId(pub u32);

impl ConceptId {
    /// owl:Thing (⊤)
    pub const TOP: ConceptId = ConceptId(0);
    /// owl:Nothing (⊥)
    pub const BOTTOM: ConceptId = ConceptId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_top(self) -> bool {
        self == Self::TOP
    }

    pub fn is_bottom(self) -> bool {
        self == Self::BOTTOM
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Dense role (object property) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RoleId(pub u32);

impl RoleId {
    /// owl:topObjectProperty
    pub const TOP: RoleId = RoleId(0);
    /// owl:bottomObjectProperty
    pub const BOTTOM: RoleId = RoleId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Individual identifier. Every individual is backed by a nominal concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct IndividualId(pub u32);

impl IndividualId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Normalized axiom shapes consumed by the completion rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axiom {
    /// A ⊑ B
    SubClass { sub: ConceptId, sup: ConceptId },

    /// A1 ⊓ A2 ⊑ B
    Conjunction { left: ConceptId, right: ConceptId, sup: ConceptId },

    /// ∃r.A ⊑ B
    SomeValuesSub { role: RoleId, filler: ConceptId, sup: ConceptId },

    /// A ⊑ ∃r.B
    SomeValuesSup { sub: ConceptId, role: RoleId, filler: ConceptId },

    /// r ⊑ s
    SubRole { sub: RoleId, sup: RoleId },

    /// r ∘ s ⊑ t
    RoleChain { first: RoleId, second: RoleId, sup: RoleId },

    /// r ∘ r ⊑ r
    Transitive(RoleId),

    /// (≤ 1 r)
    Functional(RoleId),

    /// r ≡ s⁻
    InverseRoles(RoleId, RoleId),

    /// C(a)
    ConceptAssertion { individual: IndividualId, concept: ConceptId },

    /// r(a, b)
    RoleAssertion { role: RoleId, subject: IndividualId, object: IndividualId },
}

impl Axiom {
    /// Whether the axiom mentions owl:Nothing anywhere
    pub fn mentions_bottom(&self) -> bool {
        match self {
            Axiom::SubClass { sub, sup } => sub.is_bottom() || sup.is_bottom(),
            Axiom::Conjunction { left, right, sup } => {
                left.is_bottom() || right.is_bottom() || sup.is_bottom()
            }
            Axiom::SomeValuesSub { filler, sup, .. } => filler.is_bottom() || sup.is_bottom(),
            Axiom::SomeValuesSup { sub, filler, .. } => sub.is_bottom() || filler.is_bottom(),
            Axiom::ConceptAssertion { concept, .. } => concept.is_bottom(),
            _ => false,
        }
    }
}

/// Normalized ontology: the entity registry plus its axioms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ontology {
    /// Ontology IRI
    pub iri: Option<String>,

    /// Names and kinds of every entity
    pub entities: EntityRegistry,

    /// All axioms in insertion order
    pub axioms: Vec<Axiom>,
}

impl Ontology {
    pub fn new() -> Self {
        Self {
            iri: None,
            entities: EntityRegistry::new(),
            axioms: Vec::new(),
        }
    }

    pub fn with_iri(iri: impl Into<String>) -> Self {
        Self {
            iri: Some(iri.into()),
            entities: EntityRegistry::new(),
            axioms: Vec::new(),
        }
    }

    pub fn add_axiom(&mut self, axiom: Axiom) {
        self.axioms.push(axiom);
    }

    pub fn extend<I: IntoIterator<Item = Axiom>>(&mut self, axioms: I) {
        self.axioms.extend(axioms);
    }

    /// Shorthand for `entities.concept(name)`
    pub fn concept(&mut self, name: &str) -> ConceptId {
        self.entities.concept(name)
    }

    /// Shorthand for `entities.role(name)`
    pub fn role(&mut self, name: &str) -> RoleId {
        self.entities.role(name)
    }

    /// Shorthand for `entities.individual(name)`
    pub fn individual(&mut self, name: &str) -> IndividualId {
        self.entities.individual(name)
    }
}

impl Default for Ontology {
    fn default() -> Self {
        Self::new()
    }
}
