//! エンティティ管理 (ID の割り当て、逆ロール、名義概念)

use crate::model::{ConceptId, IndividualId, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const OWL_THING: &str = "owl:Thing";
pub const OWL_NOTHING: &str = "owl:Nothing";
pub const OWL_TOP_OBJECT_PROPERTY: &str = "owl:topObjectProperty";
pub const OWL_BOTTOM_OBJECT_PROPERTY: &str = "owl:bottomObjectProperty";

/// Kind of a concept id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptKind {
    Top,
    Bottom,
    /// Declared by the ontology
    Named,
    /// Introduced by normalization or by the engine
    Auxiliary,
    /// Synthetic singleton concept `{a}`
    Nominal(IndividualId),
}

/// Kind of a role id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleKind {
    Top,
    Bottom,
    Named,
    Auxiliary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConceptEntry {
    name: String,
    kind: ConceptKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoleEntry {
    name: String,
    kind: RoleKind,
    inverse: Option<RoleId>,
    witness: Option<RoleId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndividualEntry {
    name: String,
    nominal: ConceptId,
}

/// Allocates dense ids for concepts, roles and individuals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRegistry {
    concepts: Vec<ConceptEntry>,
    roles: Vec<RoleEntry>,
    individuals: Vec<IndividualEntry>,
    concept_index: HashMap<String, ConceptId>,
    role_index: HashMap<String, RoleId>,
    individual_index: HashMap<String, IndividualId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            concepts: Vec::new(),
            roles: Vec::new(),
            individuals: Vec::new(),
            concept_index: HashMap::new(),
            role_index: HashMap::new(),
            individual_index: HashMap::new(),
        };

        registry.push_concept(OWL_THING.to_string(), ConceptKind::Top);
        registry.push_concept(OWL_NOTHING.to_string(), ConceptKind::Bottom);
        registry.push_role(OWL_TOP_OBJECT_PROPERTY.to_string(), RoleKind::Top);
        registry.push_role(OWL_BOTTOM_OBJECT_PROPERTY.to_string(), RoleKind::Bottom);
        // ⊤ and ⊥ roles are their own inverses
        registry.roles[RoleId::TOP.index()].inverse = Some(RoleId::TOP);
        registry.roles[RoleId::BOTTOM.index()].inverse = Some(RoleId::BOTTOM);

        registry
    }

    fn push_concept(&mut self, name: String, kind: ConceptKind) -> ConceptId {
        let id = ConceptId(self.concepts.len() as u32);
        self.concept_index.insert(name.clone(), id);
        self.concepts.push(ConceptEntry { name, kind });
        id
    }

    fn push_role(&mut self, name: String, kind: RoleKind) -> RoleId {
        let id = RoleId(self.roles.len() as u32);
        self.role_index.insert(name.clone(), id);
        self.roles.push(RoleEntry { name, kind, inverse: None, witness: None });
        id
    }

    /// Get or create a named concept
    pub fn concept(&mut self, name: &str) -> ConceptId {
        match self.concept_index.get(name) {
            Some(id) => *id,
            None => self.push_concept(name.to_string(), ConceptKind::Named),
        }
    }

    /// Allocate a fresh auxiliary concept
    pub fn fresh_concept(&mut self) -> ConceptId {
        let name = format!("_:aux{}", self.concepts.len());
        self.push_concept(name, ConceptKind::Auxiliary)
    }

    /// Get or create a named role
    pub fn role(&mut self, name: &str) -> RoleId {
        match self.role_index.get(name) {
            Some(id) => *id,
            None => self.push_role(name.to_string(), RoleKind::Named),
        }
    }

    /// Allocate a fresh auxiliary role
    pub fn fresh_role(&mut self) -> RoleId {
        let name = format!("_:role{}", self.roles.len());
        self.push_role(name, RoleKind::Auxiliary)
    }

    /// Get or create an individual together with its nominal concept
    pub fn individual(&mut self, name: &str) -> IndividualId {
        if let Some(id) = self.individual_index.get(name) {
            return *id;
        }

        let id = IndividualId(self.individuals.len() as u32);
        let nominal = self.push_concept(format!("{{{}}}", name), ConceptKind::Nominal(id));
        self.individual_index.insert(name.to_string(), id);
        self.individuals.push(IndividualEntry { name: name.to_string(), nominal });
        id
    }

    pub fn find_concept(&self, name: &str) -> Option<ConceptId> {
        self.concept_index.get(name).copied()
    }

    pub fn find_role(&self, name: &str) -> Option<RoleId> {
        self.role_index.get(name).copied()
    }

    pub fn find_individual(&self, name: &str) -> Option<IndividualId> {
        self.individual_index.get(name).copied()
    }

    /// Declare `first` and `second` as mutual inverses.
    ///
    /// The first inverse recorded for a role is kept. A later declaration
    /// naming a different inverse does not overwrite it; instead the pair of
    /// roles that must be equivalent is returned.
    pub fn register_inverse(&mut self, first: RoleId, second: RoleId) -> Vec<(RoleId, RoleId)> {
        let mut equivalent = Vec::new();
        for (role, inverse) in [(first, second), (second, first)] {
            if let Some(entry) = self.roles.get_mut(role.index()) {
                match entry.inverse {
                    None => entry.inverse = Some(inverse),
                    Some(existing) if existing != inverse => equivalent.push((existing, inverse)),
                    Some(_) => {}
                }
            }
        }
        equivalent
    }

    /// The registered inverse of `role`, creating an auxiliary one on demand
    pub fn ensure_inverse(&mut self, role: RoleId) -> RoleId {
        if let Some(inverse) = self.inverse_of(role) {
            return inverse;
        }

        let name = format!("inverse({})", self.roles[role.index()].name);
        let inverse = self.push_role(name, RoleKind::Auxiliary);
        self.register_inverse(role, inverse);
        inverse
    }

    pub fn inverse_of(&self, role: RoleId) -> Option<RoleId> {
        self.roles.get(role.index()).and_then(|entry| entry.inverse)
    }

    /// Auxiliary role marking successor nodes introduced for `role`.
    /// No axiom mentions it, so it only tags node keys.
    pub fn ensure_witness(&mut self, role: RoleId) -> RoleId {
        if let Some(witness) = self.witness_of(role) {
            return witness;
        }

        let name = format!("witness({})", self.roles[role.index()].name);
        let witness = self.push_role(name, RoleKind::Auxiliary);
        self.roles[role.index()].witness = Some(witness);
        witness
    }

    pub fn witness_of(&self, role: RoleId) -> Option<RoleId> {
        self.roles.get(role.index()).and_then(|entry| entry.witness)
    }

    pub fn concept_kind(&self, id: ConceptId) -> Option<ConceptKind> {
        self.concepts.get(id.index()).map(|entry| entry.kind)
    }

    pub fn role_kind(&self, id: RoleId) -> Option<RoleKind> {
        self.roles.get(id.index()).map(|entry| entry.kind)
    }

    pub fn concept_name(&self, id: ConceptId) -> Option<&str> {
        self.concepts.get(id.index()).map(|entry| entry.name.as_str())
    }

    pub fn role_name(&self, id: RoleId) -> Option<&str> {
        self.roles.get(id.index()).map(|entry| entry.name.as_str())
    }

    pub fn individual_name(&self, id: IndividualId) -> Option<&str> {
        self.individuals.get(id.index()).map(|entry| entry.name.as_str())
    }

    /// Nominal concept `{a}` of an individual
    pub fn nominal_of(&self, individual: IndividualId) -> Option<ConceptId> {
        self.individuals.get(individual.index()).map(|entry| entry.nominal)
    }

    /// Individual behind a nominal concept
    pub fn individual_of(&self, concept: ConceptId) -> Option<IndividualId> {
        match self.concept_kind(concept) {
            Some(ConceptKind::Nominal(individual)) => Some(individual),
            _ => None,
        }
    }

    pub fn is_auxiliary_concept(&self, id: ConceptId) -> bool {
        matches!(self.concept_kind(id), Some(ConceptKind::Auxiliary))
    }

    pub fn is_nominal(&self, id: ConceptId) -> bool {
        matches!(self.concept_kind(id), Some(ConceptKind::Nominal(_)))
    }

    pub fn is_auxiliary_role(&self, id: RoleId) -> bool {
        matches!(self.role_kind(id), Some(RoleKind::Auxiliary))
    }

    /// One past the largest allocated concept id
    pub fn concept_bound(&self) -> u32 {
        self.concepts.len() as u32
    }

    pub fn role_bound(&self) -> u32 {
        self.roles.len() as u32
    }

    pub fn individual_count(&self) -> usize {
        self.individuals.len()
    }

    pub fn concepts(&self) -> impl Iterator<Item = ConceptId> + '_ {
        (0..self.concepts.len() as u32).map(ConceptId)
    }

    pub fn roles(&self) -> impl Iterator<Item = RoleId> + '_ {
        (0..self.roles.len() as u32).map(RoleId)
    }

    pub fn individuals(&self) -> impl Iterator<Item = IndividualId> + '_ {
        (0..self.individuals.len() as u32).map(IndividualId)
    }

    /// Concepts visible in the final hierarchy: ⊤, ⊥ and named concepts
    pub fn visible_concepts(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.concepts().filter(|id| {
            matches!(
                self.concept_kind(*id),
                Some(ConceptKind::Top | ConceptKind::Bottom | ConceptKind::Named)
            )
        })
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_starts_with_sentinels() {
        let registry = EntityRegistry::new();
        assert_eq!(registry.concept_bound(), 2);
        assert_eq!(registry.role_bound(), 2);
        assert_eq!(registry.find_concept(OWL_THING), Some(ConceptId::TOP));
        assert_eq!(registry.find_concept(OWL_NOTHING), Some(ConceptId::BOTTOM));
        assert_eq!(registry.inverse_of(RoleId::TOP), Some(RoleId::TOP));
    }

    #[test]
    fn test_named_ids_are_dense_and_stable() {
        let mut registry = EntityRegistry::new();
        let a = registry.concept("A");
        let b = registry.concept("B");
        assert_eq!(a, ConceptId(2));
        assert_eq!(b, ConceptId(3));
        assert_eq!(registry.concept("A"), a);
    }

    #[test]
    fn test_individual_gets_nominal() {
        let mut registry = EntityRegistry::new();
        let john = registry.individual("john");
        let nominal = registry.nominal_of(john).unwrap();

        assert!(registry.is_nominal(nominal));
        assert_eq!(registry.individual_of(nominal), Some(john));
        assert_eq!(registry.concept_name(nominal), Some("{john}"));
        assert_eq!(registry.individual("john"), john);
    }

    #[test]
    fn test_ensure_inverse_creates_once() {
        let mut registry = EntityRegistry::new();
        let r = registry.role("hasPart");
        let inv = registry.ensure_inverse(r);

        assert!(registry.is_auxiliary_role(inv));
        assert_eq!(registry.inverse_of(inv), Some(r));
        assert_eq!(registry.ensure_inverse(r), inv);
        assert_eq!(registry.role_name(inv), Some("inverse(hasPart)"));
    }

    #[test]
    fn test_declared_inverse_is_reused() {
        let mut registry = EntityRegistry::new();
        let parent = registry.role("hasParent");
        let child = registry.role("hasChild");
        assert!(registry.register_inverse(parent, child).is_empty());

        assert_eq!(registry.ensure_inverse(parent), child);
        assert_eq!(registry.role_bound(), 4);
    }

    #[test]
    fn test_witness_role_is_auxiliary_and_cached() {
        let mut registry = EntityRegistry::new();
        let r = registry.role("hasPart");
        let witness = registry.ensure_witness(r);

        assert!(registry.is_auxiliary_role(witness));
        assert_eq!(registry.ensure_witness(r), witness);
        assert_eq!(registry.witness_of(r), Some(witness));
        assert_eq!(registry.inverse_of(witness), None);
        assert_eq!(registry.role_name(witness), Some("witness(hasPart)"));
    }

    #[test]
    fn test_second_inverse_is_reported_as_equivalent() {
        let mut registry = EntityRegistry::new();
        let r = registry.role("r");
        let s = registry.role("s");
        let t = registry.role("t");

        assert!(registry.register_inverse(r, s).is_empty());
        assert!(registry.register_inverse(s, r).is_empty());
        assert_eq!(registry.register_inverse(r, t), vec![(s, t)]);

        assert_eq!(registry.inverse_of(r), Some(s));
        assert_eq!(registry.inverse_of(s), Some(r));
        assert_eq!(registry.inverse_of(t), Some(r));
    }

    #[test]
    fn test_visible_concepts_skip_auxiliary_and_nominals() {
        let mut registry = EntityRegistry::new();
        let a = registry.concept("A");
        let aux = registry.fresh_concept();
        registry.individual("x");

        let visible: Vec<_> = registry.visible_concepts().collect();
        assert_eq!(visible, vec![ConceptId::TOP, ConceptId::BOTTOM, a]);
        assert!(registry.is_auxiliary_concept(aux));
    }
}
