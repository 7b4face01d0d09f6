//! 正規化済み公理のパターン別インデックスと表現力プロファイル

use crate::model::{Axiom, ConceptId, Ontology, RoleId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

type Concepts = SmallVec<[ConceptId; 4]>;
type RolePairs = SmallVec<[(RoleId, ConceptId); 4]>;
type ConceptPairs = SmallVec<[(ConceptId, ConceptId); 4]>;

/// Which rule set the classifier runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainMode {
    /// Decide from the expressivity profile
    #[default]
    Auto,
    /// Always use the simple rule set (inverse/functional axioms are ignored)
    Simple,
    /// Always use the extended rule set
    Extended,
}

/// Static description of the constructs an ontology uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpressivityProfile {
    pub has_inverse_roles: bool,
    pub has_functional_roles: bool,
    pub has_role_chains: bool,
    pub has_transitive_roles: bool,
    pub has_bottom: bool,
    pub has_nominals: bool,
}

impl ExpressivityProfile {
    pub fn from_axioms<'a, I: IntoIterator<Item = &'a Axiom>>(axioms: I) -> Self {
        let mut profile = Self::default();
        for axiom in axioms {
            profile.has_bottom |= axiom.mentions_bottom();
            match axiom {
                Axiom::InverseRoles(..) => profile.has_inverse_roles = true,
                Axiom::Functional(_) => profile.has_functional_roles = true,
                Axiom::RoleChain { .. } => profile.has_role_chains = true,
                Axiom::Transitive(_) => profile.has_transitive_roles = true,
                Axiom::ConceptAssertion { .. } | Axiom::RoleAssertion { .. } => {
                    profile.has_nominals = true
                }
                _ => {}
            }
        }
        profile
    }

    /// Whether `mode` selects the extended rule set for this profile
    pub fn uses_extended_rules(&self, mode: ChainMode) -> bool {
        match mode {
            ChainMode::Auto => self.has_inverse_roles || self.has_functional_roles,
            ChainMode::Simple => false,
            ChainMode::Extended => true,
        }
    }
}

/// Immutable, pattern-indexed view of a normalized ontology
#[derive(Debug, Clone)]
pub struct OntologyIndex {
    profile: ExpressivityProfile,
    extended: bool,
    concept_bound: u32,
    role_bound: u32,

    /// A ⊑ B, keyed by A
    told_subsumers: HashMap<ConceptId, Concepts>,
    /// A1 ⊓ A2 ⊑ B, keyed by each operand: (partner, B)
    conjunctions: HashMap<ConceptId, ConceptPairs>,
    /// A ⊑ ∃r.B, keyed by A: (r, B)
    existentials: HashMap<ConceptId, RolePairs>,
    /// ∃r.A ⊑ B, keyed by A: (r, B)
    some_values_by_filler: HashMap<ConceptId, RolePairs>,
    /// ∃r.A ⊑ B, keyed by r: (A, B)
    some_values_by_role: HashMap<RoleId, ConceptPairs>,

    /// Strict super roles (transitive closure)
    super_roles: HashMap<RoleId, Vec<RoleId>>,
    /// r ∘ s ⊑ t keyed by r: (s, t)
    chains_by_first: HashMap<RoleId, Vec<(RoleId, RoleId)>>,
    /// r ∘ s ⊑ t keyed by s: (r, t)
    chains_by_second: HashMap<RoleId, Vec<(RoleId, RoleId)>>,
    transitive: HashSet<RoleId>,
    functional: HashSet<RoleId>,
    inverses: HashMap<RoleId, RoleId>,
    /// Simple mode: node-tagging role per role used in `A ⊑ ∃r.B`
    witnesses: HashMap<RoleId, RoleId>,

    nominals: BTreeSet<ConceptId>,
    /// r({a}, {b}) seeds
    role_assertions: Vec<(RoleId, ConceptId, ConceptId)>,
}

impl OntologyIndex {
    /// Index `ontology` for the rule set selected by `mode`.
    ///
    /// In extended mode every named role receives an inverse, and in simple
    /// mode every role used in `A ⊑ ∃r.B` receives a witness role, so the
    /// registry may grow.
    pub fn build(ontology: &mut Ontology, mode: ChainMode) -> Self {
        let mut profile = ExpressivityProfile::from_axioms(&ontology.axioms);
        profile.has_nominals |= ontology.entities.individual_count() > 0;
        let extended = profile.uses_extended_rules(mode);

        let mut equivalent_roles = Vec::new();
        for axiom in &ontology.axioms {
            if let Axiom::InverseRoles(first, second) = axiom {
                equivalent_roles.extend(ontology.entities.register_inverse(*first, *second));
            }
        }

        if extended {
            let named: Vec<RoleId> = ontology
                .entities
                .roles()
                .filter(|role| *role != RoleId::TOP && *role != RoleId::BOTTOM)
                .collect();
            for role in named {
                ontology.entities.ensure_inverse(role);
            }
            profile.has_inverse_roles = true;
        }

        let existential_roles: BTreeSet<RoleId> = ontology
            .axioms
            .iter()
            .filter_map(|axiom| match axiom {
                Axiom::SomeValuesSup { role, .. } => Some(*role),
                _ => None,
            })
            .collect();
        if !extended {
            for role in &existential_roles {
                ontology.entities.ensure_witness(*role);
            }
        }

        let entities = &ontology.entities;
        let mut index = Self {
            profile,
            extended,
            concept_bound: entities.concept_bound(),
            role_bound: entities.role_bound(),
            told_subsumers: HashMap::new(),
            conjunctions: HashMap::new(),
            existentials: HashMap::new(),
            some_values_by_filler: HashMap::new(),
            some_values_by_role: HashMap::new(),
            super_roles: HashMap::new(),
            chains_by_first: HashMap::new(),
            chains_by_second: HashMap::new(),
            transitive: HashSet::new(),
            functional: HashSet::new(),
            inverses: HashMap::new(),
            witnesses: HashMap::new(),
            nominals: entities.concepts().filter(|c| entities.is_nominal(*c)).collect(),
            role_assertions: Vec::new(),
        };

        if extended {
            for role in entities.roles() {
                if let Some(inverse) = entities.inverse_of(role) {
                    index.inverses.insert(role, inverse);
                }
            }
        } else {
            for role in existential_roles {
                if let Some(witness) = entities.witness_of(role) {
                    index.witnesses.insert(role, witness);
                }
            }
        }

        let mut told_roles: HashMap<RoleId, Vec<RoleId>> = HashMap::new();
        let mut chains: Vec<(RoleId, RoleId, RoleId)> = Vec::new();

        // two inverses of one role are equivalent
        if extended {
            for (first, second) in equivalent_roles {
                debug!(first = %first, second = %second, "roles share an inverse");
                told_roles.entry(first).or_default().push(second);
                told_roles.entry(second).or_default().push(first);
            }
        }

        for axiom in &ontology.axioms {
            match *axiom {
                Axiom::SubClass { sub, sup } => index.add_told(sub, sup),
                Axiom::Conjunction { left, right, sup } => {
                    if left == right {
                        index.add_told(left, sup);
                    } else {
                        index.conjunctions.entry(left).or_default().push((right, sup));
                        index.conjunctions.entry(right).or_default().push((left, sup));
                    }
                }
                Axiom::SomeValuesSub { role, filler, sup } => {
                    index.some_values_by_filler.entry(filler).or_default().push((role, sup));
                    index.some_values_by_role.entry(role).or_default().push((filler, sup));
                }
                Axiom::SomeValuesSup { sub, role, filler } => {
                    index.existentials.entry(sub).or_default().push((role, filler));
                }
                Axiom::SubRole { sub, sup } => {
                    told_roles.entry(sub).or_default().push(sup);
                    if let (Some(inv_sub), Some(inv_sup)) = (index.inverse(sub), index.inverse(sup)) {
                        told_roles.entry(inv_sub).or_default().push(inv_sup);
                    }
                }
                Axiom::RoleChain { first, second, sup } => {
                    chains.push((first, second, sup));
                    if let (Some(inv_first), Some(inv_second), Some(inv_sup)) =
                        (index.inverse(first), index.inverse(second), index.inverse(sup))
                    {
                        chains.push((inv_second, inv_first, inv_sup));
                    }
                }
                Axiom::Transitive(role) => {
                    let inverse = index.inverse(role);
                    for r in std::iter::once(role).chain(inverse) {
                        index.transitive.insert(r);
                        // chain propagation replaces the transitivity rule
                        if index.profile.has_role_chains {
                            chains.push((r, r, r));
                        }
                    }
                }
                Axiom::Functional(role) => {
                    index.functional.insert(role);
                }
                Axiom::InverseRoles(..) => {}
                Axiom::ConceptAssertion { individual, concept } => {
                    if let Some(nominal) = entities.nominal_of(individual) {
                        index.add_told(nominal, concept);
                    }
                }
                Axiom::RoleAssertion { role, subject, object } => {
                    if let (Some(a), Some(b)) = (entities.nominal_of(subject), entities.nominal_of(object)) {
                        index.role_assertions.push((role, a, b));
                    }
                }
            }
        }

        index.close_role_hierarchy(&told_roles);

        for (first, second, sup) in chains {
            index.chains_by_first.entry(first).or_default().push((second, sup));
            index.chains_by_second.entry(second).or_default().push((first, sup));
        }

        debug!(
            concepts = index.concept_bound,
            roles = index.role_bound,
            extended = index.extended,
            "ontology index built: {:?}",
            index.profile
        );

        index
    }

    fn add_told(&mut self, sub: ConceptId, sup: ConceptId) {
        if sub != sup {
            self.told_subsumers.entry(sub).or_default().push(sup);
        }
    }

    fn inverse(&self, role: RoleId) -> Option<RoleId> {
        self.inverses.get(&role).copied()
    }

    /// Transitive closure of the told role inclusions, one BFS per role
    fn close_role_hierarchy(&mut self, told: &HashMap<RoleId, Vec<RoleId>>) {
        for role in (0..self.role_bound).map(RoleId) {
            let mut seen: BTreeSet<RoleId> = BTreeSet::new();
            let mut queue: VecDeque<RoleId> = told.get(&role).into_iter().flatten().copied().collect();
            while let Some(next) = queue.pop_front() {
                if next == role || !seen.insert(next) {
                    continue;
                }
                if let Some(supers) = told.get(&next) {
                    queue.extend(supers.iter().copied());
                }
            }
            if !seen.is_empty() {
                self.super_roles.insert(role, seen.into_iter().collect());
            }
        }
    }

    pub fn profile(&self) -> &ExpressivityProfile {
        &self.profile
    }

    /// Whether the extended (inverse/functional aware) rule set is active
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn concept_bound(&self) -> u32 {
        self.concept_bound
    }

    pub fn role_bound(&self) -> u32 {
        self.role_bound
    }

    /// Every concept id known at index time
    pub fn concepts(&self) -> impl Iterator<Item = ConceptId> {
        (0..self.concept_bound).map(ConceptId)
    }

    pub fn roles(&self) -> impl Iterator<Item = RoleId> {
        (0..self.role_bound).map(RoleId)
    }

    pub fn told_subsumers(&self, concept: ConceptId) -> &[ConceptId] {
        self.told_subsumers.get(&concept).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Conjunction axioms in which `concept` is an operand, as (partner, conclusion)
    pub fn conjunctions_with(&self, concept: ConceptId) -> &[(ConceptId, ConceptId)] {
        self.conjunctions.get(&concept).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// `concept ⊑ ∃r.B` axioms as (r, B)
    pub fn existentials_of(&self, concept: ConceptId) -> &[(RoleId, ConceptId)] {
        self.existentials.get(&concept).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// `∃r.filler ⊑ B` axioms as (r, B)
    pub fn some_values_by_filler(&self, filler: ConceptId) -> &[(RoleId, ConceptId)] {
        self.some_values_by_filler.get(&filler).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// `∃role.A ⊑ B` axioms as (A, B)
    pub fn some_values_by_role(&self, role: RoleId) -> &[(ConceptId, ConceptId)] {
        self.some_values_by_role.get(&role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Strict super roles of `role`
    pub fn super_roles(&self, role: RoleId) -> &[RoleId] {
        self.super_roles.get(&role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Whether `sub ⊑* sup` holds in the told role hierarchy (reflexive)
    pub fn is_sub_role(&self, sub: RoleId, sup: RoleId) -> bool {
        sub == sup
            || sup == RoleId::TOP
            || sub == RoleId::BOTTOM
            || self.super_roles(sub).contains(&sup)
    }

    /// Chain axioms `role ∘ s ⊑ t` as (s, t)
    pub fn chains_by_first(&self, role: RoleId) -> &[(RoleId, RoleId)] {
        self.chains_by_first.get(&role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Chain axioms `r ∘ role ⊑ t` as (r, t)
    pub fn chains_by_second(&self, role: RoleId) -> &[(RoleId, RoleId)] {
        self.chains_by_second.get(&role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_transitive(&self, role: RoleId) -> bool {
        self.transitive.contains(&role)
    }

    pub fn is_functional(&self, role: RoleId) -> bool {
        self.functional.contains(&role)
    }

    /// Functional roles among `role` and its super roles
    pub fn functional_ancestors(&self, role: RoleId) -> Vec<RoleId> {
        std::iter::once(role)
            .chain(self.super_roles(role).iter().copied())
            .filter(|r| self.is_functional(*r))
            .collect()
    }

    /// Registered inverse, only populated in extended mode
    pub fn inverse_of(&self, role: RoleId) -> Option<RoleId> {
        self.inverse(role)
    }

    /// Node-tagging role for successors of `role`, only populated in simple mode
    pub fn witness_of(&self, role: RoleId) -> Option<RoleId> {
        self.witnesses.get(&role).copied()
    }

    pub fn is_nominal(&self, concept: ConceptId) -> bool {
        self.nominals.contains(&concept)
    }

    pub fn nominals(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.nominals.iter().copied()
    }

    pub fn role_assertions(&self) -> &[(RoleId, ConceptId, ConceptId)] {
        &self.role_assertions
    }
}
