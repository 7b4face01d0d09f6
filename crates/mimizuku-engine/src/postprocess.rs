//! 飽和後の後処理
//!
//! 補助ロールの除去、ロール階層、補助概念の除去、名目閉包、名目の除去、
//! 概念階層の順に実行する。各段階は前の段階の結果に依存する。

use crate::config::ClassifierConfig;
use crate::hierarchy::{Hierarchy, HierarchyBuilder, RoleSubsumptions};
use crate::saturation::{Saturation, SaturationStats};
use mimizuku_core::{ConceptId, EntityRegistry, IndividualId, OntologyIndex, RoleId};
use mimizuku_rules::RuleChain;
use mimizuku_store::{FactStore, FactView, RoleFact, StoreError, SubsumptionFact};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info, warn};

/// Classification facts about one individual
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualTypes {
    /// Most specific visible concepts (class representatives)
    pub direct_types: BTreeSet<ConceptId>,
    /// Other individuals denoting the same element
    pub same_as: BTreeSet<IndividualId>,
}

/// Output of the post-processing stages
#[derive(Debug, Clone)]
pub struct PostProcessed {
    pub concepts: Hierarchy<ConceptId>,
    pub roles: Hierarchy<RoleId>,
    pub individuals: BTreeMap<IndividualId, IndividualTypes>,
    pub nominal_rounds: usize,
    /// Work done by re-saturation during nominal closure
    pub closure: SaturationStats,
}

pub struct PostProcessor<'a> {
    entities: &'a EntityRegistry,
    index: &'a OntologyIndex,
    chain: &'a RuleChain,
    config: &'a ClassifierConfig,
}

impl<'a> PostProcessor<'a> {
    pub fn new(
        entities: &'a EntityRegistry,
        index: &'a OntologyIndex,
        chain: &'a RuleChain,
        config: &'a ClassifierConfig,
    ) -> Self {
        Self { entities, index, chain, config }
    }

    /// Run every stage once, in order, over a converged store
    pub fn run(&self, store: &mut FactStore) -> Result<PostProcessed, StoreError> {
        let roles = self.visible_roles();
        info!(roles = roles.len(), "post-processing: auxiliary roles filtered");

        let role_hierarchy =
            HierarchyBuilder::new(RoleId::TOP, RoleId::BOTTOM).build(roles, &RoleSubsumptions::new(self.index));
        info!(classes = role_hierarchy.classes().count(), "post-processing: role hierarchy built");

        let concepts: BTreeSet<ConceptId> = self
            .entities
            .concepts()
            .filter(|c| !self.entities.is_auxiliary_concept(*c))
            .collect();
        info!(concepts = concepts.len(), "post-processing: auxiliary concepts filtered");

        let (nominal_rounds, closure) = self.nominal_closure(store)?;
        info!(rounds = nominal_rounds, "post-processing: nominal closure done");

        let concepts: BTreeSet<ConceptId> = concepts
            .into_iter()
            .filter(|c| !self.entities.is_nominal(*c))
            .collect();
        info!(concepts = concepts.len(), "post-processing: nominals filtered");

        let concept_hierarchy =
            HierarchyBuilder::new(ConceptId::TOP, ConceptId::BOTTOM).build(concepts, store.subsumptions());
        if concept_hierarchy.is_inconsistent() {
            warn!("ontology is inconsistent: every concept is equivalent to owl:Nothing");
        }
        info!(classes = concept_hierarchy.classes().count(), "post-processing: concept hierarchy built");

        let individuals = self.individual_types(store, &concept_hierarchy);

        Ok(PostProcessed {
            concepts: concept_hierarchy,
            roles: role_hierarchy,
            individuals,
            nominal_rounds,
            closure,
        })
    }

    /// ⊤, ⊥, named roles, and auxiliary roles that are the inverse of a named one
    fn visible_roles(&self) -> Vec<RoleId> {
        self.entities
            .roles()
            .filter(|role| {
                !self.entities.is_auxiliary_role(*role)
                    || self
                        .entities
                        .inverse_of(*role)
                        .map_or(false, |inverse| !self.entities.is_auxiliary_role(inverse))
            })
            .collect()
    }

    /// Ids reachable from any nominal over role facts, nominals included
    fn reachable_from_nominals(&self, store: &FactStore) -> BTreeSet<ConceptId> {
        let mut seen: BTreeSet<ConceptId> = BTreeSet::new();
        let mut queue: VecDeque<ConceptId> = self.index.nominals().collect();
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            for role in store.roles_from(next) {
                queue.extend(store.successors(role, next));
            }
        }
        seen
    }

    /// Facts forced by the fact that nominals denote exactly one, existing element.
    ///
    /// Returns the candidate facts; the caller keeps those not yet derived.
    fn closure_facts(&self, store: &FactStore) -> (Vec<SubsumptionFact>, Vec<RoleFact>) {
        let mut subsumptions = Vec::new();
        let mut roles = Vec::new();

        for y in self.reachable_from_nominals(store) {
            if store.is_unsatisfiable(y) {
                subsumptions.push(SubsumptionFact::new(ConceptId::TOP, ConceptId::BOTTOM));
                continue;
            }

            let subsumers = store.subsumers_of(y);
            for nominal in subsumers.iter().copied().filter(|c| *c != y && self.index.is_nominal(*c)) {
                // y is non-empty and y ⊑ {a}, so y ≡ {a}
                subsumptions.extend(subsumers.iter().map(|s| SubsumptionFact::new(nominal, *s)));
                for role in store.roles_from(y) {
                    for z in store.successors(role, y) {
                        roles.push(RoleFact::new(role, nominal, z));
                    }
                }
                for role in store.roles_into(y) {
                    for w in store.predecessors(role, y) {
                        roles.push(RoleFact::new(role, w, nominal));
                    }
                }
            }

            for role in store.roles_from(y) {
                if !self.index.is_functional(role) {
                    continue;
                }
                let fillers: Vec<ConceptId> = store
                    .successors(role, y)
                    .into_iter()
                    .filter(|z| self.index.is_nominal(*z))
                    .collect();
                for (i, first) in fillers.iter().enumerate() {
                    for second in &fillers[i + 1..] {
                        subsumptions.push(SubsumptionFact::new(*first, *second));
                        subsumptions.push(SubsumptionFact::new(*second, *first));
                    }
                }
            }
        }
        (subsumptions, roles)
    }

    /// Repeat closure and re-saturation until no new fact appears
    fn nominal_closure(&self, store: &mut FactStore) -> Result<(usize, SaturationStats), StoreError> {
        let mut stats = SaturationStats::default();
        let mut rounds = 0;
        if self.index.nominals().next().is_none() {
            return Ok((rounds, stats));
        }

        loop {
            rounds += 1;
            let (subsumptions, roles) = self.closure_facts(store);
            let mut added = 0usize;
            for fact in subsumptions {
                if !store.is_subsumed(fact.sub, fact.sup) && store.enqueue_subsumption(fact) {
                    added += 1;
                }
            }
            for fact in roles {
                if !store.has_role(&fact) && store.enqueue_role(fact) {
                    added += 1;
                }
            }
            debug!(round = rounds, added, "nominal closure round");
            if added == 0 {
                break;
            }

            let mut saturation = Saturation::new(self.index, self.chain, self.config);
            stats.merge(&saturation.run(store)?);
        }
        Ok((rounds, stats))
    }

    fn individual_types(
        &self,
        store: &FactStore,
        hierarchy: &Hierarchy<ConceptId>,
    ) -> BTreeMap<IndividualId, IndividualTypes> {
        let mut result = BTreeMap::new();
        for individual in self.entities.individuals() {
            let Some(nominal) = self.entities.nominal_of(individual) else {
                continue;
            };

            let mut types = IndividualTypes {
                direct_types: BTreeSet::new(),
                same_as: BTreeSet::new(),
            };
            if hierarchy.is_inconsistent() {
                types.direct_types.insert(ConceptId::BOTTOM);
                result.insert(individual, types);
                continue;
            }

            let mut candidates: BTreeSet<ConceptId> = BTreeSet::new();
            for subsumer in store.subsumers_of(nominal) {
                if let Some(other) = self.entities.individual_of(subsumer) {
                    if other != individual {
                        types.same_as.insert(other);
                    }
                } else if let Ok(rep) = hierarchy.representative(subsumer) {
                    candidates.insert(rep);
                }
            }
            candidates.remove(&ConceptId::TOP);

            // keep the most specific candidates
            for candidate in &candidates {
                let implied = candidates.iter().any(|other| {
                    other != candidate && hierarchy.is_subsumed_by(*other, *candidate).unwrap_or(false)
                });
                if !implied {
                    types.direct_types.insert(*candidate);
                }
            }
            if types.direct_types.is_empty() {
                types.direct_types.insert(ConceptId::TOP);
            }
            result.insert(individual, types);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saturation::seed_store;
    use mimizuku_core::{Axiom, ChainMode, Ontology};
    use mimizuku_rules::ChainSelector;

    fn process(ontology: &mut Ontology, mode: ChainMode) -> (FactStore, PostProcessed) {
        let config = ClassifierConfig::default().with_chain_mode(mode);
        let index = OntologyIndex::build(ontology, config.chain_mode);
        let chain = ChainSelector::select(&index);
        let mut store = FactStore::new(index.concept_bound());
        seed_store(&mut store, &index);
        Saturation::new(&index, &chain, &config).run(&mut store).unwrap();
        let processed = PostProcessor::new(&ontology.entities, &index, &chain, &config)
            .run(&mut store)
            .unwrap();
        (store, processed)
    }

    #[test]
    fn test_individual_direct_types() {
        let mut ontology = Ontology::new();
        let (a, b) = (ontology.concept("A"), ontology.concept("B"));
        let x = ontology.individual("x");
        ontology.extend([
            Axiom::SubClass { sub: a, sup: b },
            Axiom::ConceptAssertion { individual: x, concept: a },
        ]);
        let (_, processed) = process(&mut ontology, ChainMode::Auto);

        let types = &processed.individuals[&x];
        assert_eq!(types.direct_types, [a].into_iter().collect());
        assert!(types.same_as.is_empty());
        assert!(!processed.concepts.contains(ontology.entities.nominal_of(x).unwrap()));
    }

    #[test]
    fn test_nominal_closure_pulls_back_successor_types() {
        // A ⊑ ∃r.{y}, B ⊑ {y}... an element reached from x that is {y}
        // passes its subsumers on to {y}
        let mut ontology = Ontology::new();
        let (a, b, c) = (ontology.concept("A"), ontology.concept("B"), ontology.concept("C"));
        let r = ontology.role("r");
        let (x, y) = (ontology.individual("x"), ontology.individual("y"));
        let ny = ontology.entities.nominal_of(y).unwrap();
        ontology.extend([
            Axiom::ConceptAssertion { individual: x, concept: a },
            Axiom::SomeValuesSup { sub: a, role: r, filler: b },
            Axiom::SubClass { sub: b, sup: ny },
            Axiom::SubClass { sub: b, sup: c },
        ]);
        let (store, processed) = process(&mut ontology, ChainMode::Auto);

        assert!(store.is_subsumed(ny, c));
        assert!(processed.nominal_rounds >= 2);
        assert_eq!(processed.individuals[&y].direct_types, [b].into_iter().collect());
    }

    #[test]
    fn test_unsatisfiable_individual_makes_ontology_inconsistent() {
        let mut ontology = Ontology::new();
        let (a, b) = (ontology.concept("A"), ontology.concept("B"));
        let x = ontology.individual("x");
        ontology.extend([
            Axiom::Conjunction { left: a, right: b, sup: ConceptId::BOTTOM },
            Axiom::ConceptAssertion { individual: x, concept: a },
            Axiom::ConceptAssertion { individual: x, concept: b },
        ]);
        let (_, processed) = process(&mut ontology, ChainMode::Auto);

        assert!(processed.concepts.is_inconsistent());
        assert_eq!(
            processed.individuals[&x].direct_types,
            [ConceptId::BOTTOM].into_iter().collect()
        );
    }

    #[test]
    fn test_functional_role_merges_nominal_fillers() {
        let mut ontology = Ontology::new();
        let f = ontology.role("f");
        let (x, y, z) = (ontology.individual("x"), ontology.individual("y"), ontology.individual("z"));
        ontology.extend([
            Axiom::Functional(f),
            Axiom::RoleAssertion { role: f, subject: x, object: y },
            Axiom::RoleAssertion { role: f, subject: x, object: z },
        ]);
        let (_, processed) = process(&mut ontology, ChainMode::Auto);

        assert_eq!(processed.individuals[&y].same_as, [z].into_iter().collect());
        assert_eq!(processed.individuals[&z].same_as, [y].into_iter().collect());
    }

    #[test]
    fn test_role_hierarchy_keeps_inverses_of_named_roles() {
        let mut ontology = Ontology::new();
        let (r, s) = (ontology.role("r"), ontology.role("s"));
        ontology.add_axiom(Axiom::SubRole { sub: r, sup: s });
        let (_, processed) = process(&mut ontology, ChainMode::Extended);

        let inverse_r = ontology.entities.inverse_of(r).unwrap();
        let inverse_s = ontology.entities.inverse_of(s).unwrap();
        assert!(processed.roles.contains(inverse_r));
        assert_eq!(processed.roles.parents(r).unwrap(), vec![s]);
        assert_eq!(processed.roles.parents(inverse_r).unwrap(), vec![inverse_s]);
        assert_eq!(processed.roles.parents(s).unwrap(), vec![RoleId::TOP]);
    }
}
