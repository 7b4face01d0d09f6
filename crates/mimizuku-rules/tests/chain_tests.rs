//! Tests for the mimizuku-rules crate

use mimizuku_core::{Axiom, ChainMode, ConceptId, Ontology, OntologyIndex};
use mimizuku_rules::*;
use mimizuku_store::{FactStore, FactView, RoleFact, SubsumptionFact};
use proptest::prelude::*;

/// Minimal work-list loop over subsumption and role facts
fn saturate(index: &OntologyIndex, chain: &RuleChain) -> FactStore {
    let mut store = FactStore::new(index.concept_bound());
    store.seed(index.concepts());

    loop {
        let mut out = Vec::new();
        if let Some(fact) = store.pop_subsumption() {
            if store.try_add_subsumption(fact) {
                chain.apply_subsumption(&RuleContext::new(index, &store), fact, &mut out).unwrap();
            }
        } else if let Some(fact) = store.pop_role() {
            if store.try_add_role(fact) {
                chain.apply_role(&RuleContext::new(index, &store), fact, &mut out).unwrap();
            }
        } else {
            break;
        }

        for inference in out {
            match inference {
                Inference::Subsumption(fact) => {
                    store.enqueue_subsumption(fact);
                }
                Inference::Role(fact) => {
                    store.enqueue_role(fact);
                }
                Inference::Successor { role, source, node } => {
                    let (id, created) = store.intern_node(node.clone());
                    if created {
                        for sup in [id, ConceptId::TOP, node.base] {
                            store.enqueue_subsumption(SubsumptionFact::new(id, sup));
                        }
                        for entry in &node.existentials {
                            store.enqueue_role(RoleFact::new(entry.role, id, entry.filler));
                        }
                    }
                    store.enqueue_role(RoleFact::new(role, source, id));
                }
            }
        }
    }
    store
}

#[test]
fn test_existential_round_trip() {
    let mut ontology = Ontology::new();
    let (a, b, c) = (ontology.concept("A"), ontology.concept("B"), ontology.concept("C"));
    let r = ontology.role("r");
    ontology.extend([
        Axiom::SomeValuesSup { sub: a, role: r, filler: b },
        Axiom::SomeValuesSub { role: r, filler: b, sup: c },
    ]);
    let index = OntologyIndex::build(&mut ontology, ChainMode::Auto);
    let chain = ChainSelector::select(&index);
    let store = saturate(&index, &chain);

    assert!(store.is_subsumed(a, c));
    assert!(store.is_subsumed(a, ConceptId::TOP));
    assert!(!store.is_subsumed(b, c));
    assert_eq!(store.nodes().len(), 1);
    let (node, key) = store.nodes().iter().next().unwrap();
    assert_eq!(key.base, b);
    assert!(store.is_subsumed(node, b));
    assert!(!store.is_subsumed(node, c));
}

#[test]
fn test_idempotent_re_add_does_not_fire() {
    let mut ontology = Ontology::new();
    let (a, b) = (ontology.concept("A"), ontology.concept("B"));
    ontology.add_axiom(Axiom::SubClass { sub: a, sup: b });
    let index = OntologyIndex::build(&mut ontology, ChainMode::Auto);
    let chain = ChainSelector::select(&index);
    let mut store = saturate(&index, &chain);
    let invocations = chain.invocations();

    assert!(!store.try_add_subsumption(SubsumptionFact::new(a, b)));
    store.seed(index.concepts());
    while let Some(fact) = store.pop_subsumption() {
        assert!(!store.try_add_subsumption(fact));
    }
    assert_eq!(chain.invocations(), invocations);
}

proptest! {
    #[test]
    fn prop_told_chains_close_transitively(edges in prop::collection::vec((0usize..8, 0usize..8), 0..20)) {
        let mut ontology = Ontology::new();
        let ids: Vec<ConceptId> = (0..8).map(|i| ontology.concept(&format!("C{}", i))).collect();
        for (sub, sup) in &edges {
            ontology.add_axiom(Axiom::SubClass { sub: ids[*sub], sup: ids[*sup] });
        }
        let index = OntologyIndex::build(&mut ontology, ChainMode::Auto);
        let chain = ChainSelector::select(&index);
        let store = saturate(&index, &chain);

        // Reference: reachability over told edges
        for start in 0..8 {
            let mut reachable = vec![false; 8];
            let mut stack = vec![start];
            while let Some(next) = stack.pop() {
                if reachable[next] {
                    continue;
                }
                reachable[next] = true;
                stack.extend(edges.iter().filter(|(s, _)| *s == next).map(|(_, t)| *t));
            }
            for end in 0..8 {
                prop_assert_eq!(store.is_subsumed(ids[start], ids[end]), reachable[end]);
            }
        }
    }
}
