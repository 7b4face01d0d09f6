//! # Mimizuku Rules
//!
//! EL 完備化規則と規則チェーン
//! 新しく確定した事実一つと静的インデックスから、含意される事実を導出する

pub mod chain;
pub mod extended;
pub mod role;
pub mod selector;
pub mod subsumption;
pub mod traits;

pub use chain::{ChainStatistics, RuleChain, RuleStatistics};
pub use selector::ChainSelector;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::*;
    use mimizuku_core::{ChainMode, ConceptId, Ontology, OntologyIndex};
    use mimizuku_store::{FactStore, RoleFact, SubsumptionFact};

    // Mock implementations for testing
    struct MockRule {
        name: &'static str,
        fires: bool,
    }

    impl SubsumptionRule for MockRule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "Mock subsumption rule"
        }

        fn apply(&self, _ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
            if self.fires {
                out.push(Inference::Subsumption(fact));
            }
            Ok(self.fires)
        }
    }

    impl RoleRule for MockRule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "Mock role rule"
        }

        fn apply(&self, _ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
            if self.fires {
                out.push(Inference::Role(fact));
            }
            Ok(self.fires)
        }
    }

    fn empty_index() -> OntologyIndex {
        OntologyIndex::build(&mut Ontology::new(), ChainMode::Auto)
    }

    #[test]
    fn test_chain_runs_every_rule_without_short_circuit() {
        let chain = RuleChain::new()
            .with_subsumption_rule(Box::new(MockRule { name: "first", fires: true }))
            .with_subsumption_rule(Box::new(MockRule { name: "silent", fires: false }))
            .with_subsumption_rule(Box::new(MockRule { name: "last", fires: true }));
        let index = empty_index();
        let store = FactStore::new(index.concept_bound());
        let ctx = RuleContext::new(&index, &store);

        let mut out = Vec::new();
        let fact = SubsumptionFact::new(ConceptId::TOP, ConceptId::TOP);
        assert!(chain.apply_subsumption(&ctx, fact, &mut out).unwrap());
        assert_eq!(out.len(), 2);

        let stats = chain.statistics();
        assert_eq!(stats.subsumption_invocations, 1);
        let firings: Vec<u64> = stats.rules.iter().map(|rule| rule.firings).collect();
        assert_eq!(firings, vec![1, 0, 1]);
    }

    #[test]
    fn test_chain_reports_nothing_fired() {
        let chain = RuleChain::new().with_role_rule(Box::new(MockRule { name: "silent", fires: false }));
        let index = empty_index();
        let store = FactStore::new(index.concept_bound());
        let ctx = RuleContext::new(&index, &store);

        let mut out = Vec::new();
        let fact = RoleFact::new(mimizuku_core::RoleId(0), ConceptId::TOP, ConceptId::TOP);
        assert!(!chain.apply_role(&ctx, fact, &mut out).unwrap());
        assert!(out.is_empty());
        assert_eq!(chain.invocations(), 1);
        assert_eq!(chain.role_rule_names(), vec!["silent"]);
    }
}
