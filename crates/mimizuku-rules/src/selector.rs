//! Chain selection from the expressivity profile

use crate::chain::RuleChain;
use crate::extended::{ExtendedExistentialIntroduction, FunctionalConjunction, FunctionalMerge, InverseRole};
use crate::role::{
    BottomByRole, ChainPropagation, ExistentialEliminationByRole, RoleHierarchyPropagation,
    TransitivityPropagation,
};
use crate::subsumption::{
    BottomBySubsumer, ConjunctionClosure, ExistentialEliminationBySubsumer, ExistentialIntroduction,
    SubsumerPropagation,
};
use mimizuku_core::OntologyIndex;
use tracing::info;

/// Builds the rule chain for an indexed ontology, once per run
#[derive(Debug, Default, Clone, Copy)]
pub struct ChainSelector;

impl ChainSelector {
    pub fn select(index: &OntologyIndex) -> RuleChain {
        let profile = index.profile();
        let extended = index.is_extended();

        let mut chain = RuleChain::new()
            .with_subsumption_rule(Box::new(SubsumerPropagation))
            .with_subsumption_rule(Box::new(ConjunctionClosure));
        chain = if extended {
            chain.with_subsumption_rule(Box::new(ExtendedExistentialIntroduction))
        } else {
            chain.with_subsumption_rule(Box::new(ExistentialIntroduction))
        };
        chain = chain
            .with_subsumption_rule(Box::new(ExistentialEliminationBySubsumer))
            .with_role_rule(Box::new(RoleHierarchyPropagation))
            .with_role_rule(Box::new(ExistentialEliminationByRole));

        if profile.has_bottom {
            chain = chain
                .with_subsumption_rule(Box::new(BottomBySubsumer))
                .with_role_rule(Box::new(BottomByRole));
        }

        if profile.has_role_chains {
            chain = chain.with_role_rule(Box::new(ChainPropagation));
        } else if profile.has_transitive_roles {
            chain = chain.with_role_rule(Box::new(TransitivityPropagation));
        }

        if extended {
            if profile.has_nominals {
                chain = chain.with_role_rule(Box::new(InverseRole));
            }
            if profile.has_functional_roles {
                chain = chain
                    .with_subsumption_rule(Box::new(FunctionalConjunction))
                    .with_role_rule(Box::new(FunctionalMerge));
            }
        }

        info!(
            extended,
            s_rules = ?chain.subsumption_rule_names(),
            r_rules = ?chain.role_rule_names(),
            "rule chain selected"
        );
        chain
    }
}
