//! ロール事実をトリガーとする完備化規則

use crate::traits::{Inference, RoleRule, RuleContext, RuleResult};
use mimizuku_core::{ConceptId, RoleId};
use mimizuku_store::RoleFact;

/// `r(x, y)`, `r ⊑ s` ⟹ `s(x, y)`
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleHierarchyPropagation;

impl RoleRule for RoleHierarchyPropagation {
    fn name(&self) -> &'static str {
        "role-hierarchy-propagation"
    }

    fn description(&self) -> &'static str {
        "Copies role facts to every super role"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
        let before = out.len();
        for sup in ctx.index.super_roles(fact.role) {
            if *sup != RoleId::TOP {
                out.push(Inference::role(*sup, fact.first, fact.second));
            }
        }
        Ok(out.len() > before)
    }
}

/// `r(x, y)`, `y ⊑ a`, `∃r.a ⊑ b` ⟹ `x ⊑ b`, fired from the new role fact
#[derive(Debug, Default, Clone, Copy)]
pub struct ExistentialEliminationByRole;

impl RoleRule for ExistentialEliminationByRole {
    fn name(&self) -> &'static str {
        "existential-elimination-r"
    }

    fn description(&self) -> &'static str {
        "Applies ∃r.A ⊑ B when a new r-successor is already an A"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
        let before = out.len();
        for (filler, sup) in ctx.index.some_values_by_role(fact.role) {
            if ctx.facts.is_subsumed(fact.second, *filler) {
                out.push(Inference::subsumption(fact.first, *sup));
            }
        }
        Ok(out.len() > before)
    }
}

/// `r(x, y)`, `y ⊑ ⊥` ⟹ `x ⊑ ⊥`
#[derive(Debug, Default, Clone, Copy)]
pub struct BottomByRole;

impl RoleRule for BottomByRole {
    fn name(&self) -> &'static str {
        "bottom-propagation-r"
    }

    fn description(&self) -> &'static str {
        "Marks the source of a role fact into an unsatisfiable concept unsatisfiable"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
        if fact.second.is_bottom() || ctx.facts.is_unsatisfiable(fact.second) {
            out.push(Inference::subsumption(fact.first, ConceptId::BOTTOM));
            return Ok(true);
        }
        Ok(false)
    }
}

/// `r(x, y)`, `s(y, z)`, `r ∘ s ⊑ t` ⟹ `t(x, z)`, matched on either side
#[derive(Debug, Default, Clone, Copy)]
pub struct ChainPropagation;

impl RoleRule for ChainPropagation {
    fn name(&self) -> &'static str {
        "chain-propagation"
    }

    fn description(&self) -> &'static str {
        "Composes role facts along role chain axioms"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
        let before = out.len();
        for (second, sup) in ctx.index.chains_by_first(fact.role) {
            for target in ctx.facts.successors(*second, fact.second) {
                out.push(Inference::role(*sup, fact.first, target));
            }
        }
        for (first, sup) in ctx.index.chains_by_second(fact.role) {
            for source in ctx.facts.predecessors(*first, fact.first) {
                out.push(Inference::role(*sup, source, fact.second));
            }
        }
        Ok(out.len() > before)
    }
}

/// `r(x, y)`, `r(y, z)`, `r` transitive ⟹ `r(x, z)`
#[derive(Debug, Default, Clone, Copy)]
pub struct TransitivityPropagation;

impl RoleRule for TransitivityPropagation {
    fn name(&self) -> &'static str {
        "transitivity-propagation"
    }

    fn description(&self) -> &'static str {
        "Closes transitive roles"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
        if !ctx.index.is_transitive(fact.role) {
            return Ok(false);
        }

        let before = out.len();
        for target in ctx.facts.successors(fact.role, fact.second) {
            out.push(Inference::role(fact.role, fact.first, target));
        }
        for source in ctx.facts.predecessors(fact.role, fact.first) {
            out.push(Inference::role(fact.role, source, fact.second));
        }
        Ok(out.len() > before)
    }
}
