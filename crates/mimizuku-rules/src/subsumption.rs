//! 包摂事実をトリガーとする完備化規則

use crate::traits::{Inference, RuleContext, RuleResult, SubsumptionRule};
use mimizuku_core::ConceptId;
use mimizuku_store::{Existential, NodeKey, SubsumptionFact};

/// `x ⊑ a`, `a ⊑ b` ⟹ `x ⊑ b`
#[derive(Debug, Default, Clone, Copy)]
pub struct SubsumerPropagation;

impl SubsumptionRule for SubsumerPropagation {
    fn name(&self) -> &'static str {
        "subsumer-propagation"
    }

    fn description(&self) -> &'static str {
        "Propagates told atomic inclusions"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
        let before = out.len();
        for sup in ctx.index.told_subsumers(fact.sup) {
            out.push(Inference::subsumption(fact.sub, *sup));
        }
        Ok(out.len() > before)
    }
}

/// `x ⊑ a1`, `x ⊑ a2`, `a1 ⊓ a2 ⊑ b` ⟹ `x ⊑ b`
#[derive(Debug, Default, Clone, Copy)]
pub struct ConjunctionClosure;

impl SubsumptionRule for ConjunctionClosure {
    fn name(&self) -> &'static str {
        "conjunction-closure"
    }

    fn description(&self) -> &'static str {
        "Fires binary conjunction axioms once both operands hold"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
        let before = out.len();
        for (partner, sup) in ctx.index.conjunctions_with(fact.sup) {
            if ctx.facts.is_subsumed(fact.sub, *partner) {
                out.push(Inference::subsumption(fact.sub, *sup));
            }
        }
        Ok(out.len() > before)
    }
}

/// `x ⊑ a`, `a ⊑ ∃r.b` ⟹ `r(x, ⟨b, {∃witness(r).⊤}⟩)`
///
/// The witness role occurs in no axiom, so the node is equivalent to `b`
/// and is created once per `(r, b)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExistentialIntroduction;

impl SubsumptionRule for ExistentialIntroduction {
    fn name(&self) -> &'static str {
        "existential-introduction"
    }

    fn description(&self) -> &'static str {
        "Introduces role successors for A ⊑ ∃r.B"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
        let before = out.len();
        for (role, filler) in ctx.index.existentials_of(fact.sup) {
            // one shared node per (r, B); ⊥ and nominal fillers stay direct
            match ctx.index.witness_of(*role) {
                Some(witness) if !filler.is_bottom() && !ctx.index.is_nominal(*filler) => {
                    out.push(Inference::Successor {
                        role: *role,
                        source: fact.sub,
                        node: NodeKey::new(*filler, [Existential::new(witness, ConceptId::TOP)]),
                    });
                }
                _ => out.push(Inference::role(*role, fact.sub, *filler)),
            }
        }
        Ok(out.len() > before)
    }
}

/// `r(x, y)`, `y ⊑ a`, `∃r.a ⊑ b` ⟹ `x ⊑ b`, fired from the new `y ⊑ a`
#[derive(Debug, Default, Clone, Copy)]
pub struct ExistentialEliminationBySubsumer;

impl SubsumptionRule for ExistentialEliminationBySubsumer {
    fn name(&self) -> &'static str {
        "existential-elimination-s"
    }

    fn description(&self) -> &'static str {
        "Applies ∃r.A ⊑ B to predecessors when a successor becomes an A"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
        let before = out.len();
        for (role, sup) in ctx.index.some_values_by_filler(fact.sup) {
            for predecessor in ctx.facts.predecessors(*role, fact.sub) {
                out.push(Inference::subsumption(predecessor, *sup));
            }
        }
        Ok(out.len() > before)
    }
}

/// `y ⊑ ⊥`, `r(x, y)` ⟹ `x ⊑ ⊥`
#[derive(Debug, Default, Clone, Copy)]
pub struct BottomBySubsumer;

impl SubsumptionRule for BottomBySubsumer {
    fn name(&self) -> &'static str {
        "bottom-propagation-s"
    }

    fn description(&self) -> &'static str {
        "Marks predecessors of an unsatisfiable concept unsatisfiable"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
        if !fact.sup.is_bottom() {
            return Ok(false);
        }

        let before = out.len();
        for role in ctx.facts.roles_into(fact.sub) {
            for predecessor in ctx.facts.predecessors(role, fact.sub) {
                out.push(Inference::subsumption(predecessor, ConceptId::BOTTOM));
            }
        }
        Ok(out.len() > before)
    }
}
