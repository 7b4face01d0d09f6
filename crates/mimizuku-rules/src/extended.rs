//! 逆ロール・関数的ロールを扱う拡張規則
//!
//! 拡張ノード ⟨B, ψ⟩ は B ⊓ ⨅ψ を表す。ψ の充填子は常にレジストリ概念なので、
//! ノードの総数は有限に保たれる。

use crate::traits::{Inference, RoleRule, RuleContext, RuleResult, SubsumptionRule};
use mimizuku_core::{ConceptId, RoleId};
use mimizuku_store::{Existential, NodeKey, RoleFact, SubsumptionFact};

/// `x ⊑ a`, `a ⊑ ∃r.b` ⟹ `r(x, ⟨b, {∃r⁻.base(x)}⟩)`
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtendedExistentialIntroduction;

impl SubsumptionRule for ExtendedExistentialIntroduction {
    fn name(&self) -> &'static str {
        "existential-introduction-ext"
    }

    fn description(&self) -> &'static str {
        "Introduces role successors that remember their predecessor through the inverse role"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
        let existentials = ctx.index.existentials_of(fact.sup);
        if existentials.is_empty() {
            return Ok(false);
        }

        let source = ctx.facts.node(fact.sub)?;
        for (role, filler) in existentials {
            let inverse = ctx.index.inverse_of(*role);
            match inverse {
                Some(inverse) if !filler.is_bottom() && !ctx.index.is_nominal(*filler) => {
                    out.push(Inference::Successor {
                        role: *role,
                        source: fact.sub,
                        node: NodeKey::new(*filler, [Existential::new(inverse, source.base)]),
                    });
                }
                _ => out.push(Inference::role(*role, fact.sub, *filler)),
            }
        }
        Ok(true)
    }
}

/// `r({a}, {b})` ⟹ `r⁻({b}, {a})`
#[derive(Debug, Default, Clone, Copy)]
pub struct InverseRole;

impl RoleRule for InverseRole {
    fn name(&self) -> &'static str {
        "inverse-role"
    }

    fn description(&self) -> &'static str {
        "Mirrors role facts between individuals through the inverse role"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
        if !ctx.index.is_nominal(fact.first) || !ctx.index.is_nominal(fact.second) {
            return Ok(false);
        }
        match ctx.index.inverse_of(fact.role) {
            Some(inverse) => {
                out.push(Inference::role(inverse, fact.second, fact.first));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Whether a successor takes part in functional merging
fn mergeable(ctx: &RuleContext<'_>, successor: ConceptId) -> bool {
    !ctx.index.is_nominal(successor) && !ctx.facts.is_unsatisfiable(successor)
}

/// Successors implied by `role(source, first)` and `role(source, second)` for functional `role`.
///
/// Both successors denote the same element, so it belongs to the union of
/// their entries on either base and on every conjunction conclusion they
/// jointly satisfy.
fn merge_successors(
    ctx: &RuleContext<'_>,
    role: RoleId,
    source: ConceptId,
    first: ConceptId,
    second: ConceptId,
    out: &mut Vec<Inference>,
) -> RuleResult {
    let left = ctx.facts.node(first)?;
    let right = ctx.facts.node(second)?;

    for base in [left.base, right.base] {
        out.push(Inference::Successor {
            role,
            source,
            node: NodeKey::merged(base, &left, &right),
        });
    }
    for sub in ctx.facts.subsumers_of(first) {
        conclude_conjunctions(ctx, role, source, sub, second, &left, &right, out);
    }
    Ok(true)
}

#[allow(clippy::too_many_arguments)]
fn conclude_conjunctions(
    ctx: &RuleContext<'_>,
    role: RoleId,
    source: ConceptId,
    operand: ConceptId,
    other: ConceptId,
    left: &NodeKey,
    right: &NodeKey,
    out: &mut Vec<Inference>,
) {
    for (partner, sup) in ctx.index.conjunctions_with(operand) {
        if !ctx.facts.is_subsumed(other, *partner) {
            continue;
        }
        if sup.is_bottom() {
            out.push(Inference::role(role, source, ConceptId::BOTTOM));
        } else {
            out.push(Inference::Successor {
                role,
                source,
                node: NodeKey::merged(*sup, left, right),
            });
        }
    }
}

/// `f(x, y1)`, `f(x, y2)`, `f` functional ⟹ `y1` and `y2` are merged
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionalMerge;

impl RoleRule for FunctionalMerge {
    fn name(&self) -> &'static str {
        "functional-merge"
    }

    fn description(&self) -> &'static str {
        "Merges the successors of a functional role"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: RoleFact, out: &mut Vec<Inference>) -> RuleResult {
        if !ctx.index.is_functional(fact.role) || !mergeable(ctx, fact.second) {
            return Ok(false);
        }

        let mut fired = false;
        for other in ctx.facts.successors(fact.role, fact.first) {
            if other != fact.second && mergeable(ctx, other) {
                fired |= merge_successors(ctx, fact.role, fact.first, fact.second, other, out)?;
            }
        }
        Ok(fired)
    }
}

/// Re-checks conjunctions over merged functional successors when one gains a subsumer
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionalConjunction;

impl SubsumptionRule for FunctionalConjunction {
    fn name(&self) -> &'static str {
        "functional-conjunction"
    }

    fn description(&self) -> &'static str {
        "Applies conjunction axioms across successors of a functional role"
    }

    fn apply(&self, ctx: &RuleContext<'_>, fact: SubsumptionFact, out: &mut Vec<Inference>) -> RuleResult {
        if ctx.index.conjunctions_with(fact.sup).is_empty() || !mergeable(ctx, fact.sub) {
            return Ok(false);
        }

        let before = out.len();
        for role in ctx.facts.roles_into(fact.sub) {
            if !ctx.index.is_functional(role) {
                continue;
            }
            for source in ctx.facts.predecessors(role, fact.sub) {
                for other in ctx.facts.successors(role, source) {
                    if other == fact.sub || !mergeable(ctx, other) {
                        continue;
                    }
                    let left = ctx.facts.node(fact.sub)?;
                    let right = ctx.facts.node(other)?;
                    conclude_conjunctions(ctx, role, source, fact.sup, other, &left, &right, out);
                }
            }
        }
        Ok(out.len() > before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimizuku_core::{Axiom, ChainMode, Ontology, OntologyIndex};
    use mimizuku_store::FactStore;

    struct Fixture {
        index: OntologyIndex,
        store: FactStore,
        ontology: Ontology,
    }

    impl Fixture {
        fn new(build: impl FnOnce(&mut Ontology)) -> Self {
            let mut ontology = Ontology::new();
            build(&mut ontology);
            let index = OntologyIndex::build(&mut ontology, ChainMode::Extended);
            let store = FactStore::new(index.concept_bound());
            Self { index, store, ontology }
        }

        fn concept(&self, name: &str) -> ConceptId {
            self.ontology.entities.find_concept(name).unwrap()
        }

        fn role(&self, name: &str) -> RoleId {
            self.ontology.entities.find_role(name).unwrap()
        }

        fn ctx(&self) -> RuleContext<'_> {
            RuleContext::new(&self.index, &self.store)
        }
    }

    #[test]
    fn test_successor_node_records_inverse_entry() {
        let f = Fixture::new(|o| {
            let (a, b, r) = (o.concept("A"), o.concept("B"), o.role("r"));
            o.add_axiom(Axiom::SomeValuesSup { sub: a, role: r, filler: b });
        });
        let (a, b, r) = (f.concept("A"), f.concept("B"), f.role("r"));
        let inverse = f.index.inverse_of(r).unwrap();

        let mut out = Vec::new();
        assert!(ExtendedExistentialIntroduction
            .apply(&f.ctx(), SubsumptionFact::new(a, a), &mut out)
            .unwrap());
        assert_eq!(
            out,
            vec![Inference::Successor {
                role: r,
                source: a,
                node: NodeKey::new(b, [Existential::new(inverse, a)]),
            }]
        );
    }

    #[test]
    fn test_nominal_and_bottom_fillers_stay_plain() {
        let f = Fixture::new(|o| {
            let (a, r) = (o.concept("A"), o.role("r"));
            let john = o.individual("john");
            let nominal = o.entities.nominal_of(john).unwrap();
            o.add_axiom(Axiom::SomeValuesSup { sub: a, role: r, filler: nominal });
            o.add_axiom(Axiom::SomeValuesSup { sub: a, role: r, filler: ConceptId::BOTTOM });
        });
        let (a, r) = (f.concept("A"), f.role("r"));
        let nominal = f.concept("{john}");

        let mut out = Vec::new();
        ExtendedExistentialIntroduction
            .apply(&f.ctx(), SubsumptionFact::new(a, a), &mut out)
            .unwrap();
        assert_eq!(
            out,
            vec![Inference::role(r, a, nominal), Inference::role(r, a, ConceptId::BOTTOM)]
        );
    }

    #[test]
    fn test_inverse_role_between_individuals_only() {
        let f = Fixture::new(|o| {
            o.role("knows");
            o.concept("A");
            o.individual("alice");
            o.individual("bob");
        });
        let knows = f.role("knows");
        let inverse = f.index.inverse_of(knows).unwrap();
        let (alice, bob, a) = (f.concept("{alice}"), f.concept("{bob}"), f.concept("A"));

        let mut out = Vec::new();
        assert!(InverseRole.apply(&f.ctx(), RoleFact::new(knows, alice, bob), &mut out).unwrap());
        assert_eq!(out, vec![Inference::role(inverse, bob, alice)]);

        out.clear();
        assert!(!InverseRole.apply(&f.ctx(), RoleFact::new(knows, a, bob), &mut out).unwrap());
    }

    #[test]
    fn test_functional_merge_unions_entries_and_conjunctions() {
        let mut f = Fixture::new(|o| {
            let (b1, b2, d) = (o.concept("B1"), o.concept("B2"), o.concept("D"));
            o.concept("X");
            let func = o.role("f");
            o.role("p");
            o.add_axiom(Axiom::Functional(func));
            o.add_axiom(Axiom::Conjunction { left: b1, right: b2, sup: d });
        });
        let (b1, b2, d, x) = (f.concept("B1"), f.concept("B2"), f.concept("D"), f.concept("X"));
        let (func, p) = (f.role("f"), f.role("p"));

        let left_key = NodeKey::new(b1, [Existential::new(p, x)]);
        let (y1, _) = f.store.intern_node(left_key.clone());
        let y2 = b2;
        for (node, base) in [(y1, b1), (y2, b2)] {
            f.store.try_add_subsumption(SubsumptionFact::new(node, node));
            f.store.try_add_subsumption(SubsumptionFact::new(node, base));
        }
        f.store.try_add_role(RoleFact::new(func, x, y1));
        f.store.try_add_role(RoleFact::new(func, x, y2));

        let mut out = Vec::new();
        assert!(FunctionalMerge.apply(&f.ctx(), RoleFact::new(func, x, y2), &mut out).unwrap());

        let merged = |base| Inference::Successor { role: func, source: x, node: left_key.rebase(base) };
        assert!(out.contains(&merged(b1)));
        assert!(out.contains(&merged(b2)));
        assert!(out.contains(&merged(d)));
    }

    #[test]
    fn test_functional_merge_ignores_other_roles() {
        let mut f = Fixture::new(|o| {
            o.concept("A");
            o.concept("B");
            o.concept("X");
            o.role("f");
        });
        let (a, b, x, role) = (f.concept("A"), f.concept("B"), f.concept("X"), f.role("f"));
        f.store.try_add_role(RoleFact::new(role, x, a));
        f.store.try_add_role(RoleFact::new(role, x, b));

        let mut out = Vec::new();
        assert!(!FunctionalMerge.apply(&f.ctx(), RoleFact::new(role, x, b), &mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_functional_conjunction_from_new_subsumer() {
        let mut f = Fixture::new(|o| {
            let (b1, b2, d) = (o.concept("B1"), o.concept("B2"), o.concept("D"));
            o.concept("Y1");
            o.concept("Y2");
            o.concept("X");
            let role = o.role("f");
            o.add_axiom(Axiom::Functional(role));
            o.add_axiom(Axiom::Conjunction { left: b1, right: b2, sup: d });
        });
        let (b1, b2, d) = (f.concept("B1"), f.concept("B2"), f.concept("D"));
        let (y1, y2, x, role) = (f.concept("Y1"), f.concept("Y2"), f.concept("X"), f.role("f"));
        f.store.try_add_subsumption(SubsumptionFact::new(y2, b2));
        f.store.try_add_subsumption(SubsumptionFact::new(y1, b1));
        f.store.try_add_role(RoleFact::new(role, x, y1));
        f.store.try_add_role(RoleFact::new(role, x, y2));

        let mut out = Vec::new();
        assert!(FunctionalConjunction
            .apply(&f.ctx(), SubsumptionFact::new(y1, b1), &mut out)
            .unwrap());
        assert_eq!(
            out,
            vec![Inference::Successor { role, source: x, node: NodeKey::plain(d) }]
        );
    }
}
