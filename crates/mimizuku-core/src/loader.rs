//! 正規化済み公理の関数型構文ローダー

use crate::model::{Axiom, ConceptId, Ontology, RoleId};
use crate::OntologyError;
use logos::Logos;
use std::path::Path;

/// Tokens of the functional-style axiom syntax
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
enum Token<'a> {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"<[^>\s]*>", |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Iri(&'a str),

    #[regex(r"[A-Za-z_][A-Za-z0-9_:.\-/]*")]
    Name(&'a str),
}

/// Parsed statement tree; each node keeps the line of its leading token
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Atom(String, usize),
    Call(String, Vec<Expr>, usize),
}

impl Expr {
    fn atom(&self) -> Option<&str> {
        match self {
            Expr::Atom(name, _) => Some(name),
            Expr::Call(..) => None,
        }
    }

    fn line(&self) -> usize {
        match self {
            Expr::Atom(_, line) | Expr::Call(_, _, line) => *line,
        }
    }
}

/// Ontology loader trait
pub trait AxiomLoader {
    /// Parse `input` and append its axioms to `ontology`
    fn load_into(&self, ontology: &mut Ontology, input: &str) -> Result<usize, OntologyError>;

    fn load_str(&self, input: &str) -> Result<Ontology, OntologyError> {
        let mut ontology = Ontology::new();
        self.load_into(&mut ontology, input)?;
        Ok(ontology)
    }

    fn load_file(&self, path: &Path) -> Result<Ontology, OntologyError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| OntologyError::Io(format!("{}: {}", path.display(), e)))?;
        self.load_str(&input)
    }
}

/// Reader for `SubClassOf(A B)`-style statements over normalized shapes
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionalSyntaxLoader;

impl AxiomLoader for FunctionalSyntaxLoader {
    fn load_into(&self, ontology: &mut Ontology, input: &str) -> Result<usize, OntologyError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens: &tokens, pos: 0 };
        let before = ontology.axioms.len();

        while parser.peek().is_some() {
            let statement = parser.expr()?;
            interpret(ontology, &statement)?;
        }

        Ok(ontology.axioms.len() - before)
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token<'_>, usize)>, OntologyError> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += input[scanned..span.start].matches('\n').count();
        scanned = span.start;
        match result {
            Ok(token) => tokens.push((token, line)),
            Err(()) => {
                return Err(OntologyError::Parse {
                    line,
                    message: format!("unexpected input '{}'", lexer.slice()),
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'t, 'a> {
    tokens: &'t [(Token<'a>, usize)],
    pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<(Token<'a>, usize)> {
        self.tokens.get(self.pos).copied()
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|(_, line)| *line).unwrap_or(1)
    }

    fn expr(&mut self) -> Result<Expr, OntologyError> {
        let (token, line) = self.peek().ok_or_else(|| OntologyError::Parse {
            line: self.last_line(),
            message: "unexpected end of input".to_string(),
        })?;
        self.pos += 1;

        let name = match token {
            Token::Name(name) | Token::Iri(name) => name.to_string(),
            other => {
                return Err(OntologyError::Parse {
                    line,
                    message: format!("expected a name, found {:?}", other),
                })
            }
        };

        if !matches!(self.peek(), Some((Token::LParen, _))) {
            return Ok(Expr::Atom(name, line));
        }
        self.pos += 1;

        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some((Token::RParen, _)) => {
                    self.pos += 1;
                    return Ok(Expr::Call(name, args, line));
                }
                Some(_) => args.push(self.expr()?),
                None => {
                    return Err(OntologyError::Parse {
                        line,
                        message: format!("unclosed '(' after {}", name),
                    })
                }
            }
        }
    }
}

fn invalid(line: usize, message: impl Into<String>) -> OntologyError {
    OntologyError::InvalidAxiom { line, message: message.into() }
}

fn concept_of(ontology: &mut Ontology, expr: &Expr) -> Result<ConceptId, OntologyError> {
    expr.atom()
        .map(|name| ontology.concept(name))
        .ok_or_else(|| invalid(expr.line(), "expected a class name"))
}

fn role_of(ontology: &mut Ontology, expr: &Expr) -> Result<RoleId, OntologyError> {
    expr.atom()
        .map(|name| ontology.role(name))
        .ok_or_else(|| invalid(expr.line(), "expected an object property name"))
}

/// Operands of `ObjectIntersectionOf(..)` or a single class name
fn conjuncts(ontology: &mut Ontology, expr: &Expr) -> Result<Vec<ConceptId>, OntologyError> {
    match expr {
        Expr::Atom(name, _) => Ok(vec![ontology.concept(name)]),
        Expr::Call(head, args, _) if head == "ObjectIntersectionOf" && !args.is_empty() => {
            args.iter().map(|arg| concept_of(ontology, arg)).collect()
        }
        _ => Err(invalid(expr.line(), "expected a class name or an intersection of class names")),
    }
}

/// `(role, filler)` of `ObjectSomeValuesFrom(r A)`
fn some_values(ontology: &mut Ontology, expr: &Expr) -> Result<Option<(RoleId, ConceptId)>, OntologyError> {
    match expr {
        Expr::Call(head, args, line) if head == "ObjectSomeValuesFrom" => match args.as_slice() {
            [role, filler] => {
                let role = role_of(ontology, role)?;
                let filler = concept_of(ontology, filler)?;
                Ok(Some((role, filler)))
            }
            _ => Err(invalid(*line, "ObjectSomeValuesFrom takes a property and a class name")),
        },
        _ => Ok(None),
    }
}

/// Fold `A1 ⊓ ... ⊓ An ⊑ sup` into binary conjunctions over auxiliary concepts
fn push_conjunction(ontology: &mut Ontology, operands: &[ConceptId], sup: ConceptId) {
    match operands {
        [] => {}
        [only] => ontology.add_axiom(Axiom::SubClass { sub: *only, sup }),
        [left, right] => ontology.add_axiom(Axiom::Conjunction { left: *left, right: *right, sup }),
        [left, right, rest @ ..] => {
            let aux = ontology.entities.fresh_concept();
            ontology.add_axiom(Axiom::Conjunction { left: *left, right: *right, sup: aux });
            let mut remaining = vec![aux];
            remaining.extend_from_slice(rest);
            push_conjunction(ontology, &remaining, sup);
        }
    }
}

fn push_sub_class(ontology: &mut Ontology, sub: &Expr, sup: &Expr) -> Result<(), OntologyError> {
    if let Some((role, filler)) = some_values(ontology, sub)? {
        let sup = concept_of(ontology, sup)?;
        ontology.add_axiom(Axiom::SomeValuesSub { role, filler, sup });
        return Ok(());
    }

    let operands = conjuncts(ontology, sub)?;
    if let Some((role, filler)) = some_values(ontology, sup)? {
        let sub = match operands.as_slice() {
            [only] => *only,
            _ => {
                let aux = ontology.entities.fresh_concept();
                push_conjunction(ontology, &operands, aux);
                aux
            }
        };
        ontology.add_axiom(Axiom::SomeValuesSup { sub, role, filler });
        return Ok(());
    }

    let sups = conjuncts(ontology, sup)?;
    for sup in sups {
        push_conjunction(ontology, &operands, sup);
    }
    Ok(())
}

fn interpret(ontology: &mut Ontology, statement: &Expr) -> Result<(), OntologyError> {
    let line = statement.line();
    let (head, args) = match statement {
        Expr::Call(head, args, _) => (head.as_str(), args.as_slice()),
        Expr::Atom(name, _) => return Err(invalid(line, format!("dangling name '{}'", name))),
    };

    match (head, args) {
        ("Ontology", _) => {
            if let Some(iri) = args.first().and_then(Expr::atom) {
                ontology.iri = Some(iri.to_string());
            }
            for nested in args.iter().filter(|arg| matches!(arg, Expr::Call(..))) {
                interpret(ontology, nested)?;
            }
        }
        ("Declaration", [Expr::Call(kind, names, _)]) => {
            for name in names.iter().filter_map(Expr::atom) {
                match kind.as_str() {
                    "Class" => {
                        ontology.concept(name);
                    }
                    "ObjectProperty" => {
                        ontology.role(name);
                    }
                    "NamedIndividual" => {
                        ontology.individual(name);
                    }
                    other => return Err(invalid(line, format!("unsupported declaration {}", other))),
                }
            }
        }
        ("SubClassOf", [sub, sup]) => push_sub_class(ontology, sub, sup)?,
        ("EquivalentClasses", [first, rest @ ..]) if !rest.is_empty() => {
            for other in rest {
                push_sub_class(ontology, first, other)?;
                push_sub_class(ontology, other, first)?;
            }
        }
        ("DisjointClasses", operands) if operands.len() >= 2 => {
            let ids = operands
                .iter()
                .map(|operand| concept_of(ontology, operand))
                .collect::<Result<Vec<_>, _>>()?;
            for (i, left) in ids.iter().enumerate() {
                for right in &ids[i + 1..] {
                    ontology.add_axiom(Axiom::Conjunction { left: *left, right: *right, sup: ConceptId::BOTTOM });
                }
            }
        }
        ("SubObjectPropertyOf", [Expr::Call(chain, roles, _), sup]) if chain == "ObjectPropertyChain" => {
            let roles = roles
                .iter()
                .map(|role| role_of(ontology, role))
                .collect::<Result<Vec<_>, _>>()?;
            let sup = role_of(ontology, sup)?;
            match roles.as_slice() {
                [] => return Err(invalid(line, "empty property chain")),
                [only] => ontology.add_axiom(Axiom::SubRole { sub: *only, sup }),
                [first, middle @ .., last] => {
                    let mut head = *first;
                    for next in middle {
                        let aux = ontology.entities.fresh_role();
                        ontology.add_axiom(Axiom::RoleChain { first: head, second: *next, sup: aux });
                        head = aux;
                    }
                    ontology.add_axiom(Axiom::RoleChain { first: head, second: *last, sup });
                }
            }
        }
        ("SubObjectPropertyOf", [sub, sup]) => {
            let sub = role_of(ontology, sub)?;
            let sup = role_of(ontology, sup)?;
            ontology.add_axiom(Axiom::SubRole { sub, sup });
        }
        ("EquivalentObjectProperties", [first, second]) => {
            let first = role_of(ontology, first)?;
            let second = role_of(ontology, second)?;
            ontology.add_axiom(Axiom::SubRole { sub: first, sup: second });
            ontology.add_axiom(Axiom::SubRole { sub: second, sup: first });
        }
        ("TransitiveObjectProperty", [role]) => {
            let role = role_of(ontology, role)?;
            ontology.add_axiom(Axiom::Transitive(role));
        }
        ("FunctionalObjectProperty", [role]) => {
            let role = role_of(ontology, role)?;
            ontology.add_axiom(Axiom::Functional(role));
        }
        ("InverseObjectProperties", [first, second]) => {
            let first = role_of(ontology, first)?;
            let second = role_of(ontology, second)?;
            ontology.add_axiom(Axiom::InverseRoles(first, second));
        }
        ("ClassAssertion", [concept, individual]) => {
            let concept = concept_of(ontology, concept)?;
            let individual = individual
                .atom()
                .map(|name| ontology.individual(name))
                .ok_or_else(|| invalid(line, "expected an individual name"))?;
            ontology.add_axiom(Axiom::ConceptAssertion { individual, concept });
        }
        ("ObjectPropertyAssertion", [role, subject, object]) => {
            let role = role_of(ontology, role)?;
            let (subject, object) = match (subject.atom(), object.atom()) {
                (Some(s), Some(o)) => (ontology.individual(s), ontology.individual(o)),
                _ => return Err(invalid(line, "expected two individual names")),
            };
            ontology.add_axiom(Axiom::RoleAssertion { role, subject, object });
        }
        (other, _) => return Err(invalid(line, format!("unsupported statement {}", other))),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OWL_NOTHING;

    fn load(input: &str) -> Ontology {
        FunctionalSyntaxLoader.load_str(input).unwrap()
    }

    #[test]
    fn test_load_empty_input() {
        let ontology = load("# nothing here\n");
        assert!(ontology.axioms.is_empty());
        assert_eq!(ontology.entities.concept_bound(), 2);
    }

    #[test]
    fn test_load_normal_forms() {
        let ontology = load(
            "SubClassOf(A B)\n\
             SubClassOf(ObjectIntersectionOf(A B) C)\n\
             SubClassOf(ObjectSomeValuesFrom(r A) B)\n\
             SubClassOf(A ObjectSomeValuesFrom(r B))\n",
        );
        let a = ontology.entities.find_concept("A").unwrap();
        let b = ontology.entities.find_concept("B").unwrap();
        let c = ontology.entities.find_concept("C").unwrap();
        let r = ontology.entities.find_role("r").unwrap();

        assert_eq!(
            ontology.axioms,
            vec![
                Axiom::SubClass { sub: a, sup: b },
                Axiom::Conjunction { left: a, right: b, sup: c },
                Axiom::SomeValuesSub { role: r, filler: a, sup: b },
                Axiom::SomeValuesSup { sub: a, role: r, filler: b },
            ]
        );
    }

    #[test]
    fn test_load_role_axioms() {
        let ontology = load(
            "SubObjectPropertyOf(r s)\n\
             SubObjectPropertyOf(ObjectPropertyChain(r s) t)\n\
             TransitiveObjectProperty(t)\n\
             FunctionalObjectProperty(s)\n\
             InverseObjectProperties(r rInv)\n",
        );
        let r = ontology.entities.find_role("r").unwrap();
        let s = ontology.entities.find_role("s").unwrap();
        let t = ontology.entities.find_role("t").unwrap();
        let r_inv = ontology.entities.find_role("rInv").unwrap();

        assert_eq!(
            ontology.axioms,
            vec![
                Axiom::SubRole { sub: r, sup: s },
                Axiom::RoleChain { first: r, second: s, sup: t },
                Axiom::Transitive(t),
                Axiom::Functional(s),
                Axiom::InverseRoles(r, r_inv),
            ]
        );
    }

    #[test]
    fn test_long_chain_uses_auxiliary_roles() {
        let ontology = load("SubObjectPropertyOf(ObjectPropertyChain(a b c) d)");
        assert_eq!(ontology.axioms.len(), 2);
        match ontology.axioms[0] {
            Axiom::RoleChain { sup, .. } => assert!(ontology.entities.is_auxiliary_role(sup)),
            ref other => panic!("Expected RoleChain, got {:?}", other),
        }
    }

    #[test]
    fn test_load_assertions() {
        let ontology = load(
            "ClassAssertion(Person john)\n\
             ObjectPropertyAssertion(knows john mary)\n",
        );
        let john = ontology.entities.find_individual("john").unwrap();
        let mary = ontology.entities.find_individual("mary").unwrap();
        let person = ontology.entities.find_concept("Person").unwrap();
        let knows = ontology.entities.find_role("knows").unwrap();

        assert_eq!(ontology.entities.individual_count(), 2);
        assert_eq!(
            ontology.axioms,
            vec![
                Axiom::ConceptAssertion { individual: john, concept: person },
                Axiom::RoleAssertion { role: knows, subject: john, object: mary },
            ]
        );
    }

    #[test]
    fn test_equivalent_and_disjoint_classes() {
        let ontology = load(
            "EquivalentClasses(Parent ObjectIntersectionOf(Person HasChild))\n\
             DisjointClasses(Cat owl:Nothing)\n",
        );
        let parent = ontology.entities.find_concept("Parent").unwrap();
        let person = ontology.entities.find_concept("Person").unwrap();
        let has_child = ontology.entities.find_concept("HasChild").unwrap();
        let cat = ontology.entities.find_concept("Cat").unwrap();

        assert!(ontology.axioms.contains(&Axiom::SubClass { sub: parent, sup: person }));
        assert!(ontology.axioms.contains(&Axiom::SubClass { sub: parent, sup: has_child }));
        assert!(ontology.axioms.contains(&Axiom::Conjunction { left: person, right: has_child, sup: parent }));
        assert!(ontology.axioms.contains(&Axiom::Conjunction { left: cat, right: ConceptId::BOTTOM, sup: ConceptId::BOTTOM }));
        assert_eq!(ontology.entities.find_concept(OWL_NOTHING), Some(ConceptId::BOTTOM));
    }

    #[test]
    fn test_declarations_and_iris() {
        let ontology = load(
            "Declaration(Class(<http://example.org/Person>))\n\
             Declaration(ObjectProperty(knows))\n\
             Declaration(NamedIndividual(john))\n",
        );
        assert!(ontology.axioms.is_empty());
        assert!(ontology.entities.find_concept("http://example.org/Person").is_some());
        assert!(ontology.entities.find_role("knows").is_some());
        assert!(ontology.entities.find_individual("john").is_some());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = FunctionalSyntaxLoader.load_str("SubClassOf(A B)\nSubClassOf(A B\n").unwrap_err();
        match err {
            OntologyError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_shape_is_rejected() {
        let err = FunctionalSyntaxLoader
            .load_str("SubClassOf(ObjectSomeValuesFrom(r A) ObjectSomeValuesFrom(s B))")
            .unwrap_err();
        assert!(matches!(err, OntologyError::InvalidAxiom { line: 1, .. }));
    }

    #[test]
    fn test_load_into_is_incremental() {
        let mut ontology = load("SubClassOf(A B)");
        let added = FunctionalSyntaxLoader.load_into(&mut ontology, "SubClassOf(B C)").unwrap();
        assert_eq!(added, 1);
        assert_eq!(ontology.axioms.len(), 2);
    }
}
