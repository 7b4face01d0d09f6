//! Name-based rendering of classification results and fact dumps

use crate::classification::{Classification, ClassificationStats};
use mimizuku_core::{ConceptId, EntityRegistry, Ontology, RoleId};
use mimizuku_store::FactStore;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    pub equivalents: Vec<String>,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualEntry {
    pub name: String,
    pub types: Vec<String>,
    pub same_as: Vec<String>,
}

/// Taxonomy with names in place of ids, one entry per equivalence class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyReport {
    pub ontology: Option<String>,
    pub consistent: bool,
    pub classes: Vec<ClassEntry>,
    pub properties: Vec<ClassEntry>,
    pub individuals: Vec<IndividualEntry>,
    pub stats: ClassificationStats,
}

fn concept_name(entities: &EntityRegistry, id: ConceptId) -> String {
    entities.concept_name(id).map(str::to_string).unwrap_or_else(|| id.to_string())
}

fn role_name(entities: &EntityRegistry, id: RoleId) -> String {
    entities.role_name(id).map(str::to_string).unwrap_or_else(|| id.to_string())
}

impl TaxonomyReport {
    pub fn new(ontology: &Ontology, classification: &Classification) -> Self {
        let entities = &ontology.entities;

        let classes = classification
            .concepts
            .classes()
            .map(|(rep, members)| ClassEntry {
                name: concept_name(entities, rep),
                equivalents: members
                    .iter()
                    .filter(|member| **member != rep)
                    .map(|member| concept_name(entities, *member))
                    .collect(),
                parents: classification
                    .concepts
                    .parents(rep)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|parent| concept_name(entities, parent))
                    .collect(),
            })
            .collect();

        let properties = classification
            .roles
            .classes()
            .map(|(rep, members)| ClassEntry {
                name: role_name(entities, rep),
                equivalents: members
                    .iter()
                    .filter(|member| **member != rep)
                    .map(|member| role_name(entities, *member))
                    .collect(),
                parents: classification
                    .roles
                    .parents(rep)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|parent| role_name(entities, parent))
                    .collect(),
            })
            .collect();

        let individuals = classification
            .individuals
            .iter()
            .map(|(id, types)| IndividualEntry {
                name: entities.individual_name(*id).map(str::to_string).unwrap_or_else(|| id.to_string()),
                types: types.direct_types.iter().map(|c| concept_name(entities, *c)).collect(),
                same_as: types
                    .same_as
                    .iter()
                    .filter_map(|other| entities.individual_name(*other))
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        Self {
            ontology: ontology.iri.clone(),
            consistent: !classification.inconsistent,
            classes,
            properties,
            individuals,
            stats: classification.stats.clone(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

fn write_entry(f: &mut fmt::Formatter<'_>, entry: &ClassEntry) -> fmt::Result {
    write!(f, "  {}", entry.name)?;
    if !entry.equivalents.is_empty() {
        write!(f, " ≡ {}", entry.equivalents.join(" ≡ "))?;
    }
    if !entry.parents.is_empty() {
        write!(f, " ⊑ {}", entry.parents.join(", "))?;
    }
    writeln!(f)
}

impl fmt::Display for TaxonomyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(iri) = &self.ontology {
            writeln!(f, "Ontology: {}", iri)?;
        }
        if !self.consistent {
            writeln!(f, "INCONSISTENT: every class is equivalent to owl:Nothing")?;
        }

        writeln!(f, "Classes:")?;
        for entry in &self.classes {
            write_entry(f, entry)?;
        }
        writeln!(f, "Object properties:")?;
        for entry in &self.properties {
            write_entry(f, entry)?;
        }
        if !self.individuals.is_empty() {
            writeln!(f, "Individuals:")?;
            for entry in &self.individuals {
                write!(f, "  {} : {}", entry.name, entry.types.join(", "))?;
                if !entry.same_as.is_empty() {
                    write!(f, " (same as {})", entry.same_as.join(", "))?;
                }
                writeln!(f)?;
            }
        }
        writeln!(
            f,
            "Saturation: {} facts processed, {} subsumptions, {} role facts, {} nodes, {} ms",
            self.stats.saturation.processed + self.stats.closure.processed,
            self.stats.store.subsumptions,
            self.stats.store.roles,
            self.stats.store.nodes,
            self.stats.elapsed_ms
        )
    }
}

/// Name of a concept or synthetic node id
/// Nodes are rendered by content, so dumps do not depend on allocation order
fn fact_term(entities: &EntityRegistry, store: &FactStore, id: ConceptId) -> String {
    let Some(node) = store.nodes().get(id) else {
        return concept_name(entities, id);
    };
    let entries: Vec<String> = node
        .existentials
        .iter()
        .map(|entry| format!("∃{}.{}", role_name(entities, entry.role), concept_name(entities, entry.filler)))
        .collect();
    format!("⟨{}, {{{}}}⟩", concept_name(entities, node.base), entries.join(", "))
}

fn sorted_lines(mut lines: Vec<String>) -> String {
    lines.sort();
    let mut out = String::new();
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
    out
}

/// One `sub<TAB>sup` line per derived subsumption, sorted
pub fn dump_subsumptions(entities: &EntityRegistry, store: &FactStore) -> String {
    let lines = store
        .subsumptions()
        .iter()
        .map(|fact| format!("{}\t{}", fact_term(entities, store, fact.sub), fact_term(entities, store, fact.sup)))
        .collect();
    sorted_lines(lines)
}

/// One `first role second .` triple per derived role fact, sorted
pub fn dump_roles(entities: &EntityRegistry, store: &FactStore) -> String {
    let lines = store
        .roles()
        .iter()
        .map(|fact| {
            format!(
                "{} {} {} .",
                fact_term(entities, store, fact.first),
                role_name(entities, fact.role),
                fact_term(entities, store, fact.second)
            )
        })
        .collect();
    sorted_lines(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::config::ClassifierConfig;

    fn classified(input: &str) -> Classifier {
        let mut classifier = Classifier::from_functional_syntax(input, ClassifierConfig::default()).unwrap();
        classifier.classify().unwrap();
        classifier
    }

    #[test]
    fn test_report_lists_classes_by_name() {
        let classifier = classified("SubClassOf(A B)\nEquivalentClasses(B C)\nSubObjectPropertyOf(r s)\n");
        let report = classifier.report().unwrap();

        assert!(report.consistent);
        let a = report.classes.iter().find(|entry| entry.name == "A").unwrap();
        assert_eq!(a.parents, vec!["B"]);
        let b = report.classes.iter().find(|entry| entry.name == "B").unwrap();
        assert_eq!(b.equivalents, vec!["C"]);
        let r = report.properties.iter().find(|entry| entry.name == "r").unwrap();
        assert_eq!(r.parents, vec!["s"]);

        let text = report.to_string();
        assert!(text.contains("  A ⊑ B"));
        assert!(text.contains("  B ≡ C ⊑ owl:Thing"));
    }

    #[test]
    fn test_report_json_round_trip() {
        let classifier = classified("SubClassOf(A B)\nClassAssertion(A a)\n");
        let report = classifier.report().unwrap();
        let json = report.to_json(false).unwrap();
        let parsed: TaxonomyReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, report);
        assert_eq!(parsed.individuals[0].types, vec!["A"]);
    }

    #[test]
    fn test_inconsistent_report() {
        let classifier = classified("SubClassOf(owl:Thing owl:Nothing)\nSubClassOf(A B)\n");
        let report = classifier.report().unwrap();

        assert!(!report.consistent);
        assert_eq!(report.classes.len(), 1);
        assert_eq!(report.classes[0].name, "owl:Nothing");
        assert!(report.to_string().contains("INCONSISTENT"));
    }

    #[test]
    fn test_dumps() {
        let classifier = classified(
            "SubClassOf(A B)\nSubObjectPropertyOf(r s)\nObjectPropertyAssertion(r a b)\n",
        );
        let entities = &classifier.ontology().entities;
        let store = classifier.store().unwrap();

        let subsumptions = dump_subsumptions(entities, store);
        assert!(subsumptions.lines().any(|line| line == "A\tB"));
        assert!(subsumptions.lines().any(|line| line == "A\towl:Thing"));

        let roles = dump_roles(entities, store);
        assert_eq!(roles.lines().collect::<Vec<_>>(), vec!["{a} r {b} .", "{a} s {b} ."]);
    }

    #[test]
    fn test_dumps_render_nodes_by_content() {
        let classifier = classified("SubClassOf(A ObjectSomeValuesFrom(r B))\n");
        let entities = &classifier.ontology().entities;
        let store = classifier.store().unwrap();

        let roles = dump_roles(entities, store);
        assert!(roles.lines().any(|line| line == "A r ⟨B, {∃witness(r).owl:Thing}⟩ ."));
        let subsumptions = dump_subsumptions(entities, store);
        assert!(subsumptions.lines().any(|line| line == "⟨B, {∃witness(r).owl:Thing}⟩\tB"));
    }
}
