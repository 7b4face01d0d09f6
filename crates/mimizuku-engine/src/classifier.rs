//! 分類器ファサード
//!
//! オントロジーを保持し、飽和・後処理を実行して名前ベースの問い合わせに答える。
//! 公理を追加すると未分類に戻り、次の分類で最初から飽和し直す。

use crate::classification::{Classification, ClassificationStats, ClassificationStatus};
use crate::concurrent::ConcurrentSaturation;
use crate::config::ClassifierConfig;
use crate::error::EngineError;
use crate::postprocess::PostProcessor;
use crate::report::TaxonomyReport;
use crate::saturation::{seed_store, Saturation, SaturationStats};
use mimizuku_core::{
    Axiom, AxiomLoader, ConceptId, FunctionalSyntaxLoader, IndividualId, Ontology, OntologyError,
    OntologyIndex, RoleId,
};
use mimizuku_rules::{ChainSelector, RuleChain};
use mimizuku_store::FactStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

struct Classified {
    store: FactStore,
    classification: Classification,
}

/// EL classifier over an owned ontology
pub struct Classifier {
    ontology: Ontology,
    config: ClassifierConfig,
    result: Option<Classified>,
}

impl Classifier {
    pub fn new(ontology: Ontology, config: ClassifierConfig) -> Self {
        Self {
            ontology,
            config,
            result: None,
        }
    }

    /// Build a classifier from functional-style syntax
    pub fn from_functional_syntax(input: &str, config: ClassifierConfig) -> Result<Self, EngineError> {
        let ontology = FunctionalSyntaxLoader.load_str(input)?;
        Ok(Self::new(ontology, config))
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn status(&self) -> ClassificationStatus {
        if self.result.is_some() {
            ClassificationStatus::Classified
        } else {
            ClassificationStatus::Unclassified
        }
    }

    pub fn is_classified(&self) -> bool {
        self.result.is_some()
    }

    /// Add axioms; previous results are discarded
    pub fn add_axioms<I: IntoIterator<Item = Axiom>>(&mut self, axioms: I) {
        self.ontology.extend(axioms);
        self.result = None;
    }

    /// Parse more functional-style statements into the ontology
    pub fn load_axioms(&mut self, input: &str) -> Result<usize, EngineError> {
        let added = FunctionalSyntaxLoader.load_into(&mut self.ontology, input)?;
        self.result = None;
        Ok(added)
    }

    fn prepare(&mut self) -> (OntologyIndex, RuleChain, FactStore) {
        let index = OntologyIndex::build(&mut self.ontology, self.config.chain_mode);
        let chain = ChainSelector::select(&index);
        let mut store = FactStore::new(index.concept_bound());
        seed_store(&mut store, &index);
        info!(
            axioms = self.ontology.axioms.len(),
            concepts = index.concept_bound(),
            roles = index.role_bound(),
            "classification started"
        );
        (index, chain, store)
    }

    /// Saturate on the current thread and build the hierarchies
    pub fn classify(&mut self) -> Result<&Classification, EngineError> {
        let start = Instant::now();
        let (index, chain, mut store) = self.prepare();
        let saturation = Saturation::new(&index, &chain, &self.config).run(&mut store)?;
        self.finish(&index, &chain, store, saturation, 1, start)
    }

    /// Saturate with `config.workers` blocking workers, then post-process
    pub async fn classify_concurrent(&mut self) -> Result<&Classification, EngineError> {
        let start = Instant::now();
        let (index, chain, store) = self.prepare();
        let (index, chain) = (Arc::new(index), Arc::new(chain));
        let driver = ConcurrentSaturation::new(self.config.workers, self.config.progress_interval);
        let (store, saturation) = driver.run(Arc::clone(&index), Arc::clone(&chain), store).await?;
        self.finish(&index, &chain, store, saturation, driver.workers(), start)
    }

    fn finish(
        &mut self,
        index: &OntologyIndex,
        chain: &RuleChain,
        mut store: FactStore,
        saturation: SaturationStats,
        workers: usize,
        start: Instant,
    ) -> Result<&Classification, EngineError> {
        let processed = PostProcessor::new(&self.ontology.entities, index, chain, &self.config).run(&mut store)?;
        let inconsistent = processed.concepts.is_inconsistent();
        let stats = ClassificationStats {
            saturation,
            closure: processed.closure,
            nominal_rounds: processed.nominal_rounds,
            store: store.statistics(),
            chain: chain.statistics(),
            workers,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            inconsistent,
            subsumptions = stats.store.subsumptions,
            roles = stats.store.roles,
            nodes = stats.store.nodes,
            elapsed_ms = stats.elapsed_ms,
            "classification finished"
        );

        let classified = self.result.insert(Classified {
            store,
            classification: Classification {
                concepts: processed.concepts,
                roles: processed.roles,
                individuals: processed.individuals,
                inconsistent,
                stats,
            },
        });
        Ok(&classified.classification)
    }

    pub fn classification(&self) -> Result<&Classification, EngineError> {
        self.result
            .as_ref()
            .map(|classified| &classified.classification)
            .ok_or(EngineError::NotClassified)
    }

    /// Saturated facts of the last run
    pub fn store(&self) -> Result<&FactStore, EngineError> {
        self.result
            .as_ref()
            .map(|classified| &classified.store)
            .ok_or(EngineError::NotClassified)
    }

    pub fn is_consistent(&self) -> Result<bool, EngineError> {
        Ok(!self.classification()?.inconsistent)
    }

    fn concept(&self, name: &str) -> Result<ConceptId, EngineError> {
        self.ontology
            .entities
            .find_concept(name)
            .ok_or_else(|| OntologyError::UnknownEntity(name.to_string()).into())
    }

    fn role(&self, name: &str) -> Result<RoleId, EngineError> {
        self.ontology
            .entities
            .find_role(name)
            .ok_or_else(|| OntologyError::UnknownEntity(name.to_string()).into())
    }

    fn individual(&self, name: &str) -> Result<IndividualId, EngineError> {
        self.ontology
            .entities
            .find_individual(name)
            .ok_or_else(|| OntologyError::UnknownEntity(name.to_string()).into())
    }

    fn concept_names<I: IntoIterator<Item = ConceptId>>(&self, ids: I) -> Vec<String> {
        ids.into_iter()
            .filter_map(|id| self.ontology.entities.concept_name(id))
            .map(str::to_string)
            .collect()
    }

    fn role_names<I: IntoIterator<Item = RoleId>>(&self, ids: I) -> Vec<String> {
        ids.into_iter()
            .filter_map(|id| self.ontology.entities.role_name(id))
            .map(str::to_string)
            .collect()
    }

    /// Direct super classes of `name`
    pub fn super_classes(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        Ok(self.concept_names(classification.concepts.parents(self.concept(name)?)?))
    }

    /// Direct sub classes of `name`
    pub fn sub_classes(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        Ok(self.concept_names(classification.concepts.children(self.concept(name)?)?))
    }

    pub fn equivalent_classes(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        Ok(self.concept_names(classification.concepts.equivalents(self.concept(name)?)?))
    }

    pub fn ancestors(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        Ok(self.concept_names(classification.concepts.ancestors(self.concept(name)?)?))
    }

    pub fn descendants(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        Ok(self.concept_names(classification.concepts.descendants(self.concept(name)?)?))
    }

    pub fn is_subclass_of(&self, sub: &str, sup: &str) -> Result<bool, EngineError> {
        let classification = self.classification()?;
        Ok(classification.concepts.is_subsumed_by(self.concept(sub)?, self.concept(sup)?)?)
    }

    pub fn super_roles(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        Ok(self.role_names(classification.roles.parents(self.role(name)?)?))
    }

    pub fn sub_roles(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        Ok(self.role_names(classification.roles.children(self.role(name)?)?))
    }

    /// Most specific classes of an individual
    pub fn direct_types(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        let individual = self.individual(name)?;
        let types = classification
            .individual(individual)
            .ok_or_else(|| OntologyError::UnknownEntity(name.to_string()))?;
        Ok(self.concept_names(types.direct_types.iter().copied()))
    }

    /// Other individuals known to denote the same element
    pub fn same_individuals(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let classification = self.classification()?;
        let individual = self.individual(name)?;
        let types = classification
            .individual(individual)
            .ok_or_else(|| OntologyError::UnknownEntity(name.to_string()))?;
        Ok(types
            .same_as
            .iter()
            .filter_map(|id| self.ontology.entities.individual_name(*id))
            .map(str::to_string)
            .collect())
    }

    /// Name-based snapshot of the classification
    pub fn report(&self) -> Result<TaxonomyReport, EngineError> {
        Ok(TaxonomyReport::new(&self.ontology, self.classification()?))
    }
}
