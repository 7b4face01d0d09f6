//! Engine errors

use mimizuku_core::OntologyError;
use mimizuku_store::StoreError;

/// Hierarchy query errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HierarchyError {
    #[error("Entity is not part of the hierarchy: {0}")]
    UnknownEntity(String),
}

/// Classification errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Ontology has not been classified yet")]
    NotClassified,

    #[error("Fact store error: {0}")]
    Store(#[from] StoreError),

    #[error("Ontology error: {0}")]
    Ontology(#[from] OntologyError),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Saturation worker failed: {0}")]
    Worker(String),
}
