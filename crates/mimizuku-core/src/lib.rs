//! Mimizuku コアデータモデル
//!
//! このクレートは EL 分類器の入力側を提供します:
//! - 概念・ロール・個体の密な ID 管理
//! - 正規化済み公理
//! - 公理パターンのインデックスと表現力プロファイル
//! - 関数型構文ローダー

pub mod entities;
pub mod index;
pub mod loader;
pub mod model;

pub use entities::{ConceptKind, EntityRegistry, RoleKind};
pub use index::{ChainMode, ExpressivityProfile, OntologyIndex};
pub use loader::{AxiomLoader, FunctionalSyntaxLoader};
pub use model::{Axiom, ConceptId, IndividualId, Ontology, RoleId};

// Error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OntologyError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid axiom at line {line}: {message}")]
    InvalidAxiom { line: usize, message: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("I/O error: {0}")]
    Io(String),
}
