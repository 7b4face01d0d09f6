//! # Mimizuku Store
//!
//! 飽和計算の事実ストア
//! 包摂関係 S・ロール関係 R・拡張ノード表 V と未処理キューを保持する

pub mod fact;
pub mod graph;
pub mod nodes;
pub mod pending;
pub mod shared;
pub mod store;

pub use fact::{RoleFact, SubsumptionFact};
pub use graph::{RoleGraph, SubsumptionGraph};
pub use nodes::{Existential, NodeKey, NodeTable};
pub use pending::{PendingQueue, Queue};
pub use shared::SharedFactStore;
pub use store::{FactStore, FactView, StoreStatistics};

use mimizuku_core::ConceptId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Pending {0} queue is empty")]
    PendingUnderflow(Queue),

    #[error("Unknown extended node: {0}")]
    UnknownNode(ConceptId),

    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),
}
