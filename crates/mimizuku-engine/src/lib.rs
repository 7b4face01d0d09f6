//! # Mimizuku Engine
//!
//! 飽和ドライバと分類器
//! 完備化規則を不動点まで適用し、後処理を経て概念・ロール階層を構築する

pub mod classification;
pub mod classifier;
pub mod concurrent;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod postprocess;
pub mod report;
pub mod saturation;

pub use classification::{Classification, ClassificationStats, ClassificationStatus};
pub use classifier::Classifier;
pub use concurrent::ConcurrentSaturation;
pub use config::{ClassifierConfig, QueuePolicy};
pub use error::{EngineError, HierarchyError};
pub use hierarchy::{Hierarchy, HierarchyBuilder, RoleSubsumptions, SubsumptionSource};
pub use postprocess::{IndividualTypes, PostProcessed, PostProcessor};
pub use report::{dump_roles, dump_subsumptions, ClassEntry, IndividualEntry, TaxonomyReport};
pub use saturation::{seed_store, Saturation, SaturationState, SaturationStats};
