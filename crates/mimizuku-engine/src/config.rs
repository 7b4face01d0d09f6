//! 分類器の設定

use mimizuku_core::ChainMode;
use serde::{Deserialize, Serialize};

/// Which pending queue the driver drains next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Larger queue first
    #[default]
    Balanced,
    SubsumptionFirst,
    RoleFirst,
    /// Switch queues after every fact
    Alternating,
    /// Seeded coin flip whenever both queues hold facts
    Random(u64),
}

/// Classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 規則セットの選択
    pub chain_mode: ChainMode,
    /// キューの取り出し順
    pub queue_policy: QueuePolicy,
    /// 並列飽和のワーカー数
    pub workers: usize,
    /// 進捗ログの間隔 (処理事実数、0 で無効)
    pub progress_interval: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            chain_mode: ChainMode::Auto,
            queue_policy: QueuePolicy::Balanced,
            workers: 4,
            progress_interval: 100_000,
        }
    }
}

impl ClassifierConfig {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn with_queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.queue_policy = policy;
        self
    }

    pub fn with_chain_mode(mut self, mode: ChainMode) -> Self {
        self.chain_mode = mode;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}
