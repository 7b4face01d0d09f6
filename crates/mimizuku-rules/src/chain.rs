//! 規則チェーン (S チェーン・R チェーン) と実行カウンタ

use crate::traits::{Inference, RoleRule, RuleContext, SubsumptionRule};
use mimizuku_store::{RoleFact, StoreError, SubsumptionFact};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

struct Counted<R: ?Sized> {
    firings: AtomicU64,
    rule: Box<R>,
}

impl<R: ?Sized> Counted<R> {
    fn new(rule: Box<R>) -> Self {
        Self { firings: AtomicU64::new(0), rule }
    }
}

/// Per-rule profiling counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStatistics {
    pub name: String,
    pub firings: u64,
}

/// Chain-level profiling counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatistics {
    pub subsumption_invocations: u64,
    pub role_invocations: u64,
    pub rules: Vec<RuleStatistics>,
}

/// Ordered S-rules and R-rules, fixed once selected
pub struct RuleChain {
    subsumption_rules: Vec<Counted<dyn SubsumptionRule>>,
    role_rules: Vec<Counted<dyn RoleRule>>,
    subsumption_invocations: AtomicU64,
    role_invocations: AtomicU64,
}

impl RuleChain {
    pub fn new() -> Self {
        Self {
            subsumption_rules: Vec::new(),
            role_rules: Vec::new(),
            subsumption_invocations: AtomicU64::new(0),
            role_invocations: AtomicU64::new(0),
        }
    }

    /// Append a rule to the S-chain
    pub fn with_subsumption_rule(mut self, rule: Box<dyn SubsumptionRule>) -> Self {
        self.subsumption_rules.push(Counted::new(rule));
        self
    }

    /// Append a rule to the R-chain
    pub fn with_role_rule(mut self, rule: Box<dyn RoleRule>) -> Self {
        self.role_rules.push(Counted::new(rule));
        self
    }

    /// Run every S-rule on `fact`; true if any of them produced something
    pub fn apply_subsumption(
        &self,
        ctx: &RuleContext<'_>,
        fact: SubsumptionFact,
        out: &mut Vec<Inference>,
    ) -> Result<bool, StoreError> {
        self.subsumption_invocations.fetch_add(1, Ordering::Relaxed);
        let mut fired = false;
        for entry in &self.subsumption_rules {
            if entry.rule.apply(ctx, fact, out)? {
                entry.firings.fetch_add(1, Ordering::Relaxed);
                fired = true;
            }
        }
        Ok(fired)
    }

    /// Run every R-rule on `fact`; true if any of them produced something
    pub fn apply_role(
        &self,
        ctx: &RuleContext<'_>,
        fact: RoleFact,
        out: &mut Vec<Inference>,
    ) -> Result<bool, StoreError> {
        self.role_invocations.fetch_add(1, Ordering::Relaxed);
        let mut fired = false;
        for entry in &self.role_rules {
            if entry.rule.apply(ctx, fact, out)? {
                entry.firings.fetch_add(1, Ordering::Relaxed);
                fired = true;
            }
        }
        Ok(fired)
    }

    pub fn subsumption_rule_names(&self) -> Vec<&'static str> {
        self.subsumption_rules.iter().map(|entry| entry.rule.name()).collect()
    }

    pub fn role_rule_names(&self) -> Vec<&'static str> {
        self.role_rules.iter().map(|entry| entry.rule.name()).collect()
    }

    /// Total chain invocations so far
    pub fn invocations(&self) -> u64 {
        self.subsumption_invocations.load(Ordering::Relaxed) + self.role_invocations.load(Ordering::Relaxed)
    }

    pub fn statistics(&self) -> ChainStatistics {
        let subsumption = self
            .subsumption_rules
            .iter()
            .map(|entry| (entry.rule.name(), entry.firings.load(Ordering::Relaxed)));
        let role = self
            .role_rules
            .iter()
            .map(|entry| (entry.rule.name(), entry.firings.load(Ordering::Relaxed)));

        ChainStatistics {
            subsumption_invocations: self.subsumption_invocations.load(Ordering::Relaxed),
            role_invocations: self.role_invocations.load(Ordering::Relaxed),
            rules: subsumption
                .chain(role)
                .map(|(name, firings)| RuleStatistics { name: name.to_string(), firings })
                .collect(),
        }
    }
}

impl Default for RuleChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleChain")
            .field("subsumption_rules", &self.subsumption_rule_names())
            .field("role_rules", &self.role_rule_names())
            .finish()
    }
}
