//! 不動点ドライバ (逐次版)

use crate::config::{ClassifierConfig, QueuePolicy};
use mimizuku_core::{ConceptId, OntologyIndex};
use mimizuku_rules::{Inference, RuleChain, RuleContext};
use mimizuku_store::{
    FactStore, NodeKey, Queue, RoleFact, SharedFactStore, StoreError, SubsumptionFact,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaturationState {
    Running,
    Converged,
}

/// Saturation statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaturationStats {
    /// Facts popped from the pending sets
    pub processed: u64,
    /// Popped facts that were new and triggered a rule chain
    pub new_subsumptions: u64,
    pub new_roles: u64,
    pub nodes_created: u64,
    pub elapsed_ms: u64,
}

impl SaturationStats {
    pub fn merge(&mut self, other: &SaturationStats) {
        self.processed += other.processed;
        self.new_subsumptions += other.new_subsumptions;
        self.new_roles += other.new_roles;
        self.nodes_created += other.nodes_created;
    }
}

/// Destination of rule output: queues plus the node table
pub(crate) trait WorkSink {
    fn push_subsumption(&mut self, fact: SubsumptionFact) -> Result<(), StoreError>;
    fn push_role(&mut self, fact: RoleFact) -> Result<(), StoreError>;
    fn intern(&mut self, key: NodeKey) -> Result<(ConceptId, bool), StoreError>;
}

impl WorkSink for FactStore {
    fn push_subsumption(&mut self, fact: SubsumptionFact) -> Result<(), StoreError> {
        self.enqueue_subsumption(fact);
        Ok(())
    }

    fn push_role(&mut self, fact: RoleFact) -> Result<(), StoreError> {
        self.enqueue_role(fact);
        Ok(())
    }

    fn intern(&mut self, key: NodeKey) -> Result<(ConceptId, bool), StoreError> {
        Ok(self.intern_node(key))
    }
}

impl WorkSink for &SharedFactStore {
    fn push_subsumption(&mut self, fact: SubsumptionFact) -> Result<(), StoreError> {
        self.enqueue_subsumption(fact).map(|_| ())
    }

    fn push_role(&mut self, fact: RoleFact) -> Result<(), StoreError> {
        self.enqueue_role(fact).map(|_| ())
    }

    fn intern(&mut self, key: NodeKey) -> Result<(ConceptId, bool), StoreError> {
        self.intern_node(key)
    }
}

/// Enqueue rule output, interning successor nodes. Returns the number of nodes created.
pub(crate) fn absorb<S: WorkSink>(sink: &mut S, inferences: Vec<Inference>) -> Result<u64, StoreError> {
    let mut created = 0;
    for inference in inferences {
        match inference {
            Inference::Subsumption(fact) => sink.push_subsumption(fact)?,
            Inference::Role(fact) => sink.push_role(fact)?,
            Inference::Successor { role, source, node } => {
                let (id, new) = sink.intern(node.clone())?;
                if new {
                    seed_node(sink, id, &node)?;
                    created += 1;
                }
                sink.push_role(RoleFact::new(role, source, id))?;
            }
        }
    }
    Ok(created)
}

/// Initial facts of a freshly created node `⟨base, ψ⟩`
fn seed_node<S: WorkSink>(sink: &mut S, id: ConceptId, node: &NodeKey) -> Result<(), StoreError> {
    sink.push_subsumption(SubsumptionFact::new(id, id))?;
    sink.push_subsumption(SubsumptionFact::new(id, ConceptId::TOP))?;
    sink.push_subsumption(SubsumptionFact::new(id, node.base))?;
    for entry in &node.existentials {
        sink.push_role(RoleFact::new(entry.role, id, entry.filler))?;
    }
    Ok(())
}

/// Queue the initial facts of a run: reflexive/⊤ pairs and asserted role facts
pub fn seed_store(store: &mut FactStore, index: &OntologyIndex) {
    store.seed(index.concepts());
    for (role, subject, object) in index.role_assertions() {
        store.enqueue_role(RoleFact::new(*role, *subject, *object));
    }
}

/// Single-threaded fixpoint loop
pub struct Saturation<'a> {
    index: &'a OntologyIndex,
    chain: &'a RuleChain,
    policy: QueuePolicy,
    progress_interval: u64,
    state: SaturationState,
    last_queue: Queue,
    rng: SmallRng,
    stats: SaturationStats,
}

impl<'a> Saturation<'a> {
    pub fn new(index: &'a OntologyIndex, chain: &'a RuleChain, config: &ClassifierConfig) -> Self {
        Self {
            index,
            chain,
            policy: config.queue_policy,
            progress_interval: config.progress_interval,
            state: SaturationState::Running,
            last_queue: Queue::Role,
            rng: match config.queue_policy {
                QueuePolicy::Random(seed) => SmallRng::seed_from_u64(seed),
                _ => SmallRng::seed_from_u64(0),
            },
            stats: SaturationStats::default(),
        }
    }

    pub fn state(&self) -> SaturationState {
        self.state
    }

    pub fn stats(&self) -> &SaturationStats {
        &self.stats
    }

    fn next_queue(&mut self, store: &FactStore) -> Queue {
        let subsumptions = store.pending(Queue::Subsumption);
        let roles = store.pending(Queue::Role);
        let queue = match (subsumptions, roles) {
            (_, 0) => Queue::Subsumption,
            (0, _) => Queue::Role,
            _ => match self.policy {
                QueuePolicy::Balanced if roles > subsumptions => Queue::Role,
                QueuePolicy::Balanced => Queue::Subsumption,
                QueuePolicy::SubsumptionFirst => Queue::Subsumption,
                QueuePolicy::RoleFirst => Queue::Role,
                QueuePolicy::Alternating => match self.last_queue {
                    Queue::Subsumption => Queue::Role,
                    Queue::Role => Queue::Subsumption,
                },
                QueuePolicy::Random(_) if self.rng.random::<bool>() => Queue::Subsumption,
                QueuePolicy::Random(_) => Queue::Role,
            },
        };
        self.last_queue = queue;
        queue
    }

    /// Process one pending fact. Returns false once both queues are empty.
    pub fn step(&mut self, store: &mut FactStore) -> Result<bool, StoreError> {
        if !store.has_pending() {
            self.state = SaturationState::Converged;
            return Ok(false);
        }
        self.state = SaturationState::Running;

        let mut out = Vec::new();
        match self.next_queue(store) {
            Queue::Subsumption => {
                let fact = store.take_subsumption()?;
                if store.try_add_subsumption(fact) {
                    self.stats.new_subsumptions += 1;
                    let ctx = RuleContext::new(self.index, &*store);
                    self.chain.apply_subsumption(&ctx, fact, &mut out)?;
                }
            }
            Queue::Role => {
                let fact = store.take_role()?;
                if store.try_add_role(fact) {
                    self.stats.new_roles += 1;
                    let ctx = RuleContext::new(self.index, &*store);
                    self.chain.apply_role(&ctx, fact, &mut out)?;
                }
            }
        }
        self.stats.nodes_created += absorb(store, out)?;
        self.stats.processed += 1;

        if self.progress_interval > 0 && self.stats.processed % self.progress_interval == 0 {
            let snapshot = store.statistics();
            debug!(
                processed = self.stats.processed,
                subsumptions = snapshot.subsumptions,
                roles = snapshot.roles,
                pending_s = snapshot.pending_subsumptions,
                pending_r = snapshot.pending_roles,
                "saturation progress"
            );
        }
        Ok(true)
    }

    /// Drain both queues
    pub fn run(&mut self, store: &mut FactStore) -> Result<SaturationStats, StoreError> {
        let start = Instant::now();
        let before = self.stats;
        while self.step(store)? {}

        let mut run = self.stats;
        run.processed -= before.processed;
        run.new_subsumptions -= before.new_subsumptions;
        run.new_roles -= before.new_roles;
        run.nodes_created -= before.nodes_created;
        run.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            processed = run.processed,
            new_subsumptions = run.new_subsumptions,
            new_roles = run.new_roles,
            nodes = run.nodes_created,
            elapsed_ms = run.elapsed_ms,
            "saturation converged"
        );
        Ok(run)
    }
}
