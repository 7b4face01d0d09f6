//! 並列飽和
//!
//! ワーカーはロック付きストアを共有し、保留キューが空になり、かつ処理中の
//! ワーカーがいなくなった時点で終了する。仕事のないワーカーは条件変数で
//! 待機し、新しい事実が積まれるか終了が決まるまで起こされない。

use crate::error::EngineError;
use crate::saturation::{absorb, SaturationStats};
use futures::future::join_all;
use mimizuku_core::OntologyIndex;
use mimizuku_rules::{RuleChain, RuleContext};
use mimizuku_store::{FactStore, RoleFact, SharedFactStore, StoreError, SubsumptionFact};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;
use tracing::{debug, error, info};

enum Work {
    Subsumption(SubsumptionFact),
    Role(RoleFact),
}

/// Completion state shared by all workers
#[derive(Default)]
struct Coordination {
    /// Workers currently holding a popped fact
    active: AtomicUsize,
    aborted: AtomicBool,
    /// Bumped after every processed fact and when the run ends
    generation: AtomicU64,
    parked: AtomicUsize,
    lock: Mutex<()>,
    wakeup: Condvar,
}

impl Coordination {
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn wake(&self) -> Result<(), StoreError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.parked.load(Ordering::SeqCst) > 0 {
            let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned("coordination"))?;
            self.wakeup.notify_all();
        }
        Ok(())
    }

    /// Block until the generation moves past `seen` or the run aborts
    fn park(&self, seen: u64) -> Result<(), StoreError> {
        self.parked.fetch_add(1, Ordering::SeqCst);
        let parked = self
            .lock
            .lock()
            .and_then(|guard| {
                self.wakeup.wait_while(guard, |_| {
                    self.generation() == seen && !self.aborted.load(Ordering::SeqCst)
                })
            })
            .map(drop)
            .map_err(|_| StoreError::Poisoned("coordination"));
        self.parked.fetch_sub(1, Ordering::SeqCst);
        parked
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        if let Err(e) = self.wake() {
            error!("failed to wake parked workers: {}", e);
        }
    }
}

/// Multi-worker fixpoint driver over a [`SharedFactStore`]
#[derive(Debug, Clone)]
pub struct ConcurrentSaturation {
    workers: usize,
    progress_interval: u64,
}

impl ConcurrentSaturation {
    pub fn new(workers: usize, progress_interval: u64) -> Self {
        Self {
            workers: workers.max(1),
            progress_interval,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Saturate `store` with one blocking task per worker
    pub async fn run(
        &self,
        index: Arc<OntologyIndex>,
        chain: Arc<RuleChain>,
        store: FactStore,
    ) -> Result<(FactStore, SaturationStats), EngineError> {
        let start = Instant::now();
        let shared = Arc::new(SharedFactStore::new(store));
        let coordination = Arc::new(Coordination::default());

        let handles = (0..self.workers).map(|id| {
            let index = Arc::clone(&index);
            let chain = Arc::clone(&chain);
            let shared = Arc::clone(&shared);
            let coordination = Arc::clone(&coordination);
            let progress_interval = self.progress_interval;
            tokio::task::spawn_blocking(move || {
                let result = work(id, &index, &chain, &shared, &coordination, progress_interval);
                if let Err(e) = &result {
                    error!(worker = id, "saturation worker failed: {}", e);
                    coordination.abort();
                }
                result
            })
        });

        let mut stats = SaturationStats::default();
        let mut failure = None;
        for joined in join_all(handles).await {
            match joined {
                Ok(Ok(worker_stats)) => stats.merge(&worker_stats),
                Ok(Err(e)) => failure = failure.or(Some(EngineError::Store(e))),
                Err(e) => failure = failure.or(Some(EngineError::Worker(e.to_string()))),
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let shared = Arc::try_unwrap(shared)
            .map_err(|_| EngineError::Worker("fact store still shared after join".to_string()))?;
        let store = shared.into_inner()?;
        stats.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            workers = self.workers,
            processed = stats.processed,
            new_subsumptions = stats.new_subsumptions,
            new_roles = stats.new_roles,
            nodes = stats.nodes_created,
            elapsed_ms = stats.elapsed_ms,
            "parallel saturation converged"
        );
        Ok((store, stats))
    }
}

/// Pop one fact, preferring subsumptions on even workers and roles on odd ones
fn pop(id: usize, store: &SharedFactStore) -> Result<Option<Work>, StoreError> {
    if id % 2 == 0 {
        if let Some(fact) = store.pop_subsumption()? {
            return Ok(Some(Work::Subsumption(fact)));
        }
        Ok(store.pop_role()?.map(Work::Role))
    } else {
        if let Some(fact) = store.pop_role()? {
            return Ok(Some(Work::Role(fact)));
        }
        Ok(store.pop_subsumption()?.map(Work::Subsumption))
    }
}

fn work(
    id: usize,
    index: &OntologyIndex,
    chain: &RuleChain,
    store: &SharedFactStore,
    coordination: &Coordination,
    progress_interval: u64,
) -> Result<SaturationStats, StoreError> {
    let mut stats = SaturationStats::default();
    let mut sink = store;

    loop {
        if coordination.aborted.load(Ordering::SeqCst) {
            break;
        }

        // Results are enqueued before `active` drops, so an idle worker that
        // sees zero active workers and empty queues knows nothing is in flight.
        // The generation is read before popping so a wake after an enqueue
        // that this pop missed is never lost.
        let seen = coordination.generation();
        coordination.active.fetch_add(1, Ordering::SeqCst);
        let popped = match pop(id, store) {
            Ok(popped) => popped,
            Err(e) => {
                coordination.active.fetch_sub(1, Ordering::SeqCst);
                return Err(e);
            }
        };

        let Some(item) = popped else {
            coordination.active.fetch_sub(1, Ordering::SeqCst);
            if coordination.active.load(Ordering::SeqCst) == 0 && !store.has_pending()? {
                coordination.wake()?;
                break;
            }
            coordination.park(seen)?;
            continue;
        };

        let result = process(index, chain, store, &mut sink, item, &mut stats);
        coordination.active.fetch_sub(1, Ordering::SeqCst);
        coordination.wake()?;
        result?;

        stats.processed += 1;
        if progress_interval > 0 && stats.processed % progress_interval == 0 {
            debug!(worker = id, processed = stats.processed, "saturation progress");
        }
    }

    debug!(worker = id, processed = stats.processed, "worker finished");
    Ok(stats)
}

fn process(
    index: &OntologyIndex,
    chain: &RuleChain,
    store: &SharedFactStore,
    sink: &mut &SharedFactStore,
    item: Work,
    stats: &mut SaturationStats,
) -> Result<(), StoreError> {
    let mut out = Vec::new();
    let ctx = RuleContext::new(index, store);
    match item {
        Work::Subsumption(fact) => {
            if store.try_add_subsumption(fact)? {
                stats.new_subsumptions += 1;
                chain.apply_subsumption(&ctx, fact, &mut out)?;
            }
        }
        Work::Role(fact) => {
            if store.try_add_role(fact)? {
                stats.new_roles += 1;
                chain.apply_role(&ctx, fact, &mut out)?;
            }
        }
    }
    stats.nodes_created += absorb(sink, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saturation::seed_store;
    use mimizuku_core::{Axiom, ChainMode, ConceptId, Ontology};
    use mimizuku_rules::ChainSelector;
    use mimizuku_store::FactView;

    #[tokio::test]
    async fn test_parallel_saturation_reaches_fixpoint() {
        let mut ontology = Ontology::new();
        let ids: Vec<ConceptId> = (0..10).map(|i| ontology.concept(&format!("C{}", i))).collect();
        for pair in ids.windows(2) {
            ontology.add_axiom(Axiom::SubClass { sub: pair[0], sup: pair[1] });
        }
        let index = OntologyIndex::build(&mut ontology, ChainMode::Auto);
        let chain = ChainSelector::select(&index);
        let mut store = FactStore::new(index.concept_bound());
        seed_store(&mut store, &index);

        let driver = ConcurrentSaturation::new(4, 0);
        let (store, stats) = driver.run(Arc::new(index), Arc::new(chain), store).await.unwrap();

        for (i, sub) in ids.iter().enumerate() {
            for sup in &ids[i..] {
                assert!(store.is_subsumed(*sub, *sup));
            }
        }
        assert!(!store.is_subsumed(ids[9], ids[0]));
        assert!(!store.has_pending());
        assert!(stats.processed >= stats.new_subsumptions);
    }

    #[test]
    fn test_parked_worker_wakes_on_new_generation() {
        let coordination = Arc::new(Coordination::default());
        let seen = coordination.generation();

        let parked = {
            let coordination = Arc::clone(&coordination);
            std::thread::spawn(move || coordination.park(seen))
        };
        while coordination.parked.load(Ordering::SeqCst) == 0 {
            std::thread::yield_now();
        }
        coordination.wake().unwrap();

        assert!(parked.join().unwrap().is_ok());
        assert_eq!(coordination.parked.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_abort_releases_parked_workers() {
        let coordination = Arc::new(Coordination::default());
        let seen = coordination.generation();

        let parked: Vec<_> = (0..3)
            .map(|_| {
                let coordination = Arc::clone(&coordination);
                std::thread::spawn(move || coordination.park(seen))
            })
            .collect();
        coordination.abort();

        for handle in parked {
            assert!(handle.join().unwrap().is_ok());
        }
        assert!(coordination.aborted.load(Ordering::SeqCst));
    }

    #[test]
    fn test_park_returns_at_once_after_missed_wake() {
        let coordination = Coordination::default();
        let seen = coordination.generation();
        coordination.wake().unwrap();
        assert!(coordination.park(seen).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_many_workers_on_a_narrow_chain() {
        let mut ontology = Ontology::new();
        let ids: Vec<ConceptId> = (0..40).map(|i| ontology.concept(&format!("C{}", i))).collect();
        for pair in ids.windows(2) {
            ontology.add_axiom(Axiom::SubClass { sub: pair[0], sup: pair[1] });
        }
        let index = OntologyIndex::build(&mut ontology, ChainMode::Auto);
        let chain = ChainSelector::select(&index);
        let mut store = FactStore::new(index.concept_bound());
        seed_store(&mut store, &index);

        let driver = ConcurrentSaturation::new(16, 0);
        let (store, _stats) = driver.run(Arc::new(index), Arc::new(chain), store).await.unwrap();

        assert!(store.is_subsumed(ids[0], ids[39]));
        assert!(!store.has_pending());
    }

    #[tokio::test]
    async fn test_zero_workers_is_clamped() {
        let driver = ConcurrentSaturation::new(0, 0);
        assert_eq!(driver.workers(), 1);

        let mut ontology = Ontology::new();
        let index = OntologyIndex::build(&mut ontology, ChainMode::Auto);
        let chain = ChainSelector::select(&index);
        let store = FactStore::new(index.concept_bound());
        let (store, stats) = driver.run(Arc::new(index), Arc::new(chain), store).await.unwrap();
        assert_eq!(stats.processed, 0);
        assert_eq!(store.subsumptions().len(), 0);
    }
}
