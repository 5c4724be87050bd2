//! Ordered, shared storage for simulation pairs.

use super::pair::MatcherResponsePair;
use crate::matching::RequestMatcherView;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable view of the pair list at one point in time.
pub type PairSnapshot = Arc<Vec<Arc<MatcherResponsePair>>>;

/// Storage contract consumed by the decision engine.
///
/// Implementations must hand out whole snapshots: a reader either sees the
/// pair list from before a mutation or from after it, never a mix.
pub trait SimulationStore: Send + Sync {
    /// All pairs, in insertion order.
    fn all_pairs(&self) -> PairSnapshot;

    /// Append a pair. Returns `false` (and stores nothing) when a pair with an
    /// identical matcher is already present.
    fn put(&self, pair: MatcherResponsePair) -> bool;

    /// Remove the pair whose matcher declares exactly `matcher`.
    fn delete(&self, matcher: &RequestMatcherView) -> bool;

    /// Replace the whole simulation in one step.
    fn replace_all(&self, pairs: Vec<MatcherResponsePair>);

    fn clear(&self);
}

/// In-memory store using copy-on-write snapshots.
///
/// Writers build a new list and swap it in under the write lock; readers
/// clone the `Arc` under the read lock and evaluate without holding it.
#[derive(Default)]
pub struct InMemorySimulationStore {
    pairs: RwLock<PairSnapshot>,
}

impl InMemorySimulationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pairs(pairs: Vec<MatcherResponsePair>) -> Self {
        let store = Self::new();
        store.replace_all(pairs);
        store
    }

    pub fn len(&self) -> usize {
        self.pairs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.read().is_empty()
    }
}

impl SimulationStore for InMemorySimulationStore {
    fn all_pairs(&self) -> PairSnapshot {
        Arc::clone(&self.pairs.read())
    }

    fn put(&self, pair: MatcherResponsePair) -> bool {
        let view = pair.request_matcher.view();
        let mut guard = self.pairs.write();

        if guard.iter().any(|p| p.request_matcher.view() == view) {
            debug!("Skipping duplicate simulation pair");
            return false;
        }

        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(Arc::new(pair));
        *guard = Arc::new(next);
        true
    }

    fn delete(&self, matcher: &RequestMatcherView) -> bool {
        let mut guard = self.pairs.write();
        let Some(index) = guard
            .iter()
            .position(|p| &p.request_matcher.view() == matcher)
        else {
            return false;
        };

        let mut next: Vec<_> = guard.iter().cloned().collect();
        next.remove(index);
        *guard = Arc::new(next);
        true
    }

    fn replace_all(&self, pairs: Vec<MatcherResponsePair>) {
        let next: Vec<_> = pairs.into_iter().map(Arc::new).collect();
        info!("Loaded simulation with {} pairs", next.len());
        *self.pairs.write() = Arc::new(next);
    }

    fn clear(&self) {
        *self.pairs.write() = Arc::default();
        info!("Simulation cleared");
    }
}
