//! Shared counter state.
//!
//! The node owns exactly one [`GCounter`]. Every handler reaches it through
//! [`CounterStore`], which serializes all access with a single lock. The lock
//! is never held across an await point, so serving a snapshot never waits on
//! an outbound sync.
//!
//! A sync works on a copy taken before its fetches. Every reset bumps the
//! store's epoch; a round that started in an older epoch only contributes
//! the peer views it fetched, never its stale copy of our own state.

use std::sync::Arc;

use gcounter_engine::{Count, GCounter, NodeId, Snapshot, SyncReport, DEFAULT_NODE_ID};
use parking_lot::Mutex;

/// The node's counter, guarded by one exclusive lock.
#[derive(Debug)]
pub struct CounterStore {
    node_id: NodeId,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    counter: GCounter,
    /// Number of resets so far.
    epoch: u64,
}

impl CounterStore {
    /// Create a store seeded with `{node_id: 0}`.
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        let mut node_id = node_id.into();
        if node_id.is_empty() {
            node_id = DEFAULT_NODE_ID.to_string();
        }

        Self {
            inner: Mutex::new(Inner {
                counter: GCounter::new(node_id.clone()),
                epoch: 0,
            }),
            node_id,
        }
    }

    /// Create a new store wrapped in Arc for sharing.
    pub fn new_shared(node_id: impl Into<NodeId>) -> Arc<Self> {
        Arc::new(Self::new(node_id))
    }

    /// Identifier of the slot this node owns.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Raise this node's own slot and return its new value.
    pub fn increment(&self) -> Count {
        self.inner.lock().counter.increment(&self.node_id)
    }

    /// Copy of the whole counter.
    pub fn counter(&self) -> GCounter {
        self.inner.lock().counter.clone()
    }

    /// Copy of the counter together with the epoch it was taken in.
    pub fn checkout(&self) -> (GCounter, u64) {
        let inner = self.inner.lock();
        (inner.counter.clone(), inner.epoch)
    }

    pub fn epoch(&self) -> u64 {
        self.inner.lock().epoch
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().counter.snapshot()
    }

    pub fn total(&self) -> Count {
        self.inner.lock().counter.total()
    }

    /// Join `other` into the current state.
    ///
    /// Joining rather than replacing keeps increments that landed while
    /// `other` was being computed.
    pub fn absorb(&self, other: &GCounter) {
        self.inner.lock().counter.merge(other);
    }

    /// Fold a finished round that started from a checkout taken in `epoch`.
    ///
    /// If a reset happened since, only the fetched peer views are joined.
    pub fn absorb_round(&self, epoch: u64, report: &SyncReport) {
        let mut inner = self.inner.lock();
        if inner.epoch == epoch {
            inner.counter.merge(&report.counter);
        } else {
            tracing::debug!(
                started = epoch,
                current = inner.epoch,
                "store was reset during sync, keeping peer views only"
            );
            inner.counter.merge(&report.remote);
        }
    }

    /// Reinitialize to `{node_id: 0}` and start a new epoch.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.counter.reset(&self.node_id);
        inner.epoch = inner.epoch.wrapping_add(1);
    }
}
