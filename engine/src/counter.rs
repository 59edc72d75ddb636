//! Grow-only counter state.
//!
//! A [`GCounter`] holds one slot per node. Local increments raise exactly one
//! slot; merges raise slots to the pairwise maximum of two views. No
//! operation ever lowers a slot, which is what makes the join converge.

use crate::{error::Result, Count, Error, NodeId, Snapshot, DEFAULT_NODE_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A grow-only counter.
///
/// Equality is lattice equality: a slot holding `0` and an absent slot are
/// the same element, so `{a: 3}` equals `{a: 3, b: 0}`. Use [`GCounter::slots`]
/// when the exact key set matters.
///
/// Uses BTreeMap so snapshots serialize in a deterministic order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GCounter {
    slots: BTreeMap<NodeId, Count>,
}

/// Map an empty identifier to [`DEFAULT_NODE_ID`].
fn resolve_node(node: &str) -> &str {
    if node.is_empty() {
        DEFAULT_NODE_ID
    } else {
        node
    }
}

impl GCounter {
    /// Create a counter owned by `node`, holding exactly `{node: 0}`.
    ///
    /// An empty identifier is replaced by [`DEFAULT_NODE_ID`].
    pub fn new(node: impl Into<NodeId>) -> Self {
        let node = node.into();
        let mut slots = BTreeMap::new();
        slots.insert(resolve_node(&node).to_string(), 0);
        Self { slots }
    }

    /// Build a counter from an existing slot mapping.
    pub fn from_slots(slots: BTreeMap<NodeId, Count>) -> Self {
        Self { slots }
    }

    /// Raise the slot for `node` by one and return its new value.
    ///
    /// The slot is created at `1` if absent.
    pub fn increment(&mut self, node: &str) -> Count {
        self.increment_by(node, 1)
    }

    /// Raise the slot for `node` by `n` and return its new value.
    pub fn increment_by(&mut self, node: &str, n: Count) -> Count {
        let slot = self
            .slots
            .entry(resolve_node(node).to_string())
            .or_insert(0);
        *slot = slot.saturating_add(n);
        *slot
    }

    /// Current value of a single slot, `0` if absent.
    pub fn count_for(&self, node: &str) -> Count {
        self.slots.get(node).copied().unwrap_or(0)
    }

    /// Sum of all slots.
    pub fn total(&self) -> Count {
        self.slots
            .values()
            .fold(0, |total: Count, count| total.saturating_add(*count))
    }

    /// Number of slots, including zero-valued ones.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Node identifiers with a slot, in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.slots.keys()
    }

    /// Borrow the raw slot mapping.
    pub fn slots(&self) -> &BTreeMap<NodeId, Count> {
        &self.slots
    }

    /// Owned copy of the slot mapping, safe to hand across the process
    /// boundary.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(self.slots.clone())
    }

    /// Join `other` into this counter in place.
    ///
    /// Every slot becomes the maximum of the two views. Slots missing on
    /// either side count as `0`.
    pub fn merge(&mut self, other: &GCounter) {
        for (node, &count) in &other.slots {
            let slot = self.slots.entry(node.clone()).or_insert(0);
            *slot = (*slot).max(count);
        }
    }

    /// Join of two counters as a new, independent counter.
    pub fn join(&self, other: &GCounter) -> GCounter {
        let mut joined = self.clone();
        joined.merge(other);
        joined
    }

    /// Least upper bound of a non-empty sequence of counters.
    ///
    /// Inputs are only borrowed; the result never aliases any of them.
    /// Returns [`Error::EmptyMerge`] when the sequence is empty.
    pub fn merge_all<'a, I>(counters: I) -> Result<GCounter>
    where
        I: IntoIterator<Item = &'a GCounter>,
    {
        let mut counters = counters.into_iter();
        let first = counters.next().ok_or(Error::EmptyMerge)?;

        Ok(counters.fold(first.clone(), |mut merged, counter| {
            merged.merge(counter);
            merged
        }))
    }

    /// Whether every slot of `other` is less than or equal to ours.
    pub fn dominates(&self, other: &GCounter) -> bool {
        other
            .slots
            .iter()
            .all(|(node, &count)| self.count_for(node) >= count)
    }

    /// Drop every slot and reinitialize to `{node: 0}`.
    ///
    /// Debug and test use only; the caller must hold exclusive access.
    pub fn reset(&mut self, node: &str) {
        *self = GCounter::new(node);
    }
}

impl PartialEq for GCounter {
    fn eq(&self, other: &Self) -> bool {
        self.dominates(other) && other.dominates(self)
    }
}

impl Eq for GCounter {}

impl From<Snapshot> for GCounter {
    fn from(snapshot: Snapshot) -> Self {
        Self::from_slots(snapshot.into_slots())
    }
}
