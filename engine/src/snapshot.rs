//! Snapshot of counter state exchanged between replicas.
//!
//! A snapshot is what a node serves to its peers and what it receives back
//! from them. On the wire it is a bare JSON object mapping node identifiers
//! to non-negative integers, e.g. `{"node-a": 3, "node-b": 5}`.

use crate::{error::Result, Count, Error, GCounter, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A read-only copy of a counter's slots.
///
/// Uses BTreeMap instead of HashMap for deterministic serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    slots: BTreeMap<NodeId, Count>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the snapshot for values the wire format cannot rule out on its
    /// own.
    pub fn validate(&self) -> Result<()> {
        if self.slots.keys().any(|node| node.is_empty()) {
            return Err(Error::InvalidSnapshot("empty node identifier".into()));
        }
        Ok(())
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// Negative or fractional counts and empty node identifiers are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Deserialize from raw JSON bytes, as received from a peer.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_slice(bytes).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, node: &str) -> Option<Count> {
        self.slots.get(node).copied()
    }

    /// Sum of all slots in the snapshot.
    pub fn total(&self) -> Count {
        self.slots
            .values()
            .fold(0, |total: Count, count| total.saturating_add(*count))
    }

    pub fn into_slots(self) -> BTreeMap<NodeId, Count> {
        self.slots
    }

    /// Turn the view into a counter that can be merged.
    pub fn into_counter(self) -> GCounter {
        GCounter::from(self)
    }
}

impl From<BTreeMap<NodeId, Count>> for Snapshot {
    fn from(slots: BTreeMap<NodeId, Count>) -> Self {
        Self { slots }
    }
}

impl From<&GCounter> for Snapshot {
    fn from(counter: &GCounter) -> Self {
        counter.snapshot()
    }
}
