//! Increment handler - bumps this node's own slot.

use gcounter_engine::Count;

use crate::state::CounterStore;

/// Raise this node's slot by one; no network involved.
pub fn handle_increment(store: &CounterStore) -> Count {
    let value = store.increment();
    tracing::debug!(node = %store.node_id(), value, "successful gcounter increment");
    value
}
