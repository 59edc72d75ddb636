//! Values handler - serves this node's local snapshot.

use gcounter_engine::Snapshot;

use crate::state::CounterStore;

/// Local slots only. Never syncs and never mutates, so a peer pulling from
/// us cannot trigger or wait on a sync of our own.
pub fn handle_values(store: &CounterStore) -> Snapshot {
    let snapshot = store.snapshot();
    tracing::debug!(counter = ?snapshot, "successful gcounter values");
    snapshot
}
