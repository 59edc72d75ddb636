//! Count handler - total of the replicated counter.

use gcounter_engine::Count;

use crate::AppState;

/// Sync with peers (when any are configured) and return the total.
///
/// Peers that fail only make the answer staler; this never errors.
pub async fn handle_count(state: &AppState) -> Count {
    if state.sync.has_peers() {
        let report = state.sync.sync_into(&state.store).await;
        if !report.is_clean() {
            tracing::debug!(
                failed = report.failed().count(),
                "gcounter total computed without some peers"
            );
        }
    }

    let count = state.store.total();
    tracing::debug!(count, "successful gcounter total");
    count
}
