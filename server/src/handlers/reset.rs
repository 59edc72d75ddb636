//! Reset handler - debug only.

use gcounter_engine::Snapshot;

use crate::error::{AppError, Result};
use crate::AppState;

/// Drop every slot and go back to `{own: 0}`.
///
/// Only available when debug routes are enabled.
pub fn handle_reset(state: &AppState) -> Result<Snapshot> {
    if !state.config.debug_routes {
        return Err(AppError::NotFound("debug routes are disabled".to_string()));
    }

    state.store.reset();
    tracing::info!(node = %state.store.node_id(), "gcounter reset");
    Ok(state.store.snapshot())
}
