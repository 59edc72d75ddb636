//! Error types for the GCounter engine.

use crate::{NodeId, SyncPhase};
use thiserror::Error;

/// All possible errors from the GCounter engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Counter errors
    #[error("merge requires at least one counter")]
    EmptyMerge,

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    // Sync round errors
    #[error("unknown peer: {0}")]
    UnknownPeer(NodeId),

    #[error("outcome already recorded for peer: {0}")]
    DuplicateOutcome(NodeId),

    #[error("invalid sync state: expected {expected}, got {actual}")]
    InvalidSyncState {
        expected: SyncPhase,
        actual: SyncPhase,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
