//! # GCounter Engine
//!
//! A grow-only counter CRDT and the anti-entropy state machine that keeps
//! replicas of it converging.
//!
//! Every node owns one slot in the counter and only ever raises its own slot.
//! Replicas exchange snapshots and fold them together with a per-slot
//! maximum, so the result is the same regardless of the order, timing or
//! repetition of the exchanges.
//!
//! ## Design Principles
//!
//! - **No IO**: The engine has no knowledge of sockets, HTTP or timers
//! - **Deterministic**: Same inputs always produce same outputs
//! - **Testable**: Pure logic, network failures are plain values
//!
//! ## Core Concepts
//!
//! ### Counter
//!
//! [`GCounter`] maps node identifiers to non-negative counts. Its join
//! ([`GCounter::merge`], [`GCounter::merge_all`]) is commutative, associative
//! and idempotent. Slots only ever grow.
//!
//! ### Snapshot
//!
//! [`Snapshot`] is the owned, read-only view of a counter that crosses the
//! process boundary. Its JSON form is a plain object of node to count.
//!
//! ### Sync Round
//!
//! [`SyncRound`] models one synchronization attempt:
//! `Idle -> Fetching -> Done`. The caller enumerates peers, records what each
//! peer returned (or why it failed), and finishes with a [`SyncReport`]
//! holding the folded counter. A failed peer never discards the
//! contributions of the others.
//!
//! ## Quick Start
//!
//! ```rust
//! use gcounter_engine::{GCounter, PeerOutcome, Snapshot, SyncRound};
//!
//! let mut local = GCounter::new("node-a");
//! local.increment("node-a");
//!
//! let mut round = SyncRound::new(local);
//! round.enumerate(["node-b", "node-c"]).unwrap();
//!
//! let view = Snapshot::from_json(r#"{"node-b": 4}"#).unwrap();
//! round.record("node-b", PeerOutcome::Fetched(view)).unwrap();
//! round
//!     .record("node-c", PeerOutcome::Failed("connection refused".into()))
//!     .unwrap();
//!
//! let report = round.finish();
//! assert_eq!(report.counter.total(), 5);
//! assert_eq!(report.failed().count(), 1);
//! ```

pub mod counter;
pub mod error;
pub mod snapshot;
pub mod sync;

// Re-export main types at crate root
pub use counter::GCounter;
pub use error::Error;
pub use snapshot::Snapshot;
pub use sync::{PeerOutcome, PeerReport, PeerStatus, SyncPhase, SyncReport, SyncRound};

/// Type aliases for clarity
pub type NodeId = String;
pub type Count = u64;

/// Node identifier used when a process is started without one.
pub const DEFAULT_NODE_ID: &str = "node";
