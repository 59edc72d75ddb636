//! Anti-entropy driver.
//!
//! [`SyncEngine`] runs a [`SyncRound`] against real peers: it enumerates
//! them, fetches every snapshot concurrently, and records each outcome.
//! Peer errors stop here; they are logged, remembered in the
//! [`PeerHealthTable`], and turned into "this peer contributed nothing".

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use gcounter_engine::{GCounter, NodeId, PeerOutcome, SyncPhase, SyncReport, SyncRound};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;
use uuid::Uuid;

use crate::peers::{PeerClient, PeerHealthTable, PeerSource};
use crate::state::CounterStore;

/// Pulls peer state and folds it into a local counter.
pub struct SyncEngine {
    peers: Arc<dyn PeerSource>,
    client: Arc<dyn PeerClient>,
    health: PeerHealthTable,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl SyncEngine {
    pub fn new(peers: Arc<dyn PeerSource>, client: Arc<dyn PeerClient>) -> Self {
        Self {
            peers,
            client,
            health: PeerHealthTable::new(),
            last_sync: Mutex::new(None),
        }
    }

    /// Whether any peer is configured right now.
    pub fn has_peers(&self) -> bool {
        !self.peers.peers().is_empty()
    }

    pub fn peers(&self) -> Vec<NodeId> {
        self.peers.peers()
    }

    pub fn health(&self) -> &PeerHealthTable {
        &self.health
    }

    /// When the last round that reached the fetch phase finished.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.lock()
    }

    /// Run one round starting from `local` and return the folded result.
    ///
    /// Never fails: unreachable or misbehaving peers are reported in the
    /// returned [`SyncReport`] and skipped.
    pub async fn sync(&self, local: GCounter) -> SyncReport {
        let round_id = Uuid::new_v4();
        let span = tracing::debug_span!("gcounter_sync", round = %round_id);

        async move {
            let mut round = SyncRound::new(local);

            match round.enumerate(self.peers.peers()) {
                Ok(SyncPhase::Done) => {
                    tracing::debug!("nil peers present, skipping gcounter sync");
                    return round.finish();
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "could not start gcounter sync");
                    return round.finish();
                }
            }

            let targets = round.pending().to_vec();
            let results = join_all(targets.iter().map(|peer| self.client.fetch(peer))).await;

            for (peer, result) in targets.iter().zip(results) {
                let outcome = match result {
                    Ok(snapshot) => PeerOutcome::Fetched(snapshot),
                    Err(e) => {
                        tracing::warn!(
                            peer = %peer,
                            error = %e,
                            "failed sending gcounter values request"
                        );
                        PeerOutcome::Failed(e.to_string())
                    }
                };

                if let Err(e) = round.record(peer, outcome) {
                    tracing::warn!(peer = %peer, error = %e, "dropped peer outcome");
                }
            }

            let report = round.finish();
            let now = Utc::now();
            self.health.observe(&report, now);
            *self.last_sync.lock() = Some(now);

            tracing::debug!(
                merged = report.merged().count(),
                failed = report.failed().count(),
                total = report.counter.total(),
                "successful gcounter sync"
            );

            report
        }
        .instrument(span)
        .await
    }

    /// Run a round from the store's current state and absorb the result.
    ///
    /// A reset that lands while the round is in flight stays in effect.
    pub async fn sync_into(&self, store: &CounterStore) -> SyncReport {
        let (local, epoch) = store.checkout();
        let report = self.sync(local).await;
        store.absorb_round(epoch, &report);
        report
    }
}

/// Spawn a task that syncs `store` every `interval`.
///
/// The first round runs one full interval after startup. Read-triggered
/// syncs keep working alongside it.
pub fn spawn_background(
    engine: Arc<SyncEngine>,
    store: Arc<CounterStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = engine.sync_into(&store).await;
            if !report.is_clean() {
                tracing::info!(
                    failed = report.failed().count(),
                    "background gcounter sync finished with unreachable peers"
                );
            }
        }
    })
}
