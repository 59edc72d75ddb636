//! Anti-entropy state machine for a single synchronization attempt.
//!
//! A [`SyncRound`] walks through three phases:
//!
//! 1. **Idle**: holds a working copy of the local counter.
//! 2. **Fetching**: peers have been enumerated; each one reports a
//!    [`PeerOutcome`] exactly once.
//! 3. **Done**: every peer has reported, or there were no peers at all.
//!
//! The round never performs IO. The caller fetches peer snapshots however it
//! likes (sequentially, concurrently, over any transport) and records what
//! happened. Because the join is commutative and associative, the order in
//! which outcomes are recorded does not change the folded counter.

use crate::{error::Result, Error, GCounter, NodeId, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Phase of a synchronization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Idle => write!(f, "idle"),
            SyncPhase::Fetching => write!(f, "fetching"),
            SyncPhase::Done => write!(f, "done"),
        }
    }
}

/// What fetching one peer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerOutcome {
    /// The peer answered with a decodable snapshot.
    Fetched(Snapshot),
    /// Transport error, timeout, bad status or malformed payload.
    Failed(String),
}

/// How a peer contributed to the round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PeerStatus {
    /// Snapshot was folded into the counter.
    Merged { slots: usize },
    /// Peer answered with no slots; nothing to merge.
    Empty,
    /// Peer could not be used.
    Failed { reason: String },
    /// Round finished before the peer reported.
    Missing,
}

/// Per-peer line of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReport {
    pub peer: NodeId,
    #[serde(flatten)]
    pub status: PeerStatus,
}

impl PeerReport {
    pub fn is_failure(&self) -> bool {
        matches!(
            self.status,
            PeerStatus::Failed { .. } | PeerStatus::Missing
        )
    }
}

/// Result of a finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Local counter with every usable peer view folded in.
    pub counter: GCounter,
    /// Join of the fetched peer views alone, without the local state.
    pub remote: GCounter,
    /// One entry per enumerated peer, in the order outcomes were recorded.
    pub peers: Vec<PeerReport>,
    /// Set when the peer list was empty.
    pub no_peers: bool,
}

impl SyncReport {
    /// Peers whose snapshot was merged.
    pub fn merged(&self) -> impl Iterator<Item = &PeerReport> {
        self.peers
            .iter()
            .filter(|report| matches!(report.status, PeerStatus::Merged { .. }))
    }

    /// Peers that contributed nothing because they failed or never reported.
    pub fn failed(&self) -> impl Iterator<Item = &PeerReport> {
        self.peers.iter().filter(|report| report.is_failure())
    }

    /// True when no peer failed.
    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// One synchronization attempt against a set of peers.
#[derive(Debug, Clone)]
pub struct SyncRound {
    phase: SyncPhase,
    counter: GCounter,
    remote: GCounter,
    /// Enumerated peers still waiting for an outcome, in enumeration order.
    pending: Vec<NodeId>,
    reports: Vec<PeerReport>,
    no_peers: bool,
}

impl SyncRound {
    /// Start a round from a copy of the local counter.
    pub fn new(local: GCounter) -> Self {
        Self {
            phase: SyncPhase::Idle,
            counter: local,
            remote: GCounter::default(),
            pending: Vec::new(),
            reports: Vec::new(),
            no_peers: false,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Counter folded so far.
    pub fn counter(&self) -> &GCounter {
        &self.counter
    }

    /// Peers that have not reported yet.
    pub fn pending(&self) -> &[NodeId] {
        &self.pending
    }

    /// Fix the peer set for this round.
    ///
    /// Identifiers are trimmed, blanks dropped and duplicates collapsed while
    /// keeping first-seen order. An empty set moves the round straight to
    /// [`SyncPhase::Done`] with the "no peers" flag set.
    pub fn enumerate<I, S>(&mut self, peers: I) -> Result<SyncPhase>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.expect_phase(SyncPhase::Idle)?;

        let mut seen = BTreeSet::new();
        self.pending = peers
            .into_iter()
            .map(|peer| peer.as_ref().trim().to_string())
            .filter(|peer| !peer.is_empty() && seen.insert(peer.clone()))
            .collect();

        if self.pending.is_empty() {
            self.no_peers = true;
            self.phase = SyncPhase::Done;
        } else {
            self.phase = SyncPhase::Fetching;
        }

        Ok(self.phase)
    }

    /// Record what fetching `peer` produced and fold it in.
    ///
    /// Returns the phase after recording; it becomes [`SyncPhase::Done`]
    /// once the last pending peer reports.
    pub fn record(&mut self, peer: &str, outcome: PeerOutcome) -> Result<SyncPhase> {
        self.expect_phase(SyncPhase::Fetching)?;

        if self.reports.iter().any(|report| report.peer == peer) {
            return Err(Error::DuplicateOutcome(peer.to_string()));
        }

        let index = self
            .pending
            .iter()
            .position(|pending| pending == peer)
            .ok_or_else(|| Error::UnknownPeer(peer.to_string()))?;
        let peer = self.pending.remove(index);

        let status = match outcome {
            PeerOutcome::Fetched(snapshot) if snapshot.is_empty() => PeerStatus::Empty,
            PeerOutcome::Fetched(snapshot) => {
                let slots = snapshot.len();
                let view = snapshot.into_counter();
                self.counter.merge(&view);
                self.remote.merge(&view);
                PeerStatus::Merged { slots }
            }
            PeerOutcome::Failed(reason) => PeerStatus::Failed { reason },
        };
        self.reports.push(PeerReport { peer, status });

        if self.pending.is_empty() {
            self.phase = SyncPhase::Done;
        }

        Ok(self.phase)
    }

    /// Close the round and hand back the folded counter.
    ///
    /// Peers that never reported are listed as [`PeerStatus::Missing`].
    /// Finishing an idle round returns the local counter untouched.
    pub fn finish(mut self) -> SyncReport {
        let missing = std::mem::take(&mut self.pending);
        self.reports
            .extend(missing.into_iter().map(|peer| PeerReport {
                peer,
                status: PeerStatus::Missing,
            }));

        SyncReport {
            counter: self.counter,
            remote: self.remote,
            peers: self.reports,
            no_peers: self.no_peers,
        }
    }

    fn expect_phase(&self, expected: SyncPhase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::InvalidSyncState {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> GCounter {
        let mut counter = GCounter::new("P0");
        counter.increment("P0");
        counter
    }

    fn snapshot(json: &str) -> Snapshot {
        Snapshot::from_json(json).unwrap()
    }

    #[test]
    fn new_round_is_idle() {
        let round = SyncRound::new(local());
        assert_eq!(round.phase(), SyncPhase::Idle);
        assert_eq!(round.counter(), &local());
    }

    #[test]
    fn empty_peer_list_finishes_immediately() {
        let mut round = SyncRound::new(local());
        let phase = round.enumerate(Vec::<String>::new()).unwrap();
        assert_eq!(phase, SyncPhase::Done);

        let report = round.finish();
        assert!(report.no_peers);
        assert!(report.peers.is_empty());
        assert_eq!(report.counter.slots(), local().slots());
    }

    #[test]
    fn blank_and_duplicate_peers_are_dropped() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1", " ", "P2", "P1 ", ""]).unwrap();
        assert_eq!(round.pending(), ["P1".to_string(), "P2".to_string()]);
    }

    #[test]
    fn only_blank_peers_count_as_no_peers() {
        let mut round = SyncRound::new(local());
        assert_eq!(round.enumerate(["", "  "]).unwrap(), SyncPhase::Done);
        assert!(round.finish().no_peers);
    }

    #[test]
    fn failed_peer_does_not_discard_others() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1", "P2"]).unwrap();

        round
            .record("P1", PeerOutcome::Failed("status 500".into()))
            .unwrap();
        let phase = round
            .record("P2", PeerOutcome::Fetched(snapshot(r#"{"P2": 10}"#)))
            .unwrap();
        assert_eq!(phase, SyncPhase::Done);

        let report = round.finish();
        assert_eq!(report.counter.count_for("P0"), 1);
        assert_eq!(report.counter.count_for("P2"), 10);
        assert_eq!(report.counter.total(), 11);
        assert_eq!(report.merged().count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn remote_holds_peer_views_only() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1", "P2"]).unwrap();
        round
            .record("P1", PeerOutcome::Fetched(snapshot(r#"{"P1": 3, "P0": 0}"#)))
            .unwrap();
        round
            .record("P2", PeerOutcome::Failed("refused".into()))
            .unwrap();

        let report = round.finish();
        assert_eq!(report.remote.count_for("P0"), 0);
        assert_eq!(report.remote.count_for("P1"), 3);
        assert_eq!(report.counter.count_for("P0"), 1);
        assert_eq!(report.counter, report.remote.join(&local()));
    }

    #[test]
    fn empty_snapshot_is_skipped() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1"]).unwrap();
        round
            .record("P1", PeerOutcome::Fetched(Snapshot::new()))
            .unwrap();

        let report = round.finish();
        assert_eq!(report.peers[0].status, PeerStatus::Empty);
        assert_eq!(report.counter.slots(), local().slots());
        assert!(report.is_clean());
    }

    #[test]
    fn peer_view_never_lowers_local_slot() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1"]).unwrap();
        round
            .record("P1", PeerOutcome::Fetched(snapshot(r#"{"P0": 0, "P1": 2}"#)))
            .unwrap();

        let report = round.finish();
        assert_eq!(report.counter.count_for("P0"), 1);
        assert_eq!(report.counter.count_for("P1"), 2);
    }

    #[test]
    fn unreported_peers_are_missing() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1", "P2"]).unwrap();
        round
            .record("P2", PeerOutcome::Fetched(snapshot(r#"{"P2": 1}"#)))
            .unwrap();

        let report = round.finish();
        assert_eq!(report.peers.len(), 2);
        assert_eq!(report.peers[1].peer, "P1");
        assert_eq!(report.peers[1].status, PeerStatus::Missing);
        assert_eq!(report.counter.total(), 2);
    }

    #[test]
    fn record_before_enumerate_is_rejected() {
        let mut round = SyncRound::new(local());
        let err = round
            .record("P1", PeerOutcome::Fetched(Snapshot::new()))
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSyncState {
                expected: SyncPhase::Fetching,
                actual: SyncPhase::Idle,
            }
        );
    }

    #[test]
    fn enumerate_twice_is_rejected() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1"]).unwrap();
        assert!(matches!(
            round.enumerate(["P2"]),
            Err(Error::InvalidSyncState { .. })
        ));
    }

    #[test]
    fn unknown_and_duplicate_peers_are_rejected() {
        let mut round = SyncRound::new(local());
        round.enumerate(["P1", "P2"]).unwrap();

        assert_eq!(
            round.record("P9", PeerOutcome::Failed("x".into())),
            Err(Error::UnknownPeer("P9".into()))
        );

        round.record("P1", PeerOutcome::Failed("x".into())).unwrap();
        assert_eq!(
            round.record("P1", PeerOutcome::Failed("x".into())),
            Err(Error::DuplicateOutcome("P1".into()))
        );
    }

    #[test]
    fn outcome_order_does_not_change_result() {
        let views = [
            ("P1", r#"{"P1": 4, "P2": 1}"#),
            ("P2", r#"{"P2": 6}"#),
            ("P3", r#"{"P1": 2, "P3": 9}"#),
        ];

        let run = |order: &[usize]| {
            let mut round = SyncRound::new(local());
            round.enumerate(views.iter().map(|(peer, _)| *peer)).unwrap();
            for &i in order {
                let (peer, json) = views[i];
                round
                    .record(peer, PeerOutcome::Fetched(snapshot(json)))
                    .unwrap();
            }
            round.finish().counter
        };

        let forward = run(&[0, 1, 2]);
        assert_eq!(forward, run(&[2, 0, 1]));
        assert_eq!(forward, run(&[1, 2, 0]));
        assert_eq!(forward.total(), 1 + 4 + 6 + 9);
    }

    #[test]
    fn report_serialization_format() {
        let report = PeerReport {
            peer: "P1".into(),
            status: PeerStatus::Failed {
                reason: "timeout".into(),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"peer": "P1", "status": "failed", "reason": "timeout"})
        );
    }
}
