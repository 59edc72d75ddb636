//! Per-peer health tracking.
//!
//! Records the outcome of every sync attempt against each peer so that
//! repeated failures are visible on the health endpoint instead of only in
//! the logs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gcounter_engine::{NodeId, PeerStatus, SyncReport};
use serde::Serialize;

/// Last known state of one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerHealth {
    pub last_attempt: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PeerHealth {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            last_attempt: at,
            last_success: None,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures == 0
    }
}

/// Thread-safe peer health table, owned by the sync engine.
#[derive(Debug, Default)]
pub struct PeerHealthTable {
    entries: DashMap<NodeId, PeerHealth>,
}

impl PeerHealthTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn record_success(&self, peer: &str, at: DateTime<Utc>) {
        let mut entry = self
            .entries
            .entry(peer.to_string())
            .or_insert_with(|| PeerHealth::new(at));
        entry.last_attempt = at;
        entry.last_success = Some(at);
        entry.consecutive_failures = 0;
        entry.last_error = None;
    }

    pub fn record_failure(&self, peer: &str, reason: &str, at: DateTime<Utc>) {
        let mut entry = self
            .entries
            .entry(peer.to_string())
            .or_insert_with(|| PeerHealth::new(at));
        entry.last_attempt = at;
        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
        entry.last_error = Some(reason.to_string());
    }

    /// Fold every peer line of a finished round into the table.
    pub fn observe(&self, report: &SyncReport, at: DateTime<Utc>) {
        for line in &report.peers {
            match &line.status {
                PeerStatus::Merged { .. } | PeerStatus::Empty => {
                    self.record_success(&line.peer, at);
                }
                PeerStatus::Failed { reason } => self.record_failure(&line.peer, reason, at),
                PeerStatus::Missing => self.record_failure(&line.peer, "no response", at),
            }
        }
    }

    pub fn get(&self, peer: &str) -> Option<PeerHealth> {
        self.entries.get(peer).map(|entry| entry.value().clone())
    }

    /// Sorted copy of the table.
    pub fn snapshot(&self) -> BTreeMap<NodeId, PeerHealth> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcounter_engine::{GCounter, PeerReport};

    #[test]
    fn failures_accumulate_until_success() {
        let table = PeerHealthTable::new();
        let now = Utc::now();

        table.record_failure("P1", "timeout", now);
        table.record_failure("P1", "status 500", now);
        let health = table.get("P1").unwrap();
        assert_eq!(health.consecutive_failures, 2);
        assert_eq!(health.last_error.as_deref(), Some("status 500"));
        assert!(!health.is_healthy());

        table.record_success("P1", now);
        let health = table.get("P1").unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.last_success, Some(now));
        assert_eq!(health.last_error, None);
    }

    #[test]
    fn observe_maps_report_lines() {
        let table = PeerHealthTable::new();
        let report = SyncReport {
            counter: GCounter::new("P0"),
            remote: GCounter::default(),
            peers: vec![
                PeerReport {
                    peer: "P1".into(),
                    status: PeerStatus::Merged { slots: 2 },
                },
                PeerReport {
                    peer: "P2".into(),
                    status: PeerStatus::Failed {
                        reason: "refused".into(),
                    },
                },
                PeerReport {
                    peer: "P3".into(),
                    status: PeerStatus::Missing,
                },
            ],
            no_peers: false,
        };

        assert!(table.is_empty());
        table.observe(&report, Utc::now());

        assert_eq!(table.len(), 3);
        assert!(table.get("P1").unwrap().is_healthy());
        assert_eq!(
            table.get("P2").unwrap().last_error.as_deref(),
            Some("refused")
        );
        assert_eq!(
            table.get("P3").unwrap().last_error.as_deref(),
            Some("no response")
        );
        assert_eq!(
            table.snapshot().keys().collect::<Vec<_>>(),
            vec!["P1", "P2", "P3"]
        );
    }
}
