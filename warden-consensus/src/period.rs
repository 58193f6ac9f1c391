//! Detection periods.
//!
//! A period groups consecutive rounds and accumulates, per node, how many
//! times it was judged and how those judgements ended.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use warden_core::{NodeId, Timestamp};

use crate::votes::Outcome;

/// Per-node counters within one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Rounds in which the node was a subject.
    pub selected: u64,
    /// Tallies that completed with a pass.
    pub passed: u64,
    /// Tallies that completed with a fail.
    pub failed: u64,
}

impl NodeStats {
    /// Rounds in which the node was a subject but no majority formed.
    pub fn unresolved(&self) -> u64 {
        self.selected.saturating_sub(self.passed + self.failed)
    }
}

/// Read-only per-node state of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePeriodState {
    pub node: NodeId,
    pub pass_count: u64,
    pub fail_count: u64,
    /// Selections without a completed tally. While the period is active
    /// this includes tallies that may still complete.
    pub unresolved: u64,
}

/// A detection period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionPeriod {
    pub id: u64,
    pub started_at: Timestamp,
    pub first_round: u64,
    pub last_round: u64,
    stats: BTreeMap<NodeId, NodeStats>,
}

impl DetectionPeriod {
    /// Start a period with its first round.
    pub fn new(id: u64, started_at: Timestamp, first_round: u64) -> Self {
        Self {
            id,
            started_at,
            first_round,
            last_round: first_round,
            stats: BTreeMap::new(),
        }
    }

    /// Check if a round opened at `at` still belongs to this period.
    pub fn contains_time(&self, at: Timestamp, detect_duration_secs: u64) -> bool {
        at < self.started_at.plus(detect_duration_secs)
    }

    /// Attach a round and count its subjects as selected.
    pub fn add_round(&mut self, round_id: u64, subjects: &[NodeId]) {
        self.last_round = round_id;
        for subject in subjects {
            self.stats.entry(*subject).or_default().selected += 1;
        }
    }

    /// Record a completed tally.
    pub fn record(&mut self, subject: NodeId, outcome: Outcome) {
        let stats = self.stats.entry(subject).or_default();
        match outcome {
            Outcome::Pass => stats.passed += 1,
            Outcome::Fail => stats.failed += 1,
        }
    }

    /// Counters for `node`.
    pub fn stats(&self, node: &NodeId) -> NodeStats {
        self.stats.get(node).copied().unwrap_or_default()
    }

    /// Every node that was ever a subject, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeStats)> {
        self.stats.iter()
    }

    /// Number of rounds in the period.
    pub fn round_count(&self) -> u64 {
        self.last_round - self.first_round + 1
    }

    /// Per-node states ordered by id.
    pub fn states(&self) -> Vec<NodePeriodState> {
        self.stats
            .iter()
            .map(|(node, s)| NodePeriodState {
                node: *node,
                pass_count: s.passed,
                fail_count: s.failed,
                unresolved: s.unresolved(),
            })
            .collect()
    }
}
