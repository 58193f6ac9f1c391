//! Workload accounting.
//!
//! Each subject has a cumulative total, the last accepted epoch and a short
//! bucketed log of recent workload. Buckets older than the retention horizon
//! are dropped on every write for that subject, so the log stays bounded no
//! matter how long a node has been reporting.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use warden_core::{NodeId, Timestamp};

use crate::error::{AttestationError, Result};
use crate::message::WorkloadPayload;

/// An accepted workload report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadReport {
    pub subject: NodeId,
    pub reporter: NodeId,
    pub epoch_id: u64,
    pub payload: WorkloadPayload,
    /// Distinct eligible signers that backed the report.
    pub signers: Vec<NodeId>,
    pub accepted_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Bucket {
    start: Timestamp,
    amount: u64,
}

/// Per-subject accounting state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectWorkload {
    pub last_epoch: u64,
    pub total: u64,
    pub reports: u64,
    buckets: VecDeque<Bucket>,
}

impl SubjectWorkload {
    /// Number of retained buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

/// Workload ledger over all subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadLedger {
    bucket_secs: u64,
    horizon_secs: u64,
    subjects: BTreeMap<NodeId, SubjectWorkload>,
}

impl WorkloadLedger {
    /// Create a ledger. `bucket_secs` must be positive.
    pub fn new(bucket_secs: u64, horizon_secs: u64) -> Self {
        Self {
            bucket_secs: bucket_secs.max(1),
            horizon_secs,
            subjects: BTreeMap::new(),
        }
    }

    /// Last accepted epoch for a subject; zero if none.
    pub fn last_epoch(&self, subject: &NodeId) -> u64 {
        self.subjects.get(subject).map(|s| s.last_epoch).unwrap_or(0)
    }

    /// Cumulative workload of a subject.
    pub fn total(&self, subject: &NodeId) -> u64 {
        self.subjects.get(subject).map(|s| s.total).unwrap_or(0)
    }

    /// Workload recorded in buckets overlapping `(now - window, now]`.
    ///
    /// The answer is bounded by the retention horizon regardless of `window`.
    pub fn recent(&self, subject: &NodeId, window_secs: u64, now: Timestamp) -> u64 {
        let Some(state) = self.subjects.get(subject) else {
            return 0;
        };
        let cutoff = now.minus(window_secs.min(self.horizon_secs));
        state
            .buckets
            .iter()
            .filter(|b| b.start.plus(self.bucket_secs) > cutoff)
            .fold(0u64, |acc, b| acc.saturating_add(b.amount))
    }

    /// Accounting state of a subject.
    pub fn subject(&self, subject: &NodeId) -> Option<&SubjectWorkload> {
        self.subjects.get(subject)
    }

    /// Subjects with any recorded workload.
    pub fn subjects(&self) -> impl Iterator<Item = (&NodeId, &SubjectWorkload)> {
        self.subjects.iter()
    }

    /// Check that `report` could be recorded without overflowing.
    pub fn check(&self, report: &WorkloadReport) -> Result<()> {
        self.total(&report.subject)
            .checked_add(report.payload.workload)
            .map(|_| ())
            .ok_or(AttestationError::Overflow(report.subject))
    }

    /// Record an accepted report.
    ///
    /// Callers validate epoch ordering beforehand; this only accounts.
    pub fn record(&mut self, report: &WorkloadReport) -> Result<()> {
        self.check(report)?;

        let bucket_secs = self.bucket_secs;
        let horizon = self.horizon_secs;
        let now = report.accepted_at;
        let state = self.subjects.entry(report.subject).or_default();

        state.total += report.payload.workload;
        state.last_epoch = report.epoch_id;
        state.reports += 1;

        let start = Timestamp(now.secs() - now.secs() % bucket_secs);
        match state.buckets.back_mut() {
            Some(bucket) if bucket.start == start => {
                bucket.amount = bucket.amount.saturating_add(report.payload.workload)
            }
            _ => state.buckets.push_back(Bucket {
                start,
                amount: report.payload.workload,
            }),
        }

        let cutoff = now.minus(horizon);
        let before = state.buckets.len();
        while state
            .buckets
            .front()
            .is_some_and(|b| b.start.plus(bucket_secs) <= cutoff)
        {
            state.buckets.pop_front();
        }
        let pruned = before - state.buckets.len();
        if pruned > 0 {
            debug!(subject = %report.subject, pruned, "Pruned expired workload buckets");
        }

        Ok(())
    }
}
