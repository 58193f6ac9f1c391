//! Voting rounds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use warden_core::{Hash, NodeId, Timestamp};

use crate::sortition::Draw;
use crate::votes::{TallyView, VoteTally};

/// Lifecycle phase of a round, derived from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    /// Clock reads earlier than the opening time.
    Pending,
    /// Votes are accepted.
    Open,
    /// The vote window has elapsed.
    Closed,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundPhase::Pending => write!(f, "pending"),
            RoundPhase::Open => write!(f, "open"),
            RoundPhase::Closed => write!(f, "closed"),
        }
    }
}

/// One sortition round: its subjects, their committees and the tallies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: u64,
    /// Detection period this round belongs to.
    pub period_id: u64,
    pub opened_at: Timestamp,
    /// Vote window length.
    pub window_secs: u64,
    /// Sortition seed the draw was made from.
    pub seed: Hash,
    subjects: Vec<NodeId>,
    tallies: BTreeMap<NodeId, VoteTally>,
}

impl Round {
    /// Create a round from a draw.
    pub fn new(
        id: u64,
        period_id: u64,
        opened_at: Timestamp,
        window_secs: u64,
        seed: Hash,
        draw: Draw,
    ) -> Self {
        let Draw {
            subjects,
            mut committees,
        } = draw;
        let tallies = subjects
            .iter()
            .map(|s| (*s, VoteTally::new(committees.remove(s).unwrap_or_default())))
            .collect();

        Self {
            id,
            period_id,
            opened_at,
            window_secs,
            seed,
            subjects,
            tallies,
        }
    }

    /// First instant at which votes are no longer accepted.
    pub fn closes_at(&self) -> Timestamp {
        self.opened_at.plus(self.window_secs)
    }

    /// Phase at `now`.
    pub fn phase(&self, now: Timestamp) -> RoundPhase {
        if now < self.opened_at {
            RoundPhase::Pending
        } else if now < self.closes_at() {
            RoundPhase::Open
        } else {
            RoundPhase::Closed
        }
    }

    /// Check if votes are accepted at `now`.
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.phase(now) == RoundPhase::Open
    }

    /// Subjects in draw order.
    pub fn subjects(&self) -> &[NodeId] {
        &self.subjects
    }

    /// Check if `node` is judged in this round.
    pub fn is_subject(&self, node: &NodeId) -> bool {
        self.tallies.contains_key(node)
    }

    /// Committee judging `subject`.
    pub fn committee(&self, subject: &NodeId) -> Option<&[NodeId]> {
        self.tallies.get(subject).map(|t| t.committee())
    }

    /// Tally for `subject`.
    pub fn tally(&self, subject: &NodeId) -> Option<&VoteTally> {
        self.tallies.get(subject)
    }

    pub(crate) fn tally_mut(&mut self, subject: &NodeId) -> Option<&mut VoteTally> {
        self.tallies.get_mut(subject)
    }

    /// Every tally, ordered by subject id.
    pub fn tallies(&self) -> impl Iterator<Item = (&NodeId, &VoteTally)> {
        self.tallies.iter()
    }

    /// Summaries of every tally, ordered by subject id.
    pub fn summary(&self) -> Vec<(NodeId, TallyView)> {
        self.tallies.iter().map(|(s, t)| (*s, t.view())).collect()
    }

    /// Subjects whose tally never reached a majority.
    pub fn unresolved(&self) -> usize {
        self.tallies.values().filter(|t| !t.is_completed()).count()
    }
}
