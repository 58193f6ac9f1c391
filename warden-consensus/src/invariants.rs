//! Runtime invariant checks over governance snapshots.
//!
//! Each invariant checks a single snapshot and/or the transition between
//! two snapshots taken before and after an operation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::GovernanceSnapshot;
use crate::votes::VoteTally;

/// An invariant that must hold.
pub trait Invariant<S> {
    /// Name of this invariant.
    fn name(&self) -> &str;

    /// Check if the invariant holds for a state.
    fn check(&self, state: &S) -> Result<(), InvariantViolation>;

    /// Check if the invariant holds across a transition.
    fn check_transition(&self, old: &S, new: &S) -> Result<(), InvariantViolation>;
}

/// Violation of an invariant.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("invariant '{name}' violated: {message}")]
pub struct InvariantViolation {
    pub name: String,
    pub message: String,
    /// Round at which the violation was observed.
    pub round: Option<u64>,
}

impl InvariantViolation {
    /// Create a new violation.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            round: None,
        }
    }

    /// Add round context.
    pub fn at_round(mut self, round: u64) -> Self {
        self.round = Some(round);
        self
    }
}

/// Round ids in a snapshot are consecutive and never go backwards.
#[derive(Debug, Clone, Copy)]
pub struct ConsecutiveRounds;

impl Invariant<GovernanceSnapshot> for ConsecutiveRounds {
    fn name(&self) -> &str {
        "consecutive_rounds"
    }

    fn check(&self, state: &GovernanceSnapshot) -> Result<(), InvariantViolation> {
        for pair in state.rounds.windows(2) {
            if pair[1].id != pair[0].id + 1 {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("round gap: {} -> {}", pair[0].id, pair[1].id),
                )
                .at_round(pair[1].id));
            }
            if pair[1].opened_at < pair[0].opened_at.plus(pair[0].window_secs) {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("round {} opened before round {} closed", pair[1].id, pair[0].id),
                )
                .at_round(pair[1].id));
            }
        }
        Ok(())
    }

    fn check_transition(
        &self,
        old: &GovernanceSnapshot,
        new: &GovernanceSnapshot,
    ) -> Result<(), InvariantViolation> {
        let last = |s: &GovernanceSnapshot| s.rounds.last().map(|r| r.id).unwrap_or(0);
        if last(new) < last(old) {
            return Err(InvariantViolation::new(
                self.name(),
                format!("current round went backwards: {} -> {}", last(old), last(new)),
            ));
        }
        Ok(())
    }
}

/// Tallies stay within their committee and agree with their outcome.
#[derive(Debug, Clone, Copy)]
pub struct TallyBound;

impl TallyBound {
    fn check_tally(&self, round: u64, tally: &VoteTally) -> Result<(), InvariantViolation> {
        let committee: BTreeSet<_> = tally.committee().iter().collect();
        let size = tally.committee().len() as u32;

        if committee.len() != tally.committee().len() {
            return Err(InvariantViolation::new(self.name(), "duplicate committee member")
                .at_round(round));
        }
        if tally.yes() + tally.no() > size {
            return Err(InvariantViolation::new(
                self.name(),
                format!("{} votes for a committee of {}", tally.yes() + tally.no(), size),
            )
            .at_round(round));
        }
        if let Some(outsider) = tally.voters().find(|v| !committee.contains(v)) {
            return Err(InvariantViolation::new(
                self.name(),
                format!("{outsider} counted without a committee seat"),
            )
            .at_round(round));
        }
        if tally.voters().count() as u32 != tally.yes() + tally.no() {
            return Err(InvariantViolation::new(self.name(), "voter set and counts disagree")
                .at_round(round));
        }

        let decided = tally.yes() >= tally.threshold() || tally.no() >= tally.threshold();
        if decided != tally.is_completed() {
            return Err(InvariantViolation::new(
                self.name(),
                format!(
                    "completion flag {} with yes={} no={} threshold={}",
                    tally.is_completed(),
                    tally.yes(),
                    tally.no(),
                    tally.threshold()
                ),
            )
            .at_round(round));
        }
        Ok(())
    }
}

impl Invariant<GovernanceSnapshot> for TallyBound {
    fn name(&self) -> &str {
        "tally_bound"
    }

    fn check(&self, state: &GovernanceSnapshot) -> Result<(), InvariantViolation> {
        for round in &state.rounds {
            for (subject, tally) in round.tallies() {
                if tally.is_member(subject) {
                    return Err(InvariantViolation::new(
                        self.name(),
                        format!("{subject} sits on its own committee"),
                    )
                    .at_round(round.id));
                }
                self.check_tally(round.id, tally)?;
            }
        }
        Ok(())
    }

    fn check_transition(
        &self,
        _old: &GovernanceSnapshot,
        new: &GovernanceSnapshot,
    ) -> Result<(), InvariantViolation> {
        self.check(new)
    }
}

/// A completed tally never changes again.
#[derive(Debug, Clone, Copy)]
pub struct CompletionTerminal;

impl Invariant<GovernanceSnapshot> for CompletionTerminal {
    fn name(&self) -> &str {
        "completion_terminal"
    }

    fn check(&self, _state: &GovernanceSnapshot) -> Result<(), InvariantViolation> {
        Ok(())
    }

    fn check_transition(
        &self,
        old: &GovernanceSnapshot,
        new: &GovernanceSnapshot,
    ) -> Result<(), InvariantViolation> {
        let new_rounds: BTreeMap<u64, _> = new.rounds.iter().map(|r| (r.id, r)).collect();
        for round in &old.rounds {
            // Pruned rounds are allowed to disappear.
            let Some(after) = new_rounds.get(&round.id) else {
                continue;
            };
            for (subject, before) in round.tallies().filter(|(_, t)| t.is_completed()) {
                if after.tally(subject) != Some(before) {
                    return Err(InvariantViolation::new(
                        self.name(),
                        format!("completed tally for {subject} changed"),
                    )
                    .at_round(round.id));
                }
            }
        }
        Ok(())
    }
}

/// Settlements are created once and never change.
#[derive(Debug, Clone, Copy)]
pub struct SettlementFrozen;

impl Invariant<GovernanceSnapshot> for SettlementFrozen {
    fn name(&self) -> &str {
        "settlement_frozen"
    }

    fn check(&self, state: &GovernanceSnapshot) -> Result<(), InvariantViolation> {
        for (i, settlement) in state.settlements.iter().enumerate() {
            if settlement.period_id != i as u64 + 1 {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("settlement {} out of order", settlement.period_id),
                ));
            }
            let sum: u64 = settlement.nodes.iter().map(|n| n.quota).sum();
            if sum != settlement.total_quota {
                return Err(InvariantViolation::new(
                    self.name(),
                    format!(
                        "period {} quotas sum to {} but total is {}",
                        settlement.period_id, sum, settlement.total_quota
                    ),
                ));
            }
        }
        Ok(())
    }

    fn check_transition(
        &self,
        old: &GovernanceSnapshot,
        new: &GovernanceSnapshot,
    ) -> Result<(), InvariantViolation> {
        if new.settlements.len() < old.settlements.len()
            || new.settlements[..old.settlements.len()] != old.settlements[..]
        {
            return Err(InvariantViolation::new(
                self.name(),
                "an existing settlement changed or disappeared",
            ));
        }
        Ok(())
    }
}

/// Collection of governance invariants.
#[derive(Debug, Clone, Copy, Default)]
pub struct GovernanceInvariants {
    pub consecutive_rounds: bool,
    pub tally_bound: bool,
    pub completion_terminal: bool,
    pub settlement_frozen: bool,
}

impl GovernanceInvariants {
    /// Create with all invariants enabled.
    pub fn all() -> Self {
        Self {
            consecutive_rounds: true,
            tally_bound: true,
            completion_terminal: true,
            settlement_frozen: true,
        }
    }

    /// Verify a single snapshot.
    pub fn verify(&self, state: &GovernanceSnapshot) -> Result<(), InvariantViolation> {
        if self.consecutive_rounds {
            ConsecutiveRounds.check(state)?;
        }
        if self.tally_bound {
            TallyBound.check(state)?;
        }
        if self.settlement_frozen {
            SettlementFrozen.check(state)?;
        }
        Ok(())
    }

    /// Verify a transition between two snapshots.
    pub fn verify_transition(
        &self,
        old: &GovernanceSnapshot,
        new: &GovernanceSnapshot,
    ) -> Result<(), InvariantViolation> {
        if self.consecutive_rounds {
            ConsecutiveRounds.check_transition(old, new)?;
        }
        if self.tally_bound {
            TallyBound.check_transition(old, new)?;
        }
        if self.completion_terminal {
            CompletionTerminal.check_transition(old, new)?;
        }
        if self.settlement_frozen {
            SettlementFrozen.check_transition(old, new)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::Round;
    use crate::settlement::Settlement;
    use crate::sortition::{self, Draw};
    use warden_core::{hash, NodeId, Timestamp};

    fn round(id: u64, opened_at: u64) -> Round {
        let active: Vec<NodeId> = (1..=4).map(|i| NodeId([i; 32])).collect();
        let seed = hash(&id.to_le_bytes());
        Round::new(
            id,
            1,
            Timestamp(opened_at),
            100,
            seed,
            sortition::draw(&active, &seed, 3, None),
        )
    }

    fn snapshot(rounds: Vec<Round>) -> GovernanceSnapshot {
        GovernanceSnapshot {
            rounds,
            ..Default::default()
        }
    }

    #[test]
    fn test_consecutive_rounds() {
        let ok = snapshot(vec![round(1, 100), round(2, 200)]);
        assert!(ConsecutiveRounds.check(&ok).is_ok());

        let gap = snapshot(vec![round(1, 100), round(3, 200)]);
        let err = ConsecutiveRounds.check(&gap).unwrap_err();
        assert_eq!(err.round, Some(3));

        let overlap = snapshot(vec![round(1, 100), round(2, 150)]);
        assert!(ConsecutiveRounds.check(&overlap).is_err());
    }

    #[test]
    fn test_completion_terminal() {
        let mut r = round(1, 100);
        let subject = r.subjects()[0];
        let members = r.committee(&subject).unwrap().to_vec();
        let tally = r.tally_mut(&subject).unwrap();
        tally.cast(1, subject, members[0], true, Timestamp(110)).unwrap();
        tally.cast(1, subject, members[1], true, Timestamp(111)).unwrap();
        let old = snapshot(vec![r.clone()]);

        assert!(CompletionTerminal.check_transition(&old, &old.clone()).is_ok());

        let mut fresh = r;
        *fresh.tally_mut(&subject).unwrap() = VoteTally::new(members);
        let new = snapshot(vec![fresh]);
        assert!(CompletionTerminal.check_transition(&old, &new).is_err());

        // Pruning a round is not a change.
        assert!(CompletionTerminal.check_transition(&old, &snapshot(vec![])).is_ok());
    }

    #[test]
    fn test_tally_bound_accepts_engine_tallies() {
        let snap = snapshot(vec![round(1, 100)]);
        assert!(TallyBound.check(&snap).is_ok());

        let subject = NodeId([1; 32]);
        let draw = Draw {
            subjects: vec![subject],
            committees: [(subject, vec![subject, NodeId([2; 32])])].into_iter().collect(),
        };
        let bad = Round::new(1, 1, Timestamp(0), 100, hash(b"x"), draw);
        assert!(TallyBound.check(&snapshot(vec![bad])).is_err());
    }

    #[test]
    fn test_settlement_frozen() {
        let settlement = |period_id, total_quota| Settlement {
            period_id,
            settled_at: Timestamp(0),
            nodes: vec![],
            total_quota,
        };
        let old = GovernanceSnapshot {
            settlements: vec![settlement(1, 0)],
            ..Default::default()
        };
        let new = GovernanceSnapshot {
            settlements: vec![settlement(1, 0), settlement(2, 0)],
            ..Default::default()
        };
        assert!(SettlementFrozen.check(&new).is_ok());
        assert!(SettlementFrozen.check_transition(&old, &new).is_ok());
        assert!(SettlementFrozen.check_transition(&new, &old).is_err());

        let inconsistent = GovernanceSnapshot {
            settlements: vec![settlement(1, 5)],
            ..Default::default()
        };
        assert!(SettlementFrozen.check(&inconsistent).is_err());
    }
}
