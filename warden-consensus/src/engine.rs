//! The governance engine.
//!
//! Single-writer state machine tying sortition, voting, period aggregation
//! and settlement together. Every mutating call validates all of its
//! preconditions before touching state, so a rejected call leaves the
//! engine exactly as it was.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use warden_core::{
    hash_all, Clock, Hash, IdArena, NodeDirectory, NodeId, NodeStanding, Slot, Timestamp,
};

use crate::config::GovernanceConfig;
use crate::error::{GovernanceError, Result};
use crate::period::{DetectionPeriod, NodePeriodState};
use crate::round::{Round, RoundPhase};
use crate::settlement::{NodeSettlement, Settlement};
use crate::sortition::{self, SeedInputs};
use crate::votes::{SignedVote, TallyView};

const VOTE_LOG_DOMAIN: &[u8] = b"warden/vote-log/v1";

/// Result of an accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub round_id: u64,
    pub subject: NodeId,
    pub tally: TallyView,
    /// Whether this vote completed the tally.
    pub completed_now: bool,
}

/// What `prune_settled` dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub rounds: usize,
    pub periods: usize,
}

/// Owned copy of the engine's round and settlement state.
#[derive(Debug, Clone, Default)]
pub struct GovernanceSnapshot {
    pub rounds: Vec<Round>,
    pub settlements: Vec<Settlement>,
    pub taken_at: Timestamp,
}

/// Committee-voted liveness governance over a node directory.
pub struct GovernanceEngine<D: NodeDirectory, C: Clock> {
    config: GovernanceConfig,
    directory: Arc<D>,
    clock: C,
    genesis: Timestamp,
    rounds: IdArena<Round>,
    periods: IdArena<DetectionPeriod>,
    /// Indexed by period id; settlements are never pruned.
    settlements: IdArena<Settlement>,
    vote_log_root: Hash,
}

impl<D: NodeDirectory, C: Clock> std::fmt::Debug for GovernanceEngine<D, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceEngine")
            .field("config", &self.config)
            .field("genesis", &self.genesis)
            .field("current_round", &self.rounds.last_id())
            .field("current_period", &self.periods.last_id())
            .field("last_settled", &self.settlements.last_id())
            .finish()
    }
}

impl<D: NodeDirectory, C: Clock> GovernanceEngine<D, C> {
    /// Create an engine. Genesis is the clock's current time.
    pub fn new(config: GovernanceConfig, directory: Arc<D>, clock: C) -> Result<Self> {
        config.validate()?;
        let genesis = clock.now();
        info!(
            genesis = genesis.secs(),
            round_duration = config.round_duration_secs,
            detect_duration = config.detect_duration_secs,
            committee_size = config.committee_size,
            "Governance engine started"
        );

        Ok(Self {
            config,
            directory,
            clock,
            genesis,
            rounds: IdArena::new(),
            periods: IdArena::new(),
            settlements: IdArena::new(),
            vote_log_root: hash_all::<&[u8]>(&[VOTE_LOG_DOMAIN]),
        })
    }

    /// Configuration.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Node directory.
    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// When the engine was created.
    pub fn genesis(&self) -> Timestamp {
        self.genesis
    }

    /// Running hash over every accepted vote.
    pub fn vote_log_root(&self) -> Hash {
        self.vote_log_root
    }

    /// Id of the most recently opened round (0 before the first).
    pub fn current_round_id(&self) -> u64 {
        self.rounds.last_id()
    }

    /// Id of the current detection period (0 before the first round).
    pub fn current_period_id(&self) -> u64 {
        self.periods.last_id()
    }

    /// Id of the most recently settled period (0 if none).
    pub fn last_settled_period(&self) -> u64 {
        self.settlements.last_id()
    }

    /// Earliest time the next round may open.
    pub fn next_round_at(&self) -> Timestamp {
        self.last_opened_at().plus(self.config.round_duration_secs)
    }

    fn last_opened_at(&self) -> Timestamp {
        self.rounds.last().map(|r| r.opened_at).unwrap_or(self.genesis)
    }

    // === Rounds ===

    /// Open the next round.
    ///
    /// Fails with `RoundNotEnded` until the round duration has elapsed since
    /// the previous opening (or since genesis for the first round). The
    /// previous round's window has closed by then, whatever its tallies say.
    /// Opening a round starts a new detection period once the current one's
    /// duration has run out.
    pub fn start_new_round(&mut self) -> Result<u64> {
        let now = self.clock.now();
        let elapsed = now.elapsed_since(self.last_opened_at());
        let required = self.config.round_duration_secs;
        if elapsed < required {
            return Err(GovernanceError::RoundNotEnded { elapsed, required });
        }

        let round_id = self.rounds.next_id();
        let active = self.directory.list_active();
        let seed = SeedInputs {
            round_id,
            opened_at: now,
            directory_commitment: self.directory.commitment(),
            vote_log_root: self.vote_log_root,
        }
        .derive();
        let draw = sortition::draw(
            &active,
            &seed,
            self.config.committee_size,
            self.config.subjects_per_round,
        );
        if draw.is_empty() {
            warn!(round = round_id, active = active.len(), "No subjects drawn, round is a no-op");
        } else {
            debug!(
                round = round_id,
                active = active.len(),
                subjects = draw.subjects.len(),
                "Sortition complete"
            );
        }

        let starts_period = self
            .periods
            .last()
            .map(|p| !p.contains_time(now, self.config.detect_duration_secs))
            .unwrap_or(true);
        if starts_period {
            let period_id = self.periods.next_id();
            self.periods.push(DetectionPeriod::new(period_id, now, round_id));
            info!(period = period_id, first_round = round_id, "Detection period started");
        }

        let period_id = self.periods.last_id();
        let round = Round::new(
            round_id,
            period_id,
            now,
            self.config.round_duration_secs,
            seed,
            draw,
        );
        if let Some(period) = self.periods.last_mut() {
            period.add_round(round_id, round.subjects());
        }
        let subjects = round.subjects().len();
        self.rounds.push(round);

        info!(
            round = round_id,
            period = period_id,
            subjects,
            opened_at = now.secs(),
            "Round opened"
        );
        Ok(round_id)
    }

    /// Look up a round.
    pub fn round(&self, round_id: u64) -> Result<&Round> {
        match self.rounds.slot(round_id) {
            Slot::Live(round) => Ok(round),
            Slot::Pruned => Err(GovernanceError::RoundPruned(round_id)),
            Slot::Vacant => Err(GovernanceError::UnknownRound(round_id)),
        }
    }

    /// Phase of a round at the current time.
    pub fn round_phase(&self, round_id: u64) -> Result<RoundPhase> {
        Ok(self.round(round_id)?.phase(self.clock.now()))
    }

    /// Subjects of a round, in draw order.
    pub fn round_subjects(&self, round_id: u64) -> Result<&[NodeId]> {
        Ok(self.round(round_id)?.subjects())
    }

    /// Committee judging `subject` in a round.
    pub fn committee(&self, round_id: u64, subject: &NodeId) -> Result<&[NodeId]> {
        self.round(round_id)?
            .committee(subject)
            .ok_or(GovernanceError::UnknownSubject {
                round: round_id,
                subject: *subject,
            })
    }

    /// Tally summary for `subject` in a round.
    pub fn tally(&self, round_id: u64, subject: &NodeId) -> Result<TallyView> {
        self.round(round_id)?
            .tally(subject)
            .map(|t| t.view())
            .ok_or(GovernanceError::UnknownSubject {
                round: round_id,
                subject: *subject,
            })
    }

    // === Voting ===

    /// Record `voter`'s judgement of `subject` in a round.
    ///
    /// Checks, in order: the round exists, its window is open, `subject` is
    /// judged in it, the tally is not completed, `voter` sits on the
    /// committee, `voter` has not voted yet.
    pub fn vote(
        &mut self,
        voter: NodeId,
        round_id: u64,
        subject: NodeId,
        approve: bool,
    ) -> Result<VoteReceipt> {
        self.apply_vote(voter, round_id, subject, approve)
            .map_err(|e| {
                warn!(round = round_id, %subject, %voter, error = %e, "Vote rejected");
                e
            })
    }

    /// Verify a signed vote against the voter's directory key, then record it.
    pub fn cast_signed_vote(&mut self, vote: &SignedVote) -> Result<VoteReceipt> {
        let key = self
            .directory
            .public_key_of(&vote.voter)
            .ok_or(GovernanceError::InvalidVoteSignature(vote.voter))?;
        if let Err(e) = vote.verify(&key) {
            warn!(round = vote.round_id, voter = %vote.voter, "Signed vote rejected");
            return Err(e);
        }
        self.vote(vote.voter, vote.round_id, vote.subject, vote.approve)
    }

    fn apply_vote(
        &mut self,
        voter: NodeId,
        round_id: u64,
        subject: NodeId,
        approve: bool,
    ) -> Result<VoteReceipt> {
        let now = self.clock.now();
        let round = self.round(round_id)?;
        if !round.is_open(now) {
            return Err(GovernanceError::WindowExceeded { round: round_id });
        }
        if !round.is_subject(&subject) {
            return Err(GovernanceError::UnknownSubject {
                round: round_id,
                subject,
            });
        }
        let period_id = round.period_id;
        if self.periods.get(period_id).is_none() {
            return Err(GovernanceError::PeriodPruned(period_id));
        }

        let tally = self
            .rounds
            .get_mut(round_id)
            .and_then(|r| r.tally_mut(&subject))
            .ok_or(GovernanceError::UnknownSubject {
                round: round_id,
                subject,
            })?;
        let outcome = tally.cast(round_id, subject, voter, approve, now)?;
        let view = tally.view();

        self.vote_log_root = hash_all::<&[u8]>(&[
            self.vote_log_root.as_bytes(),
            &round_id.to_le_bytes(),
            subject.as_bytes(),
            voter.as_bytes(),
            &[u8::from(approve)],
        ]);
        debug!(round = round_id, %subject, %voter, approve, yes = view.yes, no = view.no, "Vote accepted");

        if let Some(outcome) = outcome {
            if let Some(period) = self.periods.get_mut(period_id) {
                period.record(subject, outcome);
            }
            info!(
                round = round_id,
                period = period_id,
                %subject,
                %outcome,
                yes = view.yes,
                no = view.no,
                "Tally completed"
            );
        }

        Ok(VoteReceipt {
            round_id,
            subject,
            tally: view,
            completed_now: outcome.is_some(),
        })
    }

    // === Periods ===

    /// Look up a detection period.
    pub fn period(&self, period_id: u64) -> Result<&DetectionPeriod> {
        match self.periods.slot(period_id) {
            Slot::Live(period) => Ok(period),
            Slot::Pruned => Err(GovernanceError::PeriodPruned(period_id)),
            Slot::Vacant => Err(GovernanceError::PeriodNotExist(period_id)),
        }
    }

    /// Per-node pass/fail counters of a period, ordered by node id.
    pub fn period_state(&self, period_id: u64) -> Result<Vec<NodePeriodState>> {
        Ok(self.period(period_id)?.states())
    }

    /// One node's counters in a period.
    pub fn node_period_state(&self, period_id: u64, node: &NodeId) -> Result<NodePeriodState> {
        let stats = self.period(period_id)?.stats(node);
        Ok(NodePeriodState {
            node: *node,
            pass_count: stats.passed,
            fail_count: stats.failed,
            unresolved: stats.unresolved(),
        })
    }

    // === Settlement ===

    /// Settle a closed period into per-node quotas.
    ///
    /// Periods are settled once each, strictly in order, and only after a
    /// later period has started and the period's last round has closed.
    pub fn settle_period(&mut self, period_id: u64) -> Result<&Settlement> {
        let settlement = self.prepare_settlement(period_id).map_err(|e| {
            warn!(period = period_id, error = %e, "Settlement rejected");
            e
        })?;

        info!(
            period = period_id,
            nodes = settlement.nodes.len(),
            total_quota = settlement.total_quota,
            "Period settled"
        );
        self.settlements.push(settlement);
        self.settlements
            .get(period_id)
            .ok_or(GovernanceError::NotSettled(period_id))
    }

    fn prepare_settlement(&self, period_id: u64) -> Result<Settlement> {
        let current = self.current_period_id();
        if period_id == 0 || period_id > current {
            return Err(GovernanceError::PeriodNotExist(period_id));
        }
        if period_id == current {
            return Err(GovernanceError::UndetectedPeriod(period_id));
        }
        if period_id < self.settlements.next_id() {
            return Err(GovernanceError::AlreadySettled(period_id));
        }
        let expected = self.settlements.next_id();
        if period_id != expected {
            return Err(GovernanceError::SettlementNotContinuous {
                expected,
                got: period_id,
            });
        }

        let period = self.period(period_id)?;
        let now = self.clock.now();
        // Rounds open one window apart, so a later period implies this is
        // already closed. Holds only while the window equals round spacing.
        if let Some(last) = self.rounds.get(period.last_round) {
            if last.phase(now) != RoundPhase::Closed {
                return Err(GovernanceError::PeriodNotClosed(period_id));
            }
        }

        Ok(Settlement::compute(
            period,
            self.directory.as_ref(),
            self.config.max_failures_per_period,
            now,
        ))
    }

    /// Settlement of a period, if settled.
    pub fn settlement(&self, period_id: u64) -> Option<&Settlement> {
        self.settlements.get(period_id)
    }

    /// Per-node settlement lines and total quota of a settled period.
    pub fn get_one_period_settlement(&self, period_id: u64) -> Result<(Vec<NodeSettlement>, u64)> {
        if let Some(settlement) = self.settlements.get(period_id) {
            return Ok((settlement.nodes.clone(), settlement.total_quota));
        }
        if period_id == 0 || period_id > self.current_period_id() {
            Err(GovernanceError::PeriodNotExist(period_id))
        } else {
            Err(GovernanceError::NotSettled(period_id))
        }
    }

    /// Drop rounds and periods that belong to settled periods.
    ///
    /// Settlements themselves are kept. Lookups of pruned ids fail with
    /// `RoundPruned` / `PeriodPruned`.
    pub fn prune_settled(&mut self) -> PruneReport {
        let settled = self.settlements.last_id();
        if settled == 0 {
            return PruneReport::default();
        }
        let first_kept_round = match self.periods.get(settled + 1) {
            Some(period) => period.first_round,
            None => return PruneReport::default(),
        };

        let report = PruneReport {
            rounds: self.rounds.prune_before(first_kept_round),
            periods: self.periods.prune_before(settled + 1),
        };
        debug!(
            rounds = report.rounds,
            periods = report.periods,
            "Pruned settled history"
        );
        report
    }

    /// Copy of the live rounds and all settlements.
    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            rounds: self.rounds.iter().map(|(_, r)| r.clone()).collect(),
            settlements: self.settlements.iter().map(|(_, s)| s.clone()).collect(),
            taken_at: self.clock.now(),
        }
    }
}

impl<D: NodeDirectory, C: Clock> NodeStanding for GovernanceEngine<D, C> {
    /// A node is in good standing unless its failures in the current period
    /// already exceed the penalty threshold.
    fn in_good_standing(&self, node: &NodeId) -> bool {
        self.periods
            .last()
            .map(|p| p.stats(node).failed <= self.config.max_failures_per_period)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::votes::Outcome;
    use warden_core::{InMemoryDirectory, ManualClock, NodeRecord, SecretKey, WalletAddress};

    const HOUR: u64 = 3600;

    struct Fixture {
        keys: Vec<SecretKey>,
        clock: Arc<ManualClock>,
        engine: GovernanceEngine<InMemoryDirectory, Arc<ManualClock>>,
    }

    fn fixture(nodes: usize, config: GovernanceConfig) -> Fixture {
        let keys: Vec<SecretKey> = (0..nodes).map(|_| SecretKey::generate()).collect();
        let directory = InMemoryDirectory::from_records(
            keys.iter()
                .enumerate()
                .map(|(i, k)| NodeRecord::new(k.public_key(), WalletAddress([i as u8 + 1; 20]))),
        )
        .unwrap();
        let clock = Arc::new(ManualClock::new(Timestamp(1_000_000)));
        let engine = GovernanceEngine::new(config, Arc::new(directory), clock.clone()).unwrap();
        Fixture { keys, clock, engine }
    }

    /// Every committee member votes `approve` for every subject.
    fn vote_all(engine: &mut GovernanceEngine<InMemoryDirectory, Arc<ManualClock>>, approve: bool) {
        let round_id = engine.current_round_id();
        let subjects = engine.round_subjects(round_id).unwrap().to_vec();
        for subject in subjects {
            let committee = engine.committee(round_id, &subject).unwrap().to_vec();
            for voter in committee {
                match engine.vote(voter, round_id, subject, approve) {
                    Ok(_) | Err(GovernanceError::AlreadyCompleted { .. }) => {}
                    Err(e) => panic!("unexpected vote error: {e}"),
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let directory = Arc::new(InMemoryDirectory::new());
        let clock = ManualClock::new(Timestamp(0));
        let config = GovernanceConfig::default().with_committee_size(0);
        let err = GovernanceEngine::new(config, directory, clock).unwrap_err();
        assert!(matches!(err, GovernanceError::Config(_)));
    }

    #[test]
    fn test_first_round_waits_one_duration() {
        let mut f = fixture(6, GovernanceConfig::default());
        assert_eq!(f.engine.current_round_id(), 0);
        assert!(matches!(
            f.engine.start_new_round(),
            Err(GovernanceError::RoundNotEnded { elapsed: 0, required: HOUR })
        ));

        f.clock.advance(HOUR);
        assert_eq!(f.engine.start_new_round().unwrap(), 1);
        assert_eq!(f.engine.current_period_id(), 1);
        assert_eq!(f.engine.round_subjects(1).unwrap().len(), 6);
        assert_eq!(f.engine.next_round_at(), f.clock.now().plus(HOUR));
    }

    #[test]
    fn test_periods_follow_time() {
        let config = GovernanceConfig::default().with_round_duration(360);
        let mut f = fixture(4, config);

        for _ in 0..10 {
            f.clock.advance(360);
            f.engine.start_new_round().unwrap();
        }
        assert_eq!(f.engine.current_period_id(), 1);
        assert_eq!(f.engine.period(1).unwrap().round_count(), 10);

        f.clock.advance(360);
        assert_eq!(f.engine.start_new_round().unwrap(), 11);
        assert_eq!(f.engine.current_period_id(), 2);
        assert_eq!(f.engine.period(2).unwrap().first_round, 11);
    }

    #[test]
    fn test_vote_flow_updates_period() {
        let mut f = fixture(5, GovernanceConfig::default().with_committee_size(3));
        f.clock.advance(HOUR);
        let round_id = f.engine.start_new_round().unwrap();

        let subject = f.engine.round_subjects(round_id).unwrap()[0];
        let committee = f.engine.committee(round_id, &subject).unwrap().to_vec();
        assert_eq!(committee.len(), 3);

        let receipt = f.engine.vote(committee[0], round_id, subject, false).unwrap();
        assert!(!receipt.completed_now);
        let receipt = f.engine.vote(committee[1], round_id, subject, false).unwrap();
        assert!(receipt.completed_now);
        assert_eq!(receipt.tally.outcome, Some(Outcome::Fail));

        let state = f.engine.node_period_state(1, &subject).unwrap();
        assert_eq!((state.pass_count, state.fail_count), (0, 1));

        let err = f.engine.vote(committee[2], round_id, subject, true).unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyCompleted { .. }));
        assert_eq!(f.engine.tally(round_id, &subject).unwrap().yes, 0);
    }

    #[test]
    fn test_vote_error_order() {
        let mut f = fixture(5, GovernanceConfig::default().with_committee_size(3));
        f.clock.advance(HOUR);
        let round_id = f.engine.start_new_round().unwrap();
        let subject = f.engine.round_subjects(round_id).unwrap()[0];
        let outsider = subject;

        assert!(matches!(
            f.engine.vote(outsider, 9, subject, true),
            Err(GovernanceError::UnknownRound(9))
        ));
        assert!(matches!(
            f.engine.vote(outsider, round_id, NodeId([1; 32]), true),
            Err(GovernanceError::UnknownSubject { .. })
        ));
        assert!(matches!(
            f.engine.vote(outsider, round_id, subject, true),
            Err(GovernanceError::InvalidValidator { .. })
        ));

        let member = f.engine.committee(round_id, &subject).unwrap()[0];
        f.engine.vote(member, round_id, subject, true).unwrap();
        assert!(matches!(
            f.engine.vote(member, round_id, subject, true),
            Err(GovernanceError::DuplicateVote { .. })
        ));

        f.clock.advance(HOUR);
        assert!(matches!(
            f.engine.vote(outsider, round_id, NodeId([1; 32]), true),
            Err(GovernanceError::WindowExceeded { .. })
        ));
    }

    #[test]
    fn test_rejected_vote_changes_nothing() {
        let mut f = fixture(4, GovernanceConfig::default());
        f.clock.advance(HOUR);
        let round_id = f.engine.start_new_round().unwrap();
        let root = f.engine.vote_log_root();
        let subject = f.engine.round_subjects(round_id).unwrap()[0];

        let _ = f.engine.vote(subject, round_id, subject, true);
        assert_eq!(f.engine.vote_log_root(), root);
        assert_eq!(f.engine.tally(round_id, &subject).unwrap().yes, 0);
    }

    #[test]
    fn test_signed_vote() {
        let mut f = fixture(4, GovernanceConfig::default());
        f.clock.advance(HOUR);
        let round_id = f.engine.start_new_round().unwrap();
        let subject = f.engine.round_subjects(round_id).unwrap()[0];
        let member = f.engine.committee(round_id, &subject).unwrap()[0];
        let key = f
            .keys
            .iter()
            .find(|k| NodeId::from_public_key(&k.public_key()) == member)
            .unwrap();

        let vote = SignedVote::new(round_id, subject, true, key);
        let receipt = f.engine.cast_signed_vote(&vote).unwrap();
        assert_eq!(receipt.tally.yes, 1);

        let mut forged = SignedVote::new(round_id, subject, true, &SecretKey::generate());
        forged.voter = f.engine.committee(round_id, &subject).unwrap()[1];
        assert!(matches!(
            f.engine.cast_signed_vote(&forged),
            Err(GovernanceError::InvalidVoteSignature(_))
        ));
    }

    #[test]
    fn test_settlement_errors() {
        let mut f = fixture(4, GovernanceConfig::default());
        assert!(matches!(
            f.engine.settle_period(0),
            Err(GovernanceError::PeriodNotExist(0))
        ));

        f.clock.advance(HOUR);
        f.engine.start_new_round().unwrap();
        vote_all(&mut f.engine, true);
        assert!(matches!(
            f.engine.settle_period(1),
            Err(GovernanceError::UndetectedPeriod(1))
        ));
        assert!(matches!(
            f.engine.settle_period(100),
            Err(GovernanceError::PeriodNotExist(100))
        ));

        f.clock.advance(HOUR);
        f.engine.start_new_round().unwrap();
        let settlement = f.engine.settle_period(1).unwrap().clone();
        assert_eq!(settlement.total_quota, 4);
        assert!(matches!(
            f.engine.settle_period(1),
            Err(GovernanceError::AlreadySettled(1))
        ));
        assert_eq!(f.engine.settlement(1), Some(&settlement));
        assert!(matches!(
            f.engine.get_one_period_settlement(2),
            Err(GovernanceError::NotSettled(2))
        ));
    }

    #[test]
    fn test_settlement_at_window_boundary() {
        let mut f = fixture(3, GovernanceConfig::default());
        f.clock.advance(HOUR);
        f.engine.start_new_round().unwrap();
        f.clock.advance(HOUR);
        f.engine.start_new_round().unwrap();
        assert_eq!(f.engine.current_period_id(), 2);

        let last = f.engine.period(1).unwrap().last_round;
        assert_eq!(
            f.engine.round(last).unwrap().phase(f.clock.now()),
            RoundPhase::Closed
        );
        assert!(f.engine.settle_period(1).is_ok());
    }

    #[test]
    fn test_settlement_must_be_continuous() {
        let mut f = fixture(3, GovernanceConfig::default());
        for _ in 0..3 {
            f.clock.advance(HOUR);
            f.engine.start_new_round().unwrap();
        }
        assert!(matches!(
            f.engine.settle_period(2),
            Err(GovernanceError::SettlementNotContinuous { expected: 1, got: 2 })
        ));
        f.engine.settle_period(1).unwrap();
        f.engine.settle_period(2).unwrap();
        assert_eq!(f.engine.last_settled_period(), 2);
    }

    #[test]
    fn test_prune_settled() {
        let mut f = fixture(3, GovernanceConfig::default());
        for _ in 0..3 {
            f.clock.advance(HOUR);
            f.engine.start_new_round().unwrap();
        }
        assert_eq!(f.engine.prune_settled(), PruneReport::default());

        f.engine.settle_period(1).unwrap();
        let report = f.engine.prune_settled();
        assert_eq!(report, PruneReport { rounds: 1, periods: 1 });

        assert!(matches!(f.engine.round(1), Err(GovernanceError::RoundPruned(1))));
        assert!(matches!(
            f.engine.period_state(1),
            Err(GovernanceError::PeriodPruned(1))
        ));
        assert!(f.engine.settlement(1).is_some());
        assert!(f.engine.round(2).is_ok());
    }

    #[test]
    fn test_good_standing() {
        let config = GovernanceConfig {
            max_failures_per_period: 0,
            ..GovernanceConfig::default().with_committee_size(3)
        };
        let mut f = fixture(5, config);
        f.clock.advance(HOUR);
        let round_id = f.engine.start_new_round().unwrap();
        let subject = f.engine.round_subjects(round_id).unwrap()[0];
        assert!(f.engine.in_good_standing(&subject));

        for voter in f.engine.committee(round_id, &subject).unwrap().to_vec() {
            let _ = f.engine.vote(voter, round_id, subject, false);
        }
        assert!(!f.engine.in_good_standing(&subject));
    }

    #[test]
    fn test_empty_directory_round_is_noop() {
        let mut f = fixture(0, GovernanceConfig::default());
        f.clock.advance(HOUR);
        let round_id = f.engine.start_new_round().unwrap();
        assert!(f.engine.round_subjects(round_id).unwrap().is_empty());
        assert!(f.engine.period_state(1).unwrap().is_empty());
    }
}
