//! Vote collection for one subject in one round.
//!
//! A tally completes the moment either side holds strictly more than half
//! of the committee. After that it is frozen: later votes are rejected and
//! the outcome never flips.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use warden_core::{NodeId, PublicKey, SecretKey, Sig, Timestamp};

use crate::error::{GovernanceError, Result};

const VOTE_DOMAIN: &[u8] = b"warden/vote/v1";

/// Final verdict of a completed tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A majority of the committee judged the subject alive and well behaved.
    Pass,
    /// A majority of the committee judged the subject down or misbehaving.
    Fail,
}

impl Outcome {
    /// Whether the outcome counts towards the subject's quota.
    pub fn is_pass(self) -> bool {
        self == Outcome::Pass
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail => write!(f, "fail"),
        }
    }
}

/// Votes for one subject in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Committee drawn for this subject.
    committee: Vec<NodeId>,
    /// Members who have voted, whichever side.
    voters: BTreeSet<NodeId>,
    yes: u32,
    no: u32,
    outcome: Option<Outcome>,
    completed_at: Option<Timestamp>,
}

impl VoteTally {
    /// Create an empty tally for `committee`.
    pub fn new(committee: Vec<NodeId>) -> Self {
        Self {
            committee,
            voters: BTreeSet::new(),
            yes: 0,
            no: 0,
            outcome: None,
            completed_at: None,
        }
    }

    /// Committee members.
    pub fn committee(&self) -> &[NodeId] {
        &self.committee
    }

    /// Check if `node` sits on this committee.
    pub fn is_member(&self, node: &NodeId) -> bool {
        self.committee.contains(node)
    }

    /// Votes on either side needed to complete: strictly more than half.
    pub fn threshold(&self) -> u32 {
        self.committee.len() as u32 / 2 + 1
    }

    /// Approving votes.
    pub fn yes(&self) -> u32 {
        self.yes
    }

    /// Rejecting votes.
    pub fn no(&self) -> u32 {
        self.no
    }

    /// Check if `voter` has voted.
    pub fn has_voted(&self, voter: &NodeId) -> bool {
        self.voters.contains(voter)
    }

    /// Members who have voted, ordered by id.
    pub fn voters(&self) -> impl Iterator<Item = &NodeId> {
        self.voters.iter()
    }

    /// Committee members who have not voted.
    pub fn missing_voters(&self) -> Vec<NodeId> {
        self.committee
            .iter()
            .filter(|m| !self.voters.contains(m))
            .copied()
            .collect()
    }

    /// Verdict, once completed.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Check if a majority has been reached.
    pub fn is_completed(&self) -> bool {
        self.outcome.is_some()
    }

    /// When the deciding vote was cast.
    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// Record a vote.
    ///
    /// Checks, in order: already completed, committee membership, duplicate
    /// voter. Returns the outcome if this vote completed the tally.
    pub fn cast(
        &mut self,
        round: u64,
        subject: NodeId,
        voter: NodeId,
        approve: bool,
        now: Timestamp,
    ) -> Result<Option<Outcome>> {
        if self.is_completed() {
            return Err(GovernanceError::AlreadyCompleted { round, subject });
        }
        if !self.is_member(&voter) {
            return Err(GovernanceError::InvalidValidator { round, subject, voter });
        }
        if !self.voters.insert(voter) {
            return Err(GovernanceError::DuplicateVote { round, subject, voter });
        }

        if approve {
            self.yes += 1;
        } else {
            self.no += 1;
        }

        let threshold = self.threshold();
        self.outcome = if self.yes >= threshold {
            Some(Outcome::Pass)
        } else if self.no >= threshold {
            Some(Outcome::Fail)
        } else {
            None
        };
        if self.outcome.is_some() {
            self.completed_at = Some(now);
        }

        Ok(self.outcome)
    }

    /// Snapshot for callers outside the engine.
    pub fn view(&self) -> TallyView {
        TallyView {
            yes: self.yes,
            no: self.no,
            committee_size: self.committee.len() as u32,
            outcome: self.outcome,
        }
    }
}

/// Read-only summary of a tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyView {
    pub yes: u32,
    pub no: u32,
    pub committee_size: u32,
    pub outcome: Option<Outcome>,
}

impl TallyView {
    /// Check if a majority has been reached.
    pub fn completed(&self) -> bool {
        self.outcome.is_some()
    }
}

/// A vote signed by its caster, for hosts that receive votes over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedVote {
    pub round_id: u64,
    pub subject: NodeId,
    pub approve: bool,
    pub voter: NodeId,
    pub signature: Sig,
}

impl SignedVote {
    /// Sign a vote with the voter's key.
    pub fn new(round_id: u64, subject: NodeId, approve: bool, key: &SecretKey) -> Self {
        let voter = NodeId::from_public_key(&key.public_key());
        let bytes = Self::signing_bytes(round_id, &subject, approve, &voter);
        Self {
            round_id,
            subject,
            approve,
            voter,
            signature: key.sign(&bytes),
        }
    }

    /// Bytes covered by the signature.
    pub fn signing_bytes(round_id: u64, subject: &NodeId, approve: bool, voter: &NodeId) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(VOTE_DOMAIN.len() + 8 + 32 + 1 + 32);
        bytes.extend_from_slice(VOTE_DOMAIN);
        bytes.extend_from_slice(&round_id.to_le_bytes());
        bytes.extend_from_slice(subject.as_bytes());
        bytes.push(u8::from(approve));
        bytes.extend_from_slice(voter.as_bytes());
        bytes
    }

    /// Verify the signature against the voter's registered key.
    pub fn verify(&self, key: &PublicKey) -> Result<()> {
        if NodeId::from_public_key(key) != self.voter {
            return Err(GovernanceError::InvalidVoteSignature(self.voter));
        }
        let bytes = Self::signing_bytes(self.round_id, &self.subject, self.approve, &self.voter);
        key.verify(&bytes, &self.signature)
            .map_err(|_| GovernanceError::InvalidVoteSignature(self.voter))
    }
}
