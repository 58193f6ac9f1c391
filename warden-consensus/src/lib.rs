//! Warden Consensus - Committee-voted liveness governance.
//!
//! Nodes are judged by randomly drawn peer committees on a fixed cadence:
//!
//! - [`sortition`] - Seeded, reproducible draw of subjects and committees
//! - [`round`] - Rounds and their time-derived phases
//! - [`votes`] - Per-subject tallies that complete on a strict majority
//! - [`period`] - Detection periods aggregating pass/fail counts
//! - [`settlement`] - One-shot, ordered conversion of periods into quotas
//! - [`engine`] - The single-writer state machine tying it together
//! - [`invariants`] - Checks over engine snapshots
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_consensus::{GovernanceConfig, GovernanceEngine};
//! use warden_core::{InMemoryDirectory, ManualClock, NodeRecord, SecretKey, Timestamp, WalletAddress};
//!
//! let directory = InMemoryDirectory::from_records(
//!     (0..4).map(|_| NodeRecord::new(SecretKey::generate().public_key(), WalletAddress([1; 20]))),
//! ).unwrap();
//! let clock = Arc::new(ManualClock::new(Timestamp(0)));
//! let mut engine =
//!     GovernanceEngine::new(GovernanceConfig::default(), Arc::new(directory), clock.clone()).unwrap();
//!
//! clock.advance(3600);
//! let round = engine.start_new_round().unwrap();
//! let subject = engine.round_subjects(round).unwrap()[0];
//! for voter in engine.committee(round, &subject).unwrap().to_vec().into_iter().take(2) {
//!     engine.vote(voter, round, subject, true).unwrap();
//! }
//! assert!(engine.tally(round, &subject).unwrap().completed());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod period;
pub mod round;
pub mod settlement;
pub mod sortition;
pub mod votes;

#[cfg(test)]
mod proptest;

pub use config::{ConfigError, GovernanceConfig};
pub use engine::{GovernanceEngine, GovernanceSnapshot, PruneReport, VoteReceipt};
pub use error::{GovernanceError, Result};
pub use invariants::{GovernanceInvariants, Invariant, InvariantViolation};
pub use period::{DetectionPeriod, NodePeriodState, NodeStats};
pub use round::{Round, RoundPhase};
pub use settlement::{quota, NodeSettlement, Settlement};
pub use sortition::{deterministic_shuffle, Draw, SeedInputs};
pub use votes::{Outcome, SignedVote, TallyView, VoteTally};
