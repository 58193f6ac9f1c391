//! Governance error types.

use thiserror::Error;

use warden_core::{ErrorClass, ErrorCode, NodeId};

use crate::config::ConfigError;

/// Result type for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Errors raised by round, vote and settlement operations.
///
/// Every rejection leaves engine state untouched.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("previous round is not ending: {elapsed}s elapsed, {required}s required")]
    RoundNotEnded { elapsed: u64, required: u64 },

    #[error("round {0} does not exist")]
    UnknownRound(u64),

    #[error("round {0} has been pruned")]
    RoundPruned(u64),

    #[error("node {subject} is not a subject of round {round}")]
    UnknownSubject { round: u64, subject: NodeId },

    #[error("validation time exceeded for round {round}")]
    WindowExceeded { round: u64 },

    #[error("validation already completed for {subject} in round {round}")]
    AlreadyCompleted { round: u64, subject: NodeId },

    #[error("invalid validator {voter} for {subject} in round {round}")]
    InvalidValidator { round: u64, subject: NodeId, voter: NodeId },

    #[error("{voter} already voted for {subject} in round {round}")]
    DuplicateVote { round: u64, subject: NodeId, voter: NodeId },

    #[error("vote signature does not verify for {0}")]
    InvalidVoteSignature(NodeId),

    #[error("detect period {0} does not exist")]
    PeriodNotExist(u64),

    #[error("settlement for undetected period {0}")]
    UndetectedPeriod(u64),

    #[error("detect period {0} still has an open round")]
    PeriodNotClosed(u64),

    #[error("detect period {0} has been pruned")]
    PeriodPruned(u64),

    #[error("detect period {0} is not settled")]
    NotSettled(u64),

    #[error("detect period {0} already settled")]
    AlreadySettled(u64),

    #[error("settlement not continuous: expected period {expected}, got {got}")]
    SettlementNotContinuous { expected: u64, got: u64 },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] warden_core::Error),
}

impl GovernanceError {
    /// Workspace error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            GovernanceError::RoundNotEnded { .. } => ErrorCode::RoundNotEnded,
            GovernanceError::UnknownRound(_) | GovernanceError::RoundPruned(_) => {
                ErrorCode::RoundNotFound
            }
            GovernanceError::UnknownSubject { .. } => ErrorCode::NodeNotFound,
            GovernanceError::WindowExceeded { .. } => ErrorCode::WindowExceeded,
            GovernanceError::AlreadyCompleted { .. } => ErrorCode::AlreadyCompleted,
            GovernanceError::InvalidValidator { .. } => ErrorCode::InvalidValidator,
            GovernanceError::DuplicateVote { .. } => ErrorCode::DuplicateVote,
            GovernanceError::InvalidVoteSignature(_) => ErrorCode::InvalidSignature,
            GovernanceError::PeriodNotExist(_) | GovernanceError::PeriodPruned(_) => {
                ErrorCode::PeriodNotFound
            }
            GovernanceError::UndetectedPeriod(_)
            | GovernanceError::PeriodNotClosed(_)
            | GovernanceError::NotSettled(_) => ErrorCode::PeriodNotClosed,
            GovernanceError::AlreadySettled(_) => ErrorCode::AlreadySettled,
            GovernanceError::SettlementNotContinuous { .. } => ErrorCode::NotContinuous,
            GovernanceError::Config(_) => ErrorCode::InvalidConfig,
            GovernanceError::Core(e) => e.code(),
        }
    }

    /// Validation, state-ordering or authorization.
    pub fn class(&self) -> ErrorClass {
        self.code().class()
    }
}
