//! Reward distribution errors.

use thiserror::Error;

use warden_consensus::GovernanceError;
use warden_core::{ErrorClass, ErrorCode};

/// Result type for reward operations.
pub type Result<T> = std::result::Result<T, RewardError>;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("reward pool must be greater than zero")]
    InvalidCoins,

    #[error("period {got} is not distributable, expected {expected}")]
    NotContinuous { expected: u64, got: u64 },

    #[error("period {0} already distributed")]
    AlreadyDistributed(u64),

    #[error("reward arithmetic overflow")]
    Overflow,

    #[error(transparent)]
    Governance(#[from] GovernanceError),
}

impl RewardError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RewardError::InvalidCoins => ErrorCode::InvalidAmount,
            RewardError::NotContinuous { .. } => ErrorCode::NotContinuous,
            RewardError::AlreadyDistributed(_) => ErrorCode::Duplicate,
            RewardError::Overflow => ErrorCode::Overflow,
            RewardError::Governance(e) => e.code(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.code().class()
    }
}
