//! Attestation and grant errors.

use thiserror::Error;

use warden_core::{ErrorClass, ErrorCode, NodeId};

use crate::backend::BackendKind;
use crate::config::ConfigError;

/// Result type for attestation operations.
pub type Result<T> = std::result::Result<T, AttestationError>;

/// Errors raised while accepting attestations or claims.
///
/// Every rejection leaves the ledger and registry untouched.
#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("invalid subject")]
    InvalidSubject,

    #[error("workload must be greater than zero")]
    InvalidPayload,

    #[error("{got} signatures supplied, at least {min} required")]
    InsufficientSignatures { got: usize, min: usize },

    #[error("{signers} signers but {signatures} signatures")]
    MismatchedLengths { signers: usize, signatures: usize },

    #[error("epoch out of order for {subject}: last {last}, got {got}")]
    EpochOutOfOrder { subject: NodeId, last: u64, got: u64 },

    #[error("invalid signature set: {valid} of {total} signatures agree")]
    InvalidSignatureSet { valid: usize, total: usize },

    #[error("subject {0} did not co-sign the attestation")]
    MissingSubjectSignature(NodeId),

    #[error("reporter {0} is not eligible")]
    UnauthorizedReporter(NodeId),

    #[error("workload total overflow for {0}")]
    Overflow(NodeId),

    #[error("invalid address")]
    InvalidAddress,

    #[error("caller {0} may not bind provers")]
    NotOperator(NodeId),

    #[error("prover {0} is already bound")]
    ProverAlreadyBound(NodeId),

    #[error("prover {0} is not bound")]
    ProverNotBound(NodeId),

    #[error("{0} is not a prover")]
    NotProver(NodeId),

    #[error("workload can not be zero")]
    ZeroWorkload,

    #[error("no {0} backend registered")]
    UnknownBackend(BackendKind),

    #[error("proof has been used: prover {prover}, nonce {nonce}")]
    ProofAlreadyUsed { prover: NodeId, nonce: u64 },

    #[error("{0} verification failed")]
    VerificationFailed(BackendKind),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] warden_core::Error),
}

impl AttestationError {
    /// Workspace error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AttestationError::InvalidSubject | AttestationError::InvalidAddress => {
                ErrorCode::InvalidNode
            }
            AttestationError::InvalidPayload | AttestationError::ZeroWorkload => {
                ErrorCode::InvalidAmount
            }
            AttestationError::InsufficientSignatures { .. } => ErrorCode::InsufficientSignatures,
            AttestationError::MismatchedLengths { .. } => ErrorCode::MismatchedLengths,
            AttestationError::EpochOutOfOrder { .. } => ErrorCode::EpochOutOfOrder,
            AttestationError::InvalidSignatureSet { .. }
            | AttestationError::MissingSubjectSignature(_)
            | AttestationError::VerificationFailed(_) => ErrorCode::InvalidSignatureSet,
            AttestationError::UnauthorizedReporter(_)
            | AttestationError::NotOperator(_)
            | AttestationError::NotProver(_) => ErrorCode::Unauthorized,
            AttestationError::Overflow(_) => ErrorCode::Overflow,
            AttestationError::ProverAlreadyBound(_) | AttestationError::ProofAlreadyUsed { .. } => {
                ErrorCode::Duplicate
            }
            AttestationError::ProverNotBound(_) => ErrorCode::NodeNotFound,
            AttestationError::UnknownBackend(_) | AttestationError::Config(_) => {
                ErrorCode::InvalidConfig
            }
            AttestationError::Core(e) => e.code(),
        }
    }

    /// Validation, state-ordering or authorization.
    pub fn class(&self) -> ErrorClass {
        self.code().class()
    }
}
