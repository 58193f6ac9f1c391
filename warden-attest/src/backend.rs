//! Pluggable verification backends for prover claims.
//!
//! A claim carries evidence; the backend bound to the prover decides whether
//! that evidence authorizes the claim. Three backends exist: a threshold
//! signature policy over a fixed committee, an external proof verifier, and
//! an admin override.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use warden_core::{hash, Hash, NodeId, PublicKey, WalletAddress};

use crate::message::SignerSignature;

const CLAIM_DOMAIN: &[u8] = b"warden/claim/v1";

/// Backend selector stored with each grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    Threshold,
    Proof,
    Override,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Threshold => write!(f, "threshold"),
            BackendKind::Proof => write!(f, "proof"),
            BackendKind::Override => write!(f, "override"),
        }
    }
}

/// Evidence attached to a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Evidence {
    Signatures(Vec<SignerSignature>),
    Proof(Vec<u8>),
    Approval(SignerSignature),
}

/// The claim being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimContext {
    pub prover: NodeId,
    pub nonce: u64,
    pub beneficiary: WalletAddress,
    pub workload: u64,
}

impl ClaimContext {
    /// Hash of the canonical claim encoding that evidence must commit to.
    pub fn message_hash(&self) -> Hash {
        let mut bytes = Vec::with_capacity(CLAIM_DOMAIN.len() + 32 + 8 + 20 + 8);
        bytes.extend_from_slice(CLAIM_DOMAIN);
        bytes.extend_from_slice(self.prover.as_bytes());
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes.extend_from_slice(&self.beneficiary.0);
        bytes.extend_from_slice(&self.workload.to_le_bytes());
        hash(&bytes)
    }

    /// Sign this claim, e.g. as a committee member or admin.
    pub fn sign(&self, key: &warden_core::SecretKey) -> SignerSignature {
        SignerSignature::sign(key, &self.message_hash())
    }
}

/// External proof checker, e.g. a zk verifier.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, message: &Hash, proof: &[u8]) -> bool;
}

/// Strict-majority signature policy over a fixed committee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    committee: Vec<PublicKey>,
}

impl ThresholdPolicy {
    pub fn new(committee: Vec<PublicKey>) -> Self {
        Self { committee }
    }

    /// Distinct committee members needed.
    pub fn threshold(&self) -> usize {
        self.committee.len() / 2 + 1
    }

    fn verify(&self, message: &Hash, signatures: &[SignerSignature]) -> bool {
        let mut approvers: Vec<&PublicKey> = Vec::new();
        for sig in signatures {
            if !self.committee.contains(&sig.signer) || approvers.contains(&&sig.signer) {
                continue;
            }
            if sig.recover(message).is_some() {
                approvers.push(&sig.signer);
            }
        }
        !self.committee.is_empty() && approvers.len() >= self.threshold()
    }
}

/// A verification backend.
#[derive(Clone)]
pub enum VerificationBackend {
    Threshold(ThresholdPolicy),
    Proof(Arc<dyn ProofVerifier>),
    Override { admins: Vec<PublicKey> },
}

impl VerificationBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            VerificationBackend::Threshold(_) => BackendKind::Threshold,
            VerificationBackend::Proof(_) => BackendKind::Proof,
            VerificationBackend::Override { .. } => BackendKind::Override,
        }
    }

    /// Whether `evidence` authorizes `claim`. Evidence of the wrong shape fails.
    pub fn verify(&self, claim: &ClaimContext, evidence: &Evidence) -> bool {
        let message = claim.message_hash();
        match (self, evidence) {
            (VerificationBackend::Threshold(policy), Evidence::Signatures(sigs)) => {
                policy.verify(&message, sigs)
            }
            (VerificationBackend::Proof(verifier), Evidence::Proof(proof)) => {
                verifier.verify(&message, proof)
            }
            (VerificationBackend::Override { admins }, Evidence::Approval(approval)) => {
                admins.contains(&approval.signer) && approval.recover(&message).is_some()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for VerificationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationBackend::Threshold(policy) => f.debug_tuple("Threshold").field(policy).finish(),
            VerificationBackend::Proof(_) => f.write_str("Proof(..)"),
            VerificationBackend::Override { admins } => {
                f.debug_struct("Override").field("admins", &admins.len()).finish()
            }
        }
    }
}
