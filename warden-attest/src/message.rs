//! Attestation messages and signer signatures.
//!
//! Signers sign the hash of a canonical byte encoding of
//! `(subject, workload, model_id, session_id, epoch_id)`. Integers are
//! little-endian and the encoding is prefixed with a domain tag so
//! attestation signatures can never be replayed as votes or claims.

use serde::{Deserialize, Serialize};

use warden_core::{hash, Hash, NodeId, PublicKey, SecretKey, Sig};

use crate::error::{AttestationError, Result};

const ATTEST_DOMAIN: &[u8] = b"warden/attest/v1";

/// What is being attested about a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadPayload {
    /// Units of work performed.
    pub workload: u64,
    /// Model the work ran against.
    pub model_id: u64,
    /// Session the work belongs to.
    pub session_id: u64,
}

impl WorkloadPayload {
    pub fn new(workload: u64, model_id: u64, session_id: u64) -> Self {
        Self {
            workload,
            model_id,
            session_id,
        }
    }
}

/// Canonical bytes signed for an attestation.
pub fn canonical_message(subject: &NodeId, payload: &WorkloadPayload, epoch_id: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(ATTEST_DOMAIN.len() + 32 + 8 * 4);
    bytes.extend_from_slice(ATTEST_DOMAIN);
    bytes.extend_from_slice(subject.as_bytes());
    bytes.extend_from_slice(&payload.workload.to_le_bytes());
    bytes.extend_from_slice(&payload.model_id.to_le_bytes());
    bytes.extend_from_slice(&payload.session_id.to_le_bytes());
    bytes.extend_from_slice(&epoch_id.to_le_bytes());
    bytes
}

/// Hash of the canonical message; this is what signers sign.
pub fn message_hash(subject: &NodeId, payload: &WorkloadPayload, epoch_id: u64) -> Hash {
    hash(&canonical_message(subject, payload, epoch_id))
}

/// One signer's signature over a message hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerSignature {
    pub signer: PublicKey,
    pub signature: Sig,
}

impl SignerSignature {
    /// Sign a message hash.
    pub fn sign(key: &SecretKey, message: &Hash) -> Self {
        Self {
            signer: key.public_key(),
            signature: key.sign(message.as_bytes()),
        }
    }

    /// Sign an attestation message.
    pub fn attest(key: &SecretKey, subject: &NodeId, payload: &WorkloadPayload, epoch_id: u64) -> Self {
        Self::sign(key, &message_hash(subject, payload, epoch_id))
    }

    /// Zip parallel signer and signature lists.
    pub fn zip(signers: &[PublicKey], signatures: &[Sig]) -> Result<Vec<Self>> {
        if signers.len() != signatures.len() {
            return Err(AttestationError::MismatchedLengths {
                signers: signers.len(),
                signatures: signatures.len(),
            });
        }
        Ok(signers
            .iter()
            .zip(signatures)
            .map(|(signer, signature)| Self {
                signer: signer.clone(),
                signature: signature.clone(),
            })
            .collect())
    }

    /// Node id of the signer if the signature is valid for `message`.
    pub fn recover(&self, message: &Hash) -> Option<NodeId> {
        self.signer
            .verify(message.as_bytes(), &self.signature)
            .ok()
            .map(|_| NodeId::from_public_key(&self.signer))
    }
}

/// A workload report as submitted by a reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub reporter: NodeId,
    pub subject: NodeId,
    pub payload: WorkloadPayload,
    pub epoch_id: u64,
    pub signatures: Vec<SignerSignature>,
}

impl Attestation {
    /// Hash the signers are expected to have signed.
    pub fn message_hash(&self) -> Hash {
        message_hash(&self.subject, &self.payload, self.epoch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_layout() {
        let subject = NodeId([9; 32]);
        let payload = WorkloadPayload::new(100, 2, 3);
        let bytes = canonical_message(&subject, &payload, 7);

        assert!(bytes.starts_with(ATTEST_DOMAIN));
        assert_eq!(bytes.len(), ATTEST_DOMAIN.len() + 32 + 32);
        assert_eq!(&bytes[bytes.len() - 8..], &7u64.to_le_bytes());
    }

    #[test]
    fn test_every_field_is_bound() {
        let subject = NodeId([9; 32]);
        let payload = WorkloadPayload::new(100, 2, 3);
        let base = message_hash(&subject, &payload, 1);

        assert_ne!(base, message_hash(&NodeId([8; 32]), &payload, 1));
        assert_ne!(base, message_hash(&subject, &WorkloadPayload::new(101, 2, 3), 1));
        assert_ne!(base, message_hash(&subject, &WorkloadPayload::new(100, 4, 3), 1));
        assert_ne!(base, message_hash(&subject, &WorkloadPayload::new(100, 2, 5), 1));
        assert_ne!(base, message_hash(&subject, &payload, 2));
    }

    #[test]
    fn test_recover() {
        let key = SecretKey::generate();
        let subject = NodeId([9; 32]);
        let payload = WorkloadPayload::new(100, 0, 0);
        let sig = SignerSignature::attest(&key, &subject, &payload, 1);

        let expected = NodeId::from_public_key(&key.public_key());
        assert_eq!(sig.recover(&message_hash(&subject, &payload, 1)), Some(expected));
        assert_eq!(sig.recover(&message_hash(&subject, &payload, 2)), None);
    }

    #[test]
    fn test_zip_mismatched() {
        let key = SecretKey::generate();
        let sig = key.sign(b"x");
        let err = SignerSignature::zip(&[key.public_key()], &[sig.clone(), sig]).unwrap_err();
        assert!(matches!(
            err,
            AttestationError::MismatchedLengths {
                signers: 1,
                signatures: 2
            }
        ));
    }
}
