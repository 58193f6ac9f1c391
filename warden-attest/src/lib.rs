//! Warden Attest - Workload attestation and prover grants.
//!
//! - [`message`] - Canonical attestation messages and signer signatures
//! - [`verifier`] - Majority-of-signatures acceptance of workload reports
//! - [`workload`] - Cumulative and recent workload accounting
//! - [`backend`] - Threshold, proof and override verification backends
//! - [`grant`] - Operator-bound provers and one-shot claims
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_attest::{Attestation, AttestationConfig, AttestationVerifier, SignerSignature, WorkloadPayload};
//! use warden_core::{InMemoryDirectory, ManualClock, NodeId, NodeRecord, SecretKey, Timestamp, WalletAddress};
//!
//! let keys: Vec<SecretKey> = (0..3).map(|_| SecretKey::generate()).collect();
//! let directory = InMemoryDirectory::from_records(
//!     keys.iter().map(|k| NodeRecord::new(k.public_key(), WalletAddress([1; 20]))),
//! ).unwrap();
//! let clock = ManualClock::new(Timestamp(1_000));
//! let mut verifier =
//!     AttestationVerifier::new(AttestationConfig::default(), Arc::new(directory), clock).unwrap();
//!
//! let subject = NodeId::from_public_key(&keys[0].public_key());
//! let payload = WorkloadPayload::new(100, 1, 1);
//! let attestation = Attestation {
//!     reporter: NodeId::from_public_key(&keys[1].public_key()),
//!     subject,
//!     payload,
//!     epoch_id: 1,
//!     signatures: keys.iter().map(|k| SignerSignature::attest(k, &subject, &payload, 1)).collect(),
//! };
//! verifier.verify_attestation(&attestation).unwrap();
//! assert_eq!(verifier.get_total_workload(&subject), 100);
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod grant;
pub mod message;
pub mod verifier;
pub mod workload;

pub use backend::{BackendKind, ClaimContext, Evidence, ProofVerifier, ThresholdPolicy, VerificationBackend};
pub use config::{AttestationConfig, ConfigError, MIN_SIGNATURE_FLOOR};
pub use error::{AttestationError, Result};
pub use grant::{Claim, Grant, GrantRegistry};
pub use message::{canonical_message, message_hash, Attestation, SignerSignature, WorkloadPayload};
pub use verifier::{check_signatures, AttestationVerifier, SignatureCheck};
pub use workload::{SubjectWorkload, WorkloadLedger, WorkloadReport};
