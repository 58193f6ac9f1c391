//! Threshold-signature attestation verifier.
//!
//! A report is accepted only if a strict majority of the supplied signatures
//! are valid and come from distinct eligible nodes. Eligibility is "active in
//! the directory", optionally narrowed by a [`NodeStanding`] gate such as the
//! governance engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use warden_core::{Clock, Hash, NodeDirectory, NodeId, NodeStanding, Timestamp};

use crate::config::AttestationConfig;
use crate::error::{AttestationError, Result};
use crate::message::{Attestation, SignerSignature};
use crate::workload::{WorkloadLedger, WorkloadReport};

/// Outcome of checking a signature batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheck {
    /// Distinct eligible signers with valid signatures, ascending.
    pub signers: Vec<NodeId>,
    /// Signatures supplied, duplicates included.
    pub total: usize,
}

impl SignatureCheck {
    /// Strict majority of the supplied signatures.
    pub fn is_majority(&self) -> bool {
        self.signers.len() * 2 > self.total
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.signers.binary_search(node).is_ok()
    }
}

/// Count distinct eligible signers whose signature verifies against `message`.
///
/// Invalid signatures, ineligible signers and repeated signers all count
/// towards `total` but never towards `signers`.
pub fn check_signatures(
    message: &Hash,
    signatures: &[SignerSignature],
    eligible: impl Fn(&NodeId) -> bool,
) -> SignatureCheck {
    let mut signers = BTreeSet::new();
    for sig in signatures {
        match sig.recover(message) {
            Some(node) if eligible(&node) => {
                signers.insert(node);
            }
            Some(node) => debug!(signer = %node, "Ignoring ineligible signer"),
            None => debug!("Ignoring invalid signature"),
        }
    }
    SignatureCheck {
        signers: signers.into_iter().collect(),
        total: signatures.len(),
    }
}

/// Accepts workload attestations and keeps the workload ledger.
pub struct AttestationVerifier<D: NodeDirectory, C: Clock> {
    config: AttestationConfig,
    directory: Arc<D>,
    clock: C,
    ledger: WorkloadLedger,
}

impl<D: NodeDirectory, C: Clock> AttestationVerifier<D, C> {
    /// Create a verifier with an empty ledger.
    pub fn new(config: AttestationConfig, directory: Arc<D>, clock: C) -> Result<Self> {
        config.validate()?;
        let ledger = WorkloadLedger::new(config.bucket_secs, config.recent_window_secs);
        Ok(Self {
            config,
            directory,
            clock,
            ledger,
        })
    }

    pub fn config(&self) -> &AttestationConfig {
        &self.config
    }

    pub fn ledger(&self) -> &WorkloadLedger {
        &self.ledger
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Verify and record an attestation; signers need only be active.
    pub fn verify_attestation(&mut self, attestation: &Attestation) -> Result<WorkloadReport> {
        self.apply(attestation, None)
    }

    /// Like [`verify_attestation`](Self::verify_attestation), but reporter
    /// and signers must also be in good standing.
    pub fn verify_attestation_gated(
        &mut self,
        attestation: &Attestation,
        standing: &dyn NodeStanding,
    ) -> Result<WorkloadReport> {
        self.apply(attestation, Some(standing))
    }

    fn apply(
        &mut self,
        attestation: &Attestation,
        standing: Option<&dyn NodeStanding>,
    ) -> Result<WorkloadReport> {
        let subject = attestation.subject;

        if subject.is_zero() {
            return Err(AttestationError::InvalidSubject);
        }
        if attestation.payload.workload == 0 {
            return Err(AttestationError::InvalidPayload);
        }
        if attestation.signatures.len() < self.config.min_signatures {
            return Err(AttestationError::InsufficientSignatures {
                got: attestation.signatures.len(),
                min: self.config.min_signatures,
            });
        }

        let last = self.ledger.last_epoch(&subject);
        if attestation.epoch_id <= last {
            return Err(AttestationError::EpochOutOfOrder {
                subject,
                last,
                got: attestation.epoch_id,
            });
        }

        let eligible = |node: &NodeId| {
            self.directory.is_active(node)
                && standing.map_or(true, |s| s.in_good_standing(node))
        };

        if !eligible(&attestation.reporter) {
            warn!(reporter = %attestation.reporter, "Attestation from ineligible reporter");
            return Err(AttestationError::UnauthorizedReporter(attestation.reporter));
        }

        let check = check_signatures(&attestation.message_hash(), &attestation.signatures, eligible);
        if !check.is_majority() {
            warn!(
                %subject,
                valid = check.signers.len(),
                total = check.total,
                "Attestation rejected: no signer majority"
            );
            return Err(AttestationError::InvalidSignatureSet {
                valid: check.signers.len(),
                total: check.total,
            });
        }
        if self.config.require_subject_signature && !check.contains(&subject) {
            return Err(AttestationError::MissingSubjectSignature(subject));
        }

        let report = WorkloadReport {
            subject,
            reporter: attestation.reporter,
            epoch_id: attestation.epoch_id,
            payload: attestation.payload,
            signers: check.signers,
            accepted_at: self.clock.now(),
        };
        self.ledger.record(&report)?;

        info!(
            %subject,
            epoch = report.epoch_id,
            workload = report.payload.workload,
            signers = report.signers.len(),
            "Workload attested"
        );
        Ok(report)
    }

    /// Cumulative workload of a subject.
    pub fn get_total_workload(&self, subject: &NodeId) -> u64 {
        self.ledger.total(subject)
    }

    /// Workload of a subject over the trailing window.
    pub fn get_recent_workload(&self, subject: &NodeId, window_secs: u64) -> u64 {
        self.ledger.recent(subject, window_secs, self.clock.now())
    }

    /// Last accepted epoch of a subject; zero if none.
    pub fn last_epoch(&self, subject: &NodeId) -> u64 {
        self.ledger.last_epoch(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use warden_core::{InMemoryDirectory, ManualClock, NodeRecord, SecretKey, WalletAddress};

    use crate::config::ConfigError;
    use crate::message::WorkloadPayload;

    struct Fleet {
        keys: Vec<SecretKey>,
        verifier: AttestationVerifier<InMemoryDirectory, Arc<ManualClock>>,
        clock: Arc<ManualClock>,
    }

    impl Fleet {
        fn new(n: u8) -> Self {
            let keys: Vec<SecretKey> = (1..=n).map(|i| SecretKey::from_bytes(&[i; 32])).collect();
            let directory = InMemoryDirectory::from_records(
                keys.iter().map(|k| NodeRecord::new(k.public_key(), WalletAddress([1; 20]))),
            )
            .unwrap();
            let clock = Arc::new(ManualClock::new(Timestamp(1_700_000_000)));
            let verifier =
                AttestationVerifier::new(AttestationConfig::default(), Arc::new(directory), clock.clone())
                    .unwrap();
            Self {
                keys,
                verifier,
                clock,
            }
        }

        fn id(&self, i: usize) -> NodeId {
            NodeId::from_public_key(&self.keys[i].public_key())
        }

        fn attestation(&self, reporter: NodeId, subject: usize, workload: u64, epoch: u64, signers: &[usize]) -> Attestation {
            let subject = self.id(subject);
            let payload = WorkloadPayload::new(workload, 1, 1);
            Attestation {
                reporter,
                subject,
                payload,
                epoch_id: epoch,
                signatures: signers
                    .iter()
                    .map(|&i| SignerSignature::attest(&self.keys[i], &subject, &payload, epoch))
                    .collect(),
            }
        }
    }

    struct Blocklist(Vec<NodeId>);

    impl NodeStanding for Blocklist {
        fn in_good_standing(&self, node: &NodeId) -> bool {
            !self.0.contains(node)
        }
    }

    #[test]
    fn test_accepts_majority_with_subject() {
        let mut fleet = Fleet::new(4);
        let att = fleet.attestation(fleet.id(1), 0, 100, 1, &[0, 1, 2]);

        let report = fleet.verifier.verify_attestation(&att).unwrap();
        assert_eq!(report.signers.len(), 3);
        assert_eq!(fleet.verifier.get_total_workload(&fleet.id(0)), 100);
        assert_eq!(fleet.verifier.last_epoch(&fleet.id(0)), 1);
    }

    #[test]
    fn test_rejection_order() {
        let mut fleet = Fleet::new(4);
        let reporter = fleet.id(1);

        let mut att = fleet.attestation(reporter, 0, 100, 1, &[0, 1, 2]);
        att.subject = NodeId::default();
        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::InvalidSubject)
        ));

        let att = fleet.attestation(reporter, 0, 0, 1, &[0, 1, 2]);
        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::InvalidPayload)
        ));

        let att = fleet.attestation(reporter, 0, 100, 1, &[0, 1]);
        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::InsufficientSignatures { got: 2, min: 3 })
        ));

        let att = fleet.attestation(NodeId([0xee; 32]), 0, 100, 1, &[0, 1, 2]);
        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::UnauthorizedReporter(_))
        ));
    }

    #[test]
    fn test_lone_self_signature_rejected() {
        let mut fleet = Fleet::new(4);
        let att = fleet.attestation(fleet.id(0), 0, 100, 1, &[0]);

        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::InsufficientSignatures { got: 1, min: 3 })
        ));
        assert_eq!(fleet.verifier.get_total_workload(&fleet.id(0)), 0);

        let config = AttestationConfig {
            min_signatures: 1,
            ..Default::default()
        };
        let directory = Arc::new(InMemoryDirectory::new());
        assert!(matches!(
            AttestationVerifier::new(config, directory, fleet.clock.clone()),
            Err(AttestationError::Config(ConfigError::MinSignaturesBelowFloor { got: 1, floor: 3 }))
        ));
    }

    #[test]
    fn test_duplicate_signers_counted_once() {
        let mut fleet = Fleet::new(4);

        // Two distinct of three supplied is still a majority.
        let att = fleet.attestation(fleet.id(1), 0, 100, 1, &[0, 1, 0]);
        assert!(fleet.verifier.verify_attestation(&att).is_ok());

        // One distinct of three is not.
        let att = fleet.attestation(fleet.id(1), 0, 100, 2, &[0, 0, 0]);
        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::InvalidSignatureSet { valid: 1, total: 3 })
        ));
    }

    #[test]
    fn test_subject_must_cosign() {
        let mut fleet = Fleet::new(4);
        let att = fleet.attestation(fleet.id(1), 2, 100, 1, &[0, 1, 0]);

        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::MissingSubjectSignature(_))
        ));
        assert_eq!(fleet.verifier.get_total_workload(&fleet.id(2)), 0);
    }

    #[test]
    fn test_epoch_must_increase() {
        let mut fleet = Fleet::new(4);
        let att = fleet.attestation(fleet.id(1), 0, 100, 5, &[0, 1, 2]);
        fleet.verifier.verify_attestation(&att).unwrap();

        for epoch in [4, 5] {
            let att = fleet.attestation(fleet.id(1), 0, 100, epoch, &[0, 1, 2]);
            assert!(matches!(
                fleet.verifier.verify_attestation(&att),
                Err(AttestationError::EpochOutOfOrder { last: 5, .. })
            ));
        }
        assert_eq!(fleet.verifier.get_total_workload(&fleet.id(0)), 100);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let mut fleet = Fleet::new(4);
        let mut att = fleet.attestation(fleet.id(1), 0, 100, 1, &[0, 1, 2]);
        att.payload.workload = 1_000;

        assert!(matches!(
            fleet.verifier.verify_attestation(&att),
            Err(AttestationError::InvalidSignatureSet { valid: 0, total: 3 })
        ));
    }

    #[test]
    fn test_standing_gate() {
        let mut fleet = Fleet::new(4);
        let failing = Blocklist(vec![fleet.id(1), fleet.id(2)]);

        let att = fleet.attestation(fleet.id(3), 0, 100, 1, &[0, 1, 2]);
        assert!(matches!(
            fleet.verifier.verify_attestation_gated(&att, &failing),
            Err(AttestationError::InvalidSignatureSet { valid: 1, total: 3 })
        ));

        let att = fleet.attestation(fleet.id(1), 0, 100, 1, &[0, 3, 2]);
        assert!(matches!(
            fleet.verifier.verify_attestation_gated(&att, &failing),
            Err(AttestationError::UnauthorizedReporter(_))
        ));

        assert!(fleet.verifier.verify_attestation(&att).is_ok());
    }

    #[test]
    fn test_recent_workload_uses_clock() {
        let mut fleet = Fleet::new(4);
        let att = fleet.attestation(fleet.id(1), 0, 100, 1, &[0, 1, 2]);
        fleet.verifier.verify_attestation(&att).unwrap();

        assert_eq!(fleet.verifier.get_recent_workload(&fleet.id(0), 3600), 100);
        fleet.clock.advance(2 * 86_400);
        assert_eq!(fleet.verifier.get_recent_workload(&fleet.id(0), 86_400), 0);
        assert_eq!(fleet.verifier.get_total_workload(&fleet.id(0)), 100);
    }
}
