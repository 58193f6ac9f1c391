//! Warden benchmarks.
//!
//! Installs mimalloc as the global allocator for every bench target and
//! provides the deterministic fleets the benches share.

use std::sync::Arc;

use mimalloc::MiMalloc;

use warden_attest::{Attestation, SignerSignature, WorkloadPayload};
use warden_consensus::{GovernanceConfig, GovernanceEngine};
use warden_core::{
    InMemoryDirectory, ManualClock, NodeId, NodeRecord, SecretKey, Timestamp, WalletAddress,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Start of every bench clock.
pub const GENESIS: Timestamp = Timestamp(1_700_000_000);

/// A directory of `n` active nodes with keys derived from their index.
pub struct Fleet {
    pub keys: Vec<SecretKey>,
    pub directory: Arc<InMemoryDirectory>,
    pub clock: Arc<ManualClock>,
}

impl Fleet {
    pub fn new(n: usize) -> Self {
        let keys: Vec<SecretKey> = (0..n).map(|i| SecretKey::from_bytes(&seed(i))).collect();
        let directory = InMemoryDirectory::from_records(
            keys.iter()
                .map(|k| NodeRecord::new(k.public_key(), WalletAddress([1; 20]))),
        )
        .unwrap_or_default();
        Self {
            keys,
            directory: Arc::new(directory),
            clock: Arc::new(ManualClock::new(GENESIS)),
        }
    }

    pub fn id(&self, i: usize) -> NodeId {
        NodeId::from_public_key(&self.keys[i].public_key())
    }

    /// Engine over this fleet with the clock already past the first round gap.
    pub fn engine(
        &self,
        config: GovernanceConfig,
    ) -> Option<GovernanceEngine<InMemoryDirectory, Arc<ManualClock>>> {
        let engine = GovernanceEngine::new(config.clone(), self.directory.clone(), self.clock.clone()).ok()?;
        self.clock.advance(config.round_duration_secs);
        Some(engine)
    }

    /// Attestation of `workload` about node 0, signed by the first `signers` nodes.
    pub fn attestation(&self, signers: usize, epoch_id: u64) -> Attestation {
        let subject = self.id(0);
        let payload = WorkloadPayload::new(100, 1, 1);
        Attestation {
            reporter: self.id(1 % self.keys.len()),
            subject,
            payload,
            epoch_id,
            signatures: self.keys[..signers]
                .iter()
                .map(|k| SignerSignature::attest(k, &subject, &payload, epoch_id))
                .collect(),
        }
    }
}

fn seed(i: usize) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&(i as u64 + 1).to_le_bytes());
    bytes
}
