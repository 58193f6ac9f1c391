//! Node identity types.
//!
//! A node is a compute provider registered in the external directory. Warden
//! only ever holds immutable snapshots of node records; registration and
//! capacity bookkeeping happen elsewhere.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::{hash, Hash, PublicKey};
use crate::error::{Error, Result};

/// Opaque, stable identifier of a node.
///
/// Derived from the node's signing key so that a recovered signer maps to
/// exactly one directory entry.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// The zero id; never a valid node.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Derive the id of the node owning `key`.
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(*hash(&key.as_bytes()).as_bytes())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check for the zero id.
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Full hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<Hash> for NodeId {
    fn from(hash: Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

/// 20-byte payout address of a node operator.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletAddress(pub [u8; 20]);

impl WalletAddress {
    /// The zero address; never a valid wallet.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| Error::invalid_node("wallet address must be 20 bytes"))?;
        Ok(Self(arr))
    }

    /// Check for the zero address.
    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }
}

impl fmt::Debug for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wallet(0x{})", hex::encode(self.0))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// GPU capacity of a node: GPU model name to card count.
pub type GpuCapacity = BTreeMap<String, u32>;

/// A node as recorded in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Stable identifier.
    pub id: NodeId,
    /// Key the node signs votes and attestations with.
    pub public_key: PublicKey,
    /// Payout wallet.
    pub wallet: WalletAddress,
    /// Per-GPU-type card counts.
    pub capacity: GpuCapacity,
    /// Whether the node currently participates.
    pub active: bool,
}

impl NodeRecord {
    /// Create an active record whose id is derived from `public_key`.
    pub fn new(public_key: PublicKey, wallet: WalletAddress) -> Self {
        Self {
            id: NodeId::from_public_key(&public_key),
            public_key,
            wallet,
            capacity: GpuCapacity::new(),
            active: true,
        }
    }

    /// Add GPU capacity.
    pub fn with_gpu(mut self, model: impl Into<String>, count: u32) -> Self {
        *self.capacity.entry(model.into()).or_insert(0) += count;
        self
    }

    /// Check the record is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_zero() {
            return Err(Error::invalid_node("zero node id"));
        }
        if self.wallet.is_zero() {
            return Err(Error::invalid_node(format!("node {} has zero wallet", self.id)));
        }
        if self.id != NodeId::from_public_key(&self.public_key) {
            return Err(Error::invalid_node(format!(
                "node {} does not match its public key",
                self.id
            )));
        }
        Ok(())
    }

    /// Total GPU cards across all models.
    pub fn total_gpus(&self) -> u64 {
        self.capacity.values().map(|&n| u64::from(n)).sum()
    }
}
