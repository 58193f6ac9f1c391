//! Node directory interface.
//!
//! The directory is owned by an external registry. Warden reads membership,
//! activity flags, keys and capacities from it and never writes to it.
//! [`InMemoryDirectory`] is the reference implementation used by hosts that
//! keep the registry in process, and by tests.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::crypto::{hash_all, Hash, PublicKey};
use crate::error::{Error, Result};
use crate::node::{GpuCapacity, NodeId, NodeRecord, WalletAddress};

/// Read-only view of the node registry.
pub trait NodeDirectory: Send + Sync {
    /// Look up a node record.
    fn get(&self, id: &NodeId) -> Option<NodeRecord>;

    /// Ids of all active nodes, in ascending order.
    fn list_active(&self) -> Vec<NodeId>;

    /// Whether `id` is registered and active.
    fn is_active(&self, id: &NodeId) -> bool {
        self.get(id).map(|r| r.active).unwrap_or(false)
    }

    /// GPU capacity of a node.
    fn capacity_of(&self, id: &NodeId) -> Option<GpuCapacity> {
        self.get(id).map(|r| r.capacity)
    }

    /// Signing key of a node.
    fn public_key_of(&self, id: &NodeId) -> Option<PublicKey> {
        self.get(id).map(|r| r.public_key)
    }

    /// Payout wallet of a node.
    fn wallet_of(&self, id: &NodeId) -> Option<WalletAddress> {
        self.get(id).map(|r| r.wallet)
    }

    /// Commitment over the active set.
    ///
    /// Any change to membership or activity changes the commitment, which
    /// makes it usable as sortition seed material.
    fn commitment(&self) -> Hash {
        let active = self.list_active();
        hash_all(&active.iter().map(|id| id.as_bytes()).collect::<Vec<_>>())
    }
}

/// Whether a node is currently in good standing with the governance layer.
///
/// Implemented by the governance engine and consumed by gates that want to
/// refuse input from nodes that are failing their liveness checks.
pub trait NodeStanding {
    /// Returns `false` for nodes currently over their failure budget.
    fn in_good_standing(&self, node: &NodeId) -> bool;
}

/// In-process node registry.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    nodes: RwLock<BTreeMap<NodeId, NodeRecord>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory from a list of records.
    pub fn from_records(records: impl IntoIterator<Item = NodeRecord>) -> Result<Self> {
        let directory = Self::new();
        for record in records {
            directory.register(record)?;
        }
        Ok(directory)
    }

    /// Register a node.
    pub fn register(&self, record: NodeRecord) -> Result<()> {
        record.validate()?;
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&record.id) {
            return Err(Error::duplicate(format!("node {} already registered", record.id)));
        }
        nodes.insert(record.id, record);
        Ok(())
    }

    /// Remove a node entirely.
    pub fn deregister(&self, id: &NodeId) -> Result<NodeRecord> {
        self.nodes
            .write()
            .remove(id)
            .ok_or_else(|| Error::node_not_found(id.to_string()))
    }

    /// Flip a node's activity flag.
    pub fn set_active(&self, id: &NodeId, active: bool) -> Result<()> {
        let mut nodes = self.nodes.write();
        let record = nodes
            .get_mut(id)
            .ok_or_else(|| Error::node_not_found(id.to_string()))?;
        record.active = active;
        Ok(())
    }

    /// Number of registered nodes, active or not.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Check if no node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl NodeDirectory for InMemoryDirectory {
    fn get(&self, id: &NodeId) -> Option<NodeRecord> {
        self.nodes.read().get(id).cloned()
    }

    fn list_active(&self) -> Vec<NodeId> {
        self.nodes
            .read()
            .values()
            .filter(|r| r.active)
            .map(|r| r.id)
            .collect()
    }

    fn is_active(&self, id: &NodeId) -> bool {
        self.nodes.read().get(id).map(|r| r.active).unwrap_or(false)
    }
}
