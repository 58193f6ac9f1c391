//! Period settlement.
//!
//! Settling a closed period turns its per-node counters into quotas: the
//! relative reward weight each node earned during the period.

use serde::{Deserialize, Serialize};

use warden_core::{NodeDirectory, NodeId, Timestamp, WalletAddress};

use crate::period::{DetectionPeriod, NodeStats};

/// Quota a node earns from its period counters.
///
/// One unit per passed round, forfeited entirely once the node fails more
/// than `max_failures` times.
pub fn quota(stats: &NodeStats, max_failures: u64) -> u64 {
    if stats.failed > max_failures {
        0
    } else {
        stats.passed
    }
}

/// One node's line in a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettlement {
    pub node: NodeId,
    /// Payout wallet at settlement time; `None` if the node left the directory.
    pub wallet: Option<WalletAddress>,
    pub pass_count: u64,
    pub fail_count: u64,
    pub unresolved: u64,
    pub quota: u64,
}

impl NodeSettlement {
    /// Check if the node exceeded the failure budget.
    pub fn is_penalized(&self) -> bool {
        self.quota == 0 && self.pass_count > 0
    }
}

/// Frozen result of settling a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub period_id: u64,
    pub settled_at: Timestamp,
    /// Ordered by node id.
    pub nodes: Vec<NodeSettlement>,
    pub total_quota: u64,
}

impl Settlement {
    /// Settle `period`.
    pub fn compute<D: NodeDirectory + ?Sized>(
        period: &DetectionPeriod,
        directory: &D,
        max_failures: u64,
        settled_at: Timestamp,
    ) -> Self {
        let nodes: Vec<NodeSettlement> = period
            .iter()
            .map(|(node, stats)| NodeSettlement {
                node: *node,
                wallet: directory.wallet_of(node),
                pass_count: stats.passed,
                fail_count: stats.failed,
                unresolved: stats.unresolved(),
                quota: quota(stats, max_failures),
            })
            .collect();
        let total_quota = nodes.iter().map(|n| n.quota).sum();

        Self {
            period_id: period.id,
            settled_at,
            nodes,
            total_quota,
        }
    }

    /// Line for `node`.
    pub fn node(&self, node: &NodeId) -> Option<&NodeSettlement> {
        self.nodes
            .binary_search_by(|n| n.node.cmp(node))
            .ok()
            .map(|i| &self.nodes[i])
    }

    /// Lines with a non-zero quota.
    pub fn rewarded(&self) -> impl Iterator<Item = &NodeSettlement> {
        self.nodes.iter().filter(|n| n.quota > 0)
    }
}
