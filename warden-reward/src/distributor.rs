//! Constant-pool reward distribution.
//!
//! Each settled period gets a fixed pool of coins split across nodes in
//! proportion to their settlement quota. Periods are distributed strictly in
//! order and at most once. Shares are truncated towards zero; whatever is
//! left over is reported as `remainder`, so for every distribution
//! `total_distributed + remainder == coins`.
//!
//! Credits accumulate per wallet until claimed. Moving tokens is the host's
//! job; this module only does the accounting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use warden_consensus::{GovernanceEngine, Settlement};
use warden_core::{Clock, NodeDirectory, NodeId, WalletAddress};

use crate::error::{RewardError, Result};

/// One node's cut of a period's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub node: NodeId,
    pub wallet: Option<WalletAddress>,
    pub quota: u64,
    pub amount: u128,
}

/// A period's completed distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub period_id: u64,
    pub coins: u128,
    /// Ordered by node id.
    pub shares: Vec<Share>,
    pub total_distributed: u128,
    pub remainder: u128,
}

impl Distribution {
    pub fn share_of(&self, node: &NodeId) -> Option<&Share> {
        self.shares
            .binary_search_by(|s| s.node.cmp(node))
            .ok()
            .map(|i| &self.shares[i])
    }
}

/// Split `coins` across `settlement` by quota.
///
/// Nodes without a wallet at settlement time get nothing; their cut stays in
/// the remainder.
pub fn split_by_quota(settlement: &Settlement, coins: u128) -> Result<Distribution> {
    if coins == 0 {
        return Err(RewardError::InvalidCoins);
    }

    let total_quota = u128::from(settlement.total_quota);
    let mut shares = Vec::with_capacity(settlement.nodes.len());
    for line in &settlement.nodes {
        let amount = match line.wallet {
            Some(_) if total_quota > 0 => coins
                .checked_mul(u128::from(line.quota))
                .ok_or(RewardError::Overflow)?
                / total_quota,
            _ => 0,
        };
        shares.push(Share {
            node: line.node,
            wallet: line.wallet,
            quota: line.quota,
            amount,
        });
    }

    let total_distributed = shares
        .iter()
        .try_fold(0u128, |acc, s| acc.checked_add(s.amount))
        .ok_or(RewardError::Overflow)?;
    let remainder = coins
        .checked_sub(total_distributed)
        .ok_or(RewardError::Overflow)?;

    Ok(Distribution {
        period_id: settlement.period_id,
        coins,
        shares,
        total_distributed,
        remainder,
    })
}

/// Tracks distributed periods and unclaimed wallet balances.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDistributor {
    last_distributed: u64,
    distributions: BTreeMap<u64, Distribution>,
    pending: BTreeMap<WalletAddress, u128>,
    total_distributed: u128,
    total_claimed: u128,
}

impl RewardDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last distributed period (0 if none).
    pub fn last_distributed(&self) -> u64 {
        self.last_distributed
    }

    pub fn distribution(&self, period_id: u64) -> Option<&Distribution> {
        self.distributions.get(&period_id)
    }

    pub fn total_distributed(&self) -> u128 {
        self.total_distributed
    }

    pub fn total_claimed(&self) -> u128 {
        self.total_claimed
    }

    /// Distribute `coins` over period `period_id`, settling it first if needed.
    pub fn distribute_rewards<D: NodeDirectory, C: Clock>(
        &mut self,
        engine: &mut GovernanceEngine<D, C>,
        period_id: u64,
        coins: u128,
    ) -> Result<&Distribution> {
        if coins == 0 {
            return Err(RewardError::InvalidCoins);
        }
        if period_id != 0 && period_id <= self.last_distributed {
            return Err(RewardError::AlreadyDistributed(period_id));
        }
        let expected = self.last_distributed + 1;
        if period_id != expected || period_id >= engine.current_period_id() {
            return Err(RewardError::NotContinuous {
                expected,
                got: period_id,
            });
        }

        if engine.settlement(period_id).is_none() {
            engine.settle_period(period_id)?;
        }
        let settlement = engine.settlement(period_id).ok_or(RewardError::NotContinuous {
            expected,
            got: period_id,
        })?;
        let distribution = split_by_quota(settlement, coins)?;

        let total = self
            .total_distributed
            .checked_add(distribution.total_distributed)
            .ok_or(RewardError::Overflow)?;
        let mut credits: BTreeMap<WalletAddress, u128> = BTreeMap::new();
        for share in distribution.shares.iter().filter(|s| s.amount > 0) {
            let Some(wallet) = share.wallet else { continue };
            let current = match credits.get(&wallet) {
                Some(v) => *v,
                None => self.pending_reward(&wallet),
            };
            credits.insert(wallet, current.checked_add(share.amount).ok_or(RewardError::Overflow)?);
        }

        for (wallet, balance) in credits {
            debug!(%wallet, balance, "Reward credited");
            self.pending.insert(wallet, balance);
        }
        self.total_distributed = total;
        self.last_distributed = period_id;

        info!(
            period = period_id,
            coins,
            distributed = distribution.total_distributed,
            remainder = distribution.remainder,
            "Period rewards distributed"
        );
        Ok(self.distributions.entry(period_id).or_insert(distribution))
    }

    /// Unclaimed balance of a wallet.
    pub fn pending_reward(&self, wallet: &WalletAddress) -> u128 {
        self.pending.get(wallet).copied().unwrap_or(0)
    }

    /// Drain a wallet's pending balance, returning the amount.
    pub fn claim(&mut self, wallet: &WalletAddress) -> u128 {
        let amount = self.pending.remove(wallet).unwrap_or(0);
        if amount > 0 {
            self.total_claimed = self.total_claimed.saturating_add(amount);
            info!(%wallet, amount, "Reward claimed");
        }
        amount
    }
}
