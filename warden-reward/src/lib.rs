//! Warden Reward - Pays out settled governance periods.
//!
//! [`RewardDistributor`] takes a fixed pool per period and credits node
//! wallets in proportion to the quotas the governance engine settled.

pub mod distributor;
pub mod error;

pub use distributor::{split_by_quota, Distribution, RewardDistributor, Share};
pub use error::{RewardError, Result};
