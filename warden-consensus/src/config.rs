//! Governance configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for round cadence, committee size and penalties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Minimum spacing between round openings, and each round's vote window.
    pub round_duration_secs: u64,
    /// Length of a detection period.
    pub detect_duration_secs: u64,
    /// Validators drawn per subject (capped to the active set minus the subject).
    pub committee_size: usize,
    /// Subjects judged per round; `None` judges every active node.
    pub subjects_per_round: Option<usize>,
    /// Failures a node may accumulate in one period and still earn quota.
    pub max_failures_per_period: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: 3600,
            detect_duration_secs: 3600,
            committee_size: 5,
            subjects_per_round: None,
            max_failures_per_period: 3,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("round duration must be positive")]
    ZeroRoundDuration,

    #[error("detect duration {detect}s is shorter than round duration {round}s")]
    DetectShorterThanRound { detect: u64, round: u64 },

    #[error("committee size must be at least 1")]
    ZeroCommittee,

    #[error("subjects per round must be at least 1")]
    ZeroSubjects,
}

impl GovernanceConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_duration_secs == 0 {
            return Err(ConfigError::ZeroRoundDuration);
        }
        if self.detect_duration_secs < self.round_duration_secs {
            return Err(ConfigError::DetectShorterThanRound {
                detect: self.detect_duration_secs,
                round: self.round_duration_secs,
            });
        }
        if self.committee_size == 0 {
            return Err(ConfigError::ZeroCommittee);
        }
        if self.subjects_per_round == Some(0) {
            return Err(ConfigError::ZeroSubjects);
        }
        Ok(())
    }

    /// Nominal number of rounds in one detection period.
    pub fn rounds_per_period(&self) -> u64 {
        self.detect_duration_secs / self.round_duration_secs.max(1)
    }

    /// Builder-style setter for the round duration.
    pub fn with_round_duration(mut self, secs: u64) -> Self {
        self.round_duration_secs = secs;
        self
    }

    /// Builder-style setter for the detect duration.
    pub fn with_detect_duration(mut self, secs: u64) -> Self {
        self.detect_duration_secs = secs;
        self
    }

    /// Builder-style setter for the committee size.
    pub fn with_committee_size(mut self, size: usize) -> Self {
        self.committee_size = size;
        self
    }
}
