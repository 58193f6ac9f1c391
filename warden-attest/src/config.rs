//! Attestation configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fewest signatures any configuration may require.
///
/// Below this a node could certify its own workload alone.
pub const MIN_SIGNATURE_FLOOR: usize = 3;

/// Tunables for attestation acceptance and workload retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationConfig {
    /// Fewest signatures a batch may carry.
    pub min_signatures: usize,
    /// Retention horizon of the recent-workload log.
    pub recent_window_secs: u64,
    /// Width of one recent-workload bucket.
    pub bucket_secs: u64,
    /// Whether the subject must be one of the distinct valid signers.
    pub require_subject_signature: bool,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            min_signatures: 3,
            recent_window_secs: 24 * 60 * 60,
            bucket_secs: 60 * 60,
            require_subject_signature: true,
        }
    }
}

/// Invalid attestation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("minimum signature count {got} is below the floor of {floor}")]
    MinSignaturesBelowFloor { got: usize, floor: usize },

    #[error("bucket width must be positive")]
    ZeroBucket,

    #[error("retention window {window}s is shorter than one bucket ({bucket}s)")]
    WindowShorterThanBucket { window: u64, bucket: u64 },
}

impl AttestationConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_signatures < MIN_SIGNATURE_FLOOR {
            return Err(ConfigError::MinSignaturesBelowFloor {
                got: self.min_signatures,
                floor: MIN_SIGNATURE_FLOOR,
            });
        }
        if self.bucket_secs == 0 {
            return Err(ConfigError::ZeroBucket);
        }
        if self.recent_window_secs < self.bucket_secs {
            return Err(ConfigError::WindowShorterThanBucket {
                window: self.recent_window_secs,
                bucket: self.bucket_secs,
            });
        }
        Ok(())
    }
}
