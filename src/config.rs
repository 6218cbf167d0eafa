//! Tree construction settings.
//!
//! # Example
//!
//! ```
//! use donation_merkle::{HashFamily, MerkleConfig};
//!
//! // Defaults: SHA-256, one million leaves, parallel above 1024 nodes.
//! let config = MerkleConfig::default();
//! assert_eq!(config.hash, HashFamily::Sha256);
//!
//! // Partial JSON falls back to defaults for missing fields.
//! let config: MerkleConfig = serde_json::from_str(r#"{ "max_leaves": 4096 }"#).unwrap();
//! assert_eq!(config.max_leaves, 4096);
//! assert_eq!(config.info_preview, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::hash::{HashFamily, MerkleHasher};
use crate::merkle::MerkleError;

/// Settings consumed by [`MerkleTree`](crate::merkle::MerkleTree) and the
/// donation layer.
///
/// | Field | Default |
/// |-------|---------|
/// | `hash` | [`HashFamily::Sha256`] |
/// | `max_leaves` | `1_048_576` |
/// | `parallel_threshold` | `1024` |
/// | `info_preview` | `5` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleConfig {
    /// Hash family the tree must be built with.
    #[serde(default)]
    pub hash: HashFamily,

    /// Largest snapshot a single build accepts.
    #[serde(default = "default_max_leaves")]
    pub max_leaves: usize,

    /// Minimum level width before hashing fans out over worker threads
    /// (only with the `parallel` feature).
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Number of leaf digests previewed in [`TreeInfo`](crate::merkle::TreeInfo).
    #[serde(default = "default_info_preview")]
    pub info_preview: usize,
}

fn default_max_leaves() -> usize {
    1 << 20
}

fn default_parallel_threshold() -> usize {
    1024
}

fn default_info_preview() -> usize {
    5
}

impl Default for MerkleConfig {
    fn default() -> Self {
        Self {
            hash: HashFamily::default(),
            max_leaves: default_max_leaves(),
            parallel_threshold: default_parallel_threshold(),
            info_preview: default_info_preview(),
        }
    }
}

impl MerkleConfig {
    /// Default settings bound to the hash family of `H`.
    pub fn for_hasher<H: MerkleHasher>() -> Self {
        Self {
            hash: H::hash_family(),
            ..Self::default()
        }
    }

    pub fn with_max_leaves(mut self, max_leaves: usize) -> Self {
        self.max_leaves = max_leaves;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_info_preview(mut self, preview: usize) -> Self {
        self.info_preview = preview;
        self
    }

    /// Checks the settings on their own.
    pub fn validate(&self) -> Result<(), MerkleError> {
        if self.max_leaves == 0 {
            return Err(MerkleError::IncompatibleConfig {
                reason: "max_leaves must be at least 1",
            });
        }
        if self.parallel_threshold == 0 {
            return Err(MerkleError::IncompatibleConfig {
                reason: "parallel_threshold must be at least 1",
            });
        }
        Ok(())
    }

    /// Checks the settings against the hasher a tree is about to use.
    pub fn ensure_hasher<H: MerkleHasher>(&self) -> Result<(), MerkleError> {
        self.validate()?;
        if self.hash != H::hash_family() {
            return Err(MerkleError::IncompatibleConfig {
                reason: "hash family mismatch",
            });
        }
        Ok(())
    }

    /// Rejects snapshots larger than `max_leaves`.
    pub(crate) fn ensure_capacity(&self, count: usize) -> Result<(), MerkleError> {
        if count > self.max_leaves {
            return Err(MerkleError::TooManyLeaves {
                count,
                max: self.max_leaves,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Blake3Hasher, Sha256Hasher};

    #[test]
    fn defaults_match_documentation() {
        let config = MerkleConfig::default();
        assert_eq!(config.hash, HashFamily::Sha256);
        assert_eq!(config.max_leaves, 1_048_576);
        assert_eq!(config.parallel_threshold, 1024);
        assert_eq!(config.info_preview, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserialises_with_defaults() {
        let config: MerkleConfig =
            serde_json::from_str(r#"{ "hash": "blake3", "info_preview": 2 }"#).unwrap();
        assert_eq!(config.hash, HashFamily::Blake3);
        assert_eq!(config.info_preview, 2);
        assert_eq!(config.max_leaves, default_max_leaves());
        assert!(serde_json::from_str::<MerkleConfig>(r#"{ "hash": "md5" }"#).is_err());
    }

    #[test]
    fn hasher_mismatch_is_rejected() {
        let config = MerkleConfig::default();
        assert!(config.ensure_hasher::<Sha256Hasher>().is_ok());
        assert_eq!(
            config.ensure_hasher::<Blake3Hasher>(),
            Err(MerkleError::IncompatibleConfig {
                reason: "hash family mismatch"
            })
        );
        assert!(MerkleConfig::for_hasher::<Blake3Hasher>()
            .ensure_hasher::<Blake3Hasher>()
            .is_ok());
    }

    #[test]
    fn zero_limits_are_invalid() {
        assert!(MerkleConfig::default().with_max_leaves(0).validate().is_err());
        assert!(MerkleConfig::default()
            .with_parallel_threshold(0)
            .validate()
            .is_err());
    }

    #[test]
    fn capacity_is_enforced() {
        let config = MerkleConfig::default().with_max_leaves(2);
        assert!(config.ensure_capacity(2).is_ok());
        assert_eq!(
            config.ensure_capacity(3),
            Err(MerkleError::TooManyLeaves { count: 3, max: 2 })
        );
    }
}
