//! Hash backends for the Merkle commitment layer.
//!
//! The tree never calls a hash function directly; it goes through the
//! [`MerkleHasher`] strategy so the algorithm can be swapped without touching
//! tree construction, proof generation or verification.  Every backend shipped
//! here is a 256-bit cryptographic digest:
//!
//! * [`Sha256Hasher`] – SHA-256, the default.
//! * [`Blake2sHasher`] – BLAKE2s-256.
//! * [`Blake3Hasher`] – BLAKE3 in its default 32-byte mode.
//!
//! Internal nodes always hash the plain concatenation `left || right`.

mod blake2s;
mod blake3;
mod sha256;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use self::blake2s::Blake2sHasher;
pub use self::blake3::Blake3Hasher;
pub use self::sha256::Sha256Hasher;

/// Hash families that can back a Merkle tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFamily {
    /// SHA-256 (FIPS 180-4).
    #[default]
    Sha256,
    /// BLAKE2s with a 256-bit output.
    Blake2s,
    /// BLAKE3 with a 256-bit output.
    Blake3,
}

impl HashFamily {
    /// Lowercase identifier used in configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            HashFamily::Sha256 => "sha256",
            HashFamily::Blake2s => "blake2s",
            HashFamily::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash abstraction used by the Merkle commitment layer.
pub trait MerkleHasher: Send + Sync + 'static {
    type Digest: AsRef<[u8]> + Eq + Copy + Send + Sync + fmt::Debug;

    /// Digest of an arbitrary byte string.  Leaf digests are
    /// `hash(encode(record))`.
    fn hash(bytes: &[u8]) -> Self::Digest;

    /// Parent digest `hash(left || right)`.
    fn hash_nodes(left: &Self::Digest, right: &Self::Digest) -> Self::Digest {
        let mut buffer = Vec::with_capacity(2 * Self::digest_size());
        buffer.extend_from_slice(left.as_ref());
        buffer.extend_from_slice(right.as_ref());
        Self::hash(&buffer)
    }

    /// Width in bytes of every digest this backend produces.
    fn digest_size() -> usize;

    /// Parses raw bytes into a digest, rejecting any other width.
    fn from_bytes(bytes: &[u8]) -> Option<Self::Digest>;

    fn hash_family() -> HashFamily;
}
