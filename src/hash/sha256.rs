use sha2::{Digest as _, Sha256};

use super::{HashFamily, MerkleHasher};

/// SHA-256 Merkle hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl MerkleHasher for Sha256Hasher {
    type Digest = [u8; 32];

    fn hash(bytes: &[u8]) -> Self::Digest {
        Sha256::digest(bytes).into()
    }

    fn hash_nodes(left: &Self::Digest, right: &Self::Digest) -> Self::Digest {
        let mut hasher = Sha256::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    }

    fn digest_size() -> usize {
        32
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self::Digest> {
        bytes.try_into().ok()
    }

    fn hash_family() -> HashFamily {
        HashFamily::Sha256
    }
}
