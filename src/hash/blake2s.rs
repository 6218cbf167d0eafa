use blake2::{Blake2s256, Digest as _};

use super::{HashFamily, MerkleHasher};

/// BLAKE2s-256 Merkle hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2sHasher;

impl MerkleHasher for Blake2sHasher {
    type Digest = [u8; 32];

    fn hash(bytes: &[u8]) -> Self::Digest {
        Blake2s256::digest(bytes).into()
    }

    fn hash_nodes(left: &Self::Digest, right: &Self::Digest) -> Self::Digest {
        let mut hasher = Blake2s256::new();
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
        HashFamily::Blake2s
    }
}
