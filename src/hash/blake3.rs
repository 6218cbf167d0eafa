use super::{HashFamily, MerkleHasher};

/// BLAKE3 Merkle hasher using the default 32-byte output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl MerkleHasher for Blake3Hasher {
    type Digest = [u8; 32];

    fn hash(bytes: &[u8]) -> Self::Digest {
        *::blake3::hash(bytes).as_bytes()
    }

    fn hash_nodes(left: &Self::Digest, right: &Self::Digest) -> Self::Digest {
        let mut hasher = ::blake3::Hasher::new();
        hasher.update(left);
        hasher.update(right);
        *hasher.finalize().as_bytes()
    }

    fn digest_size() -> usize {
        ::blake3::OUT_LEN
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self::Digest> {
        bytes.try_into().ok()
    }

    fn hash_family() -> HashFamily {
        HashFamily::Blake3
    }
}
