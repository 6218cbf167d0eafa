//! Compact binary framing for [`MerkleProof`].
//!
//! Layout, all integers little-endian:
//!
//! | Field | Size |
//! |-------|------|
//! | version | `u16` |
//! | digest size `d` | `u16` |
//! | index | `u64` |
//! | leaf | `d` |
//! | root | `d` |
//! | sibling count | `u32` |
//! | siblings | `count * d` |

use super::proof::MerkleProof;
use super::types::{Digest, MerkleError};

/// Version tag written by [`encode_proof`].
pub const PROOF_ENCODING_VERSION: u16 = 1;

/// Serialises a [`MerkleProof`] into the canonical byte layout.
pub fn encode_proof(proof: &MerkleProof) -> Result<Vec<u8>, MerkleError> {
    let digest_size = proof.leaf.len();
    let width = u16::try_from(digest_size).map_err(|_| MerkleError::Serialization {
        field: "digest_size",
    })?;
    if proof.root.len() != digest_size {
        return Err(MerkleError::Serialization { field: "root" });
    }
    if proof.proof.iter().any(|sibling| sibling.len() != digest_size) {
        return Err(MerkleError::Serialization { field: "siblings" });
    }
    let count = u32::try_from(proof.proof.len()).map_err(|_| MerkleError::Serialization {
        field: "sibling_count",
    })?;

    let mut out = Vec::with_capacity(20 + digest_size * (2 + proof.proof.len()));
    out.extend_from_slice(&PROOF_ENCODING_VERSION.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&proof.index.to_le_bytes());
    out.extend_from_slice(proof.leaf.as_bytes());
    out.extend_from_slice(proof.root.as_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    for sibling in &proof.proof {
        out.extend_from_slice(sibling.as_bytes());
    }
    Ok(out)
}

/// Deserialises a [`MerkleProof`] from its canonical byte representation.
pub fn decode_proof(bytes: &[u8]) -> Result<MerkleProof, MerkleError> {
    let mut cursor = 0usize;
    let mut take = |len: usize, field: &'static str| -> Result<&[u8], MerkleError> {
        let end = cursor
            .checked_add(len)
            .filter(|end| *end <= bytes.len())
            .ok_or(MerkleError::Serialization { field })?;
        let slice = &bytes[cursor..end];
        cursor = end;
        Ok(slice)
    };

    let mut version_bytes = [0u8; 2];
    version_bytes.copy_from_slice(take(2, "version")?);
    let version = u16::from_le_bytes(version_bytes);
    if version != PROOF_ENCODING_VERSION {
        return Err(MerkleError::UnsupportedVersion {
            expected: PROOF_ENCODING_VERSION,
            got: version,
        });
    }

    let mut width_bytes = [0u8; 2];
    width_bytes.copy_from_slice(take(2, "digest_size")?);
    let digest_size = u16::from_le_bytes(width_bytes) as usize;

    let mut index_bytes = [0u8; 8];
    index_bytes.copy_from_slice(take(8, "index")?);
    let index = u64::from_le_bytes(index_bytes);

    let leaf = Digest::new(take(digest_size, "leaf")?.to_vec());
    let root = Digest::new(take(digest_size, "root")?.to_vec());

    let mut count_bytes = [0u8; 4];
    count_bytes.copy_from_slice(take(4, "sibling_count")?);
    let count = u32::from_le_bytes(count_bytes) as usize;

    let mut siblings = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        siblings.push(Digest::new(take(digest_size, "siblings")?.to_vec()));
    }

    if cursor != bytes.len() {
        return Err(MerkleError::Serialization {
            field: "trailing_bytes",
        });
    }

    Ok(MerkleProof {
        root,
        leaf,
        index,
        proof: siblings,
    })
}
