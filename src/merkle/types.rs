use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Canonical digest carried by proofs, roots and tree metadata.
///
/// The byte length is not fixed at the type level: digests arrive from
/// untrusted proofs and their width is only checked against the active
/// [`MerkleHasher`](crate::hash::MerkleHasher) during verification.
/// Serialises as a lowercase hex string.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Digest {
    bytes: Vec<u8>,
}

impl Digest {
    /// Creates a digest from raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parses a hex encoded digest (either case, no `0x` prefix).
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(hex).map(Self::new)
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Returns a reference to the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable view into the digest bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest(0x{})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> From<[u8; N]> for Digest {
    fn from(bytes: [u8; N]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Digest::from_hex(&hex).map_err(de::Error::custom)
    }
}

/// Introspection summary of a built tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeInfo {
    /// Number of levels, leaf and root level included.
    pub depth: usize,
    pub total_leaves: usize,
    pub root_hash: Digest,
    /// The first few leaf digests in tree order.
    pub leaves: Vec<Digest>,
}

/// Reason a received proof failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofDefect {
    #[error("{field} digest is {got} bytes, expected {expected}")]
    DigestWidth {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("path carries {got} siblings, expected {expected}")]
    PathLength { expected: usize, got: usize },
    #[error("path carries {got} siblings, at most {max} are accepted")]
    PathTooLong { max: usize, got: usize },
    #[error("index {index} does not address one of {leaf_count} leaves")]
    Index { index: u64, leaf_count: usize },
}

/// Errors emitted by the Merkle layer and the donation adapter.
///
/// A proof that merely fails to verify is not an error; see
/// [`Verification`](super::Verification).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MerkleError {
    #[error("no leaves supplied")]
    EmptyInput,
    #[error("index {index} out of range ({leaf_count} leaves)")]
    IndexOutOfRange { index: usize, leaf_count: usize },
    #[error("record {id} not found in snapshot")]
    NotFound { id: u64 },
    #[error("malformed proof: {0}")]
    MalformedProof(#[from] ProofDefect),
    #[error("{count} leaves exceed the configured maximum of {max}")]
    TooManyLeaves { count: usize, max: usize },
    #[error("record id {id} appears more than once in the snapshot")]
    DuplicateId { id: u64 },
    #[error("incompatible configuration: {reason}")]
    IncompatibleConfig { reason: &'static str },
    #[error("proof encoding version {got} is not supported (expected {expected})")]
    UnsupportedVersion { expected: u16, got: u16 },
    #[error("malformed proof encoding at `{field}`")]
    Serialization { field: &'static str },
    #[error("background build failed: {reason}")]
    BackgroundTask { reason: String },
}

/// Number of levels a tree over `leaf_count` leaves has: `ceil(log2 n) + 1`,
/// or `1` for a single leaf.
pub fn expected_depth(leaf_count: usize) -> usize {
    if leaf_count <= 1 {
        1
    } else {
        (usize::BITS - (leaf_count - 1).leading_zeros()) as usize + 1
    }
}
