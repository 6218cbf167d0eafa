//! Binary Merkle commitments over ordered record snapshots.
//!
//! The module fixes the following rules:
//!
//! * **Leaves:** `hash(encode(record))`, where `encode` is the record's
//!   [`LeafEncode`] implementation.  Leaf order is the snapshot order.
//! * **Internal nodes:** `hash(left || right)` over the two child digests.
//! * **Odd levels:** the unmatched last node is paired with itself
//!   (Rightmost-Child Duplication).  Every proof therefore has exactly
//!   `depth - 1` siblings.  Duplication lets `[A, B, C]` and `[A, B, C, C]`
//!   share a root; [`verify_proof`] closes that gap by requiring the trusted
//!   leaf count and rejecting any index at or beyond it.
//! * **Verification:** a proof is only accepted against a [`TrustedRoot`]
//!   obtained independently of the proof.  A proof claiming that root must
//!   match its depth exactly; a proof for any other root is a mismatch, never
//!   an error, as long as it is well formed.
//! * **Hash family:** selected through the [`MerkleHasher`] type parameter.
//!
//! [`MerkleHasher`]: crate::hash::MerkleHasher

mod encode;
mod proof;
mod ser;
mod tree;
mod types;

pub use encode::{encode_leaf, put_field, LeafEncode};
pub use proof::{
    verify, verify_proof, MerkleProof, TrustedRoot, Verification, MAX_PROOF_SIBLINGS,
};
pub use ser::{decode_proof, encode_proof, PROOF_ENCODING_VERSION};
pub use tree::MerkleTree;
pub use types::{expected_depth, Digest, MerkleError, ProofDefect, TreeInfo};

pub(crate) use tree::convert_digest;
