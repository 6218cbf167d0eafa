use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::hash::MerkleHasher;

use super::types::{expected_depth, Digest, MerkleError, ProofDefect};

/// Inclusion proof for one leaf.
///
/// Serialises to the wire envelope
/// `{ "root": hex, "leaf": hex, "index": n, "proof": [hex, ...] }` with the
/// siblings ordered from the leaf level up to the level below the root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Root of the tree the proof was generated from.
    pub root: Digest,
    pub leaf: Digest,
    /// Original position of the leaf.
    pub index: u64,
    /// Sibling digests, one per level below the root.
    pub proof: Vec<Digest>,
}

impl MerkleProof {
    pub fn siblings(&self) -> &[Digest] {
        &self.proof
    }
}

/// Independently obtained verification context: the current root and the
/// number of leaves it commits to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedRoot {
    pub root: Digest,
    pub leaf_count: usize,
}

impl TrustedRoot {
    pub fn new(root: Digest, leaf_count: usize) -> Self {
        Self { root, leaf_count }
    }

    /// Depth of a tree over `leaf_count` leaves.
    pub fn depth(&self) -> usize {
        expected_depth(self.leaf_count)
    }
}

/// Outcome of checking a structurally valid proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// The path recomputes the root stated in the proof.
    pub proof_valid: bool,
    /// The stated root equals the trusted root.
    pub root_matches: bool,
}

impl Verification {
    pub fn verified(&self) -> bool {
        self.proof_valid && self.root_matches
    }
}

struct CheckedProof<H: MerkleHasher> {
    leaf: H::Digest,
    root: H::Digest,
    siblings: Vec<H::Digest>,
    index: usize,
}

fn parse_digest<H: MerkleHasher>(
    field: &'static str,
    digest: &Digest,
) -> Result<H::Digest, ProofDefect> {
    H::from_bytes(digest.as_bytes()).ok_or(ProofDefect::DigestWidth {
        field,
        expected: H::digest_size(),
        got: digest.len(),
    })
}

/// Longest path accepted from a proof whose root is not the trusted one.
pub const MAX_PROOF_SIBLINGS: usize = 64;

/// Structural validation; nothing is hashed here.
///
/// A proof that claims the trusted root must have exactly the trusted depth
/// and an index below the trusted leaf count.  A proof for another root (a
/// stale snapshot, typically) is only held to its own path: at most
/// [`MAX_PROOF_SIBLINGS`] siblings and an index that fits in them.
fn check_structure<H: MerkleHasher>(
    proof: &MerkleProof,
    trusted: &TrustedRoot,
) -> Result<CheckedProof<H>, ProofDefect> {
    let leaf = parse_digest::<H>("leaf", &proof.leaf)?;
    let root = parse_digest::<H>("root", &proof.root)?;
    let siblings = proof
        .siblings()
        .iter()
        .map(|sibling| parse_digest::<H>("sibling", sibling))
        .collect::<Result<Vec<_>, _>>()?;

    let index_defect = ProofDefect::Index {
        index: proof.index,
        leaf_count: trusted.leaf_count,
    };
    let index = if proof.root.as_bytes() == trusted.root.as_bytes() {
        let expected = trusted.depth() - 1;
        if siblings.len() != expected {
            return Err(ProofDefect::PathLength {
                expected,
                got: siblings.len(),
            });
        }
        usize::try_from(proof.index)
            .ok()
            .filter(|index| *index < trusted.leaf_count)
            .ok_or(index_defect)?
    } else {
        if siblings.len() > MAX_PROOF_SIBLINGS {
            return Err(ProofDefect::PathTooLong {
                max: MAX_PROOF_SIBLINGS,
                got: siblings.len(),
            });
        }
        let fits = proof
            .index
            .checked_shr(siblings.len() as u32)
            .map_or(true, |high| high == 0);
        usize::try_from(proof.index)
            .ok()
            .filter(|_| fits)
            .ok_or(index_defect)?
    };

    Ok(CheckedProof {
        leaf,
        root,
        siblings,
        index,
    })
}

/// Checks `proof` against an independently obtained `trusted` root.
///
/// Structurally malformed proofs (wrong digest width, a path that does not fit
/// the trusted tree's depth, an index outside the trusted leaf count) are
/// rejected with [`MerkleError::MalformedProof`] before any hashing.  A proof
/// for a different root is recomputed over its own path, so a stale proof
/// still reports whether it was internally consistent.  A well-formed proof
/// always yields a [`Verification`]; a failed check is data, not an error.
#[instrument(skip_all, fields(index = proof.index, leaves = trusted.leaf_count))]
pub fn verify_proof<H: MerkleHasher>(
    proof: &MerkleProof,
    trusted: &TrustedRoot,
) -> Result<Verification, MerkleError> {
    let checked = check_structure::<H>(proof, trusted)?;

    let mut computed = checked.leaf;
    let mut position = checked.index;
    for sibling in &checked.siblings {
        computed = if position % 2 == 1 {
            H::hash_nodes(sibling, &computed)
        } else {
            H::hash_nodes(&computed, sibling)
        };
        position /= 2;
    }

    let verification = Verification {
        proof_valid: computed == checked.root,
        root_matches: proof.root.as_bytes() == trusted.root.as_bytes(),
    };
    debug!(
        proof_valid = verification.proof_valid,
        root_matches = verification.root_matches,
        "verified inclusion proof"
    );
    Ok(verification)
}

/// Boolean form of [`verify_proof`].
pub fn verify<H: MerkleHasher>(
    proof: &MerkleProof,
    trusted: &TrustedRoot,
) -> Result<bool, MerkleError> {
    Ok(verify_proof::<H>(proof, trusted)?.verified())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Blake3Hasher, Sha256Hasher};
    use crate::merkle::MerkleTree;

    type Tree = MerkleTree<Sha256Hasher>;

    fn tree(n: usize) -> Tree {
        let records: Vec<String> = (0..n).map(|i| format!("donation-{i}")).collect();
        Tree::build(&records).unwrap()
    }

    #[test]
    fn every_index_verifies() {
        for n in [1, 2, 3, 5, 8, 13] {
            let tree = tree(n);
            let trusted = tree.trusted_root();
            for index in 0..n {
                let proof = tree.get_proof(index).unwrap();
                assert!(verify::<Sha256Hasher>(&proof, &trusted).unwrap(), "n={n} i={index}");
            }
        }
    }

    #[test]
    fn single_byte_mutations_fail() {
        let tree = tree(7);
        let trusted = tree.trusted_root();
        let proof = tree.get_proof(4).unwrap();

        let mut leaf = proof.clone();
        leaf.leaf.as_bytes_mut()[0] ^= 0x01;
        assert!(!verify::<Sha256Hasher>(&leaf, &trusted).unwrap());

        for level in 0..proof.proof.len() {
            let mut sibling = proof.clone();
            sibling.proof[level].as_bytes_mut()[31] ^= 0x80;
            let outcome = verify_proof::<Sha256Hasher>(&sibling, &trusted).unwrap();
            assert!(!outcome.proof_valid);
            assert!(outcome.root_matches);
        }

        let mut root = proof;
        root.root.as_bytes_mut()[5] ^= 0x10;
        let outcome = verify_proof::<Sha256Hasher>(&root, &trusted).unwrap();
        assert!(!outcome.proof_valid);
        assert!(!outcome.root_matches);
    }

    #[test]
    fn self_consistent_proof_against_other_root() {
        let tree = tree(4);
        let proof = tree.get_proof(1).unwrap();
        let other = TrustedRoot::new(Digest::from([0x42u8; 32]), 4);
        let outcome = verify_proof::<Sha256Hasher>(&proof, &other).unwrap();
        assert!(outcome.proof_valid);
        assert!(!outcome.root_matches);
        assert!(!outcome.verified());
    }

    #[test]
    fn short_path_is_malformed() {
        let tree = tree(5);
        let mut proof = tree.get_proof(0).unwrap();
        proof.proof.pop();
        assert_eq!(proof.proof.len(), tree.depth() - 2);
        assert_eq!(
            verify::<Sha256Hasher>(&proof, &tree.trusted_root()).unwrap_err(),
            MerkleError::MalformedProof(ProofDefect::PathLength {
                expected: 3,
                got: 2
            })
        );
    }

    #[test]
    fn wrong_width_is_malformed() {
        let tree = tree(2);
        let mut proof = tree.get_proof(0).unwrap();
        proof.proof[0] = Digest::new(vec![0u8; 20]);
        assert_eq!(
            verify::<Sha256Hasher>(&proof, &tree.trusted_root()).unwrap_err(),
            MerkleError::MalformedProof(ProofDefect::DigestWidth {
                field: "sibling",
                expected: 32,
                got: 20
            })
        );
    }

    #[test]
    fn index_outside_trusted_tree_is_malformed() {
        let tree = tree(3);
        let mut proof = tree.get_proof(2).unwrap();
        proof.index = 3;
        assert!(matches!(
            verify::<Sha256Hasher>(&proof, &tree.trusted_root()),
            Err(MerkleError::MalformedProof(ProofDefect::Index { index: 3, .. }))
        ));
        proof.index = u64::MAX;
        assert!(matches!(
            verify::<Sha256Hasher>(&proof, &tree.trusted_root()),
            Err(MerkleError::MalformedProof(ProofDefect::Index { .. }))
        ));
    }

    #[test]
    fn duplicate_tail_forgery_is_bounded_by_leaf_count() {
        let honest = Tree::build(["A", "B", "C"]).unwrap();
        let padded = Tree::build(["A", "B", "C", "C"]).unwrap();
        assert_eq!(honest.root(), padded.root());

        // A proof for the phantom fourth leaf recomputes the honest root...
        let forged = padded.get_proof(3).unwrap();
        let loose = TrustedRoot::new(honest.root_hash(), 4);
        assert!(verify::<Sha256Hasher>(&forged, &loose).unwrap());

        // ...but the honest context only admits indices below three.
        assert!(matches!(
            verify::<Sha256Hasher>(&forged, &honest.trusted_root()),
            Err(MerkleError::MalformedProof(ProofDefect::Index { index: 3, leaf_count: 3 }))
        ));
    }

    #[test]
    fn stale_proof_from_a_shallower_tree_is_a_mismatch() {
        let old = tree(4);
        let proof = old.get_proof(2).unwrap();
        let current = tree(5);
        assert_eq!(proof.proof.len() + 1, current.depth() - 1);

        let outcome = verify_proof::<Sha256Hasher>(&proof, &current.trusted_root()).unwrap();
        assert!(outcome.proof_valid);
        assert!(!outcome.root_matches);
    }

    #[test]
    fn foreign_path_is_bounded() {
        let tree = tree(2);
        let mut proof = tree.get_proof(0).unwrap();
        proof.root = Digest::from([7u8; 32]);
        proof.proof = vec![Digest::from([1u8; 32]); MAX_PROOF_SIBLINGS + 1];
        assert_eq!(
            verify_proof::<Sha256Hasher>(&proof, &tree.trusted_root()).unwrap_err(),
            MerkleError::MalformedProof(ProofDefect::PathTooLong {
                max: MAX_PROOF_SIBLINGS,
                got: MAX_PROOF_SIBLINGS + 1
            })
        );
    }

    #[test]
    fn foreign_index_must_fit_its_path() {
        let tree = tree(4);
        let mut proof = tree.get_proof(3).unwrap();
        proof.root = Digest::from([7u8; 32]);
        proof.index = 4;
        assert!(matches!(
            verify_proof::<Sha256Hasher>(&proof, &tree.trusted_root()),
            Err(MerkleError::MalformedProof(ProofDefect::Index { index: 4, .. }))
        ));
    }

    #[test]
    fn hasher_must_match_the_tree() {
        let tree = tree(4);
        let proof = tree.get_proof(2).unwrap();
        let outcome = verify_proof::<Blake3Hasher>(&proof, &tree.trusted_root()).unwrap();
        assert!(!outcome.proof_valid);
        assert!(outcome.root_matches);
    }
}
