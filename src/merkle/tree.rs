use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, instrument};

use crate::config::MerkleConfig;
use crate::hash::MerkleHasher;
use crate::utils::parallel::{map_indices, use_parallel};

use super::encode::LeafEncode;
use super::proof::{MerkleProof, TrustedRoot};
use super::types::{expected_depth, Digest, MerkleError, TreeInfo};

/// Binary Merkle tree storing every hashed level for proof generation.
///
/// Levels are flat, index-addressed arrays: `levels[0]` holds the leaf
/// digests, node `i` on one level has its children at `2i` and `2i + 1` on the
/// level below, and the last level holds only the root.  An unmatched last
/// node is paired with itself (`hash(last || last)`), so every proof carries
/// exactly `depth - 1` siblings.
///
/// A value of this type is always fully built and never changes afterwards;
/// a new snapshot of records needs a new tree.
pub struct MerkleTree<H: MerkleHasher> {
    levels: Vec<Vec<H::Digest>>,
    marker: PhantomData<H>,
}

impl<H: MerkleHasher> MerkleTree<H> {
    /// Builds a tree over `records` in iteration order with default settings.
    pub fn build<I>(records: I) -> Result<Self, MerkleError>
    where
        I: IntoIterator,
        I::Item: LeafEncode,
    {
        Self::build_with_config(records, &MerkleConfig::for_hasher::<H>())
    }

    /// Builds a tree over `records` in iteration order.
    ///
    /// The root is a pure function of record order; callers that need a
    /// reproducible root must sort the snapshot canonically first.
    #[instrument(skip_all, fields(hash = %H::hash_family()))]
    pub fn build_with_config<I>(records: I, config: &MerkleConfig) -> Result<Self, MerkleError>
    where
        I: IntoIterator,
        I::Item: LeafEncode,
    {
        config.ensure_hasher::<H>()?;
        let encoded: Vec<Vec<u8>> = records
            .into_iter()
            .map(|record| record.to_leaf_bytes())
            .collect();
        config.ensure_capacity(encoded.len())?;

        let parallel = use_parallel(encoded.len(), config.parallel_threshold);
        let leaves = map_indices(encoded.len(), parallel, |index| H::hash(&encoded[index]));
        Self::assemble(leaves, config)
    }

    /// Builds a tree over already hashed leaves.
    pub fn from_leaf_digests(
        leaves: Vec<H::Digest>,
        config: &MerkleConfig,
    ) -> Result<Self, MerkleError> {
        config.ensure_hasher::<H>()?;
        config.ensure_capacity(leaves.len())?;
        Self::assemble(leaves, config)
    }

    fn assemble(leaves: Vec<H::Digest>, config: &MerkleConfig) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyInput);
        }
        let leaf_count = leaves.len();
        let mut levels = Vec::with_capacity(expected_depth(leaf_count));
        levels.push(leaves);

        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = next_level::<H>(current, config.parallel_threshold);
            levels.push(next);
        }

        let tree = Self {
            levels,
            marker: PhantomData,
        };
        debug!(
            leaves = leaf_count,
            depth = tree.depth(),
            root = %tree.root_hash(),
            "built merkle tree"
        );
        Ok(tree)
    }

    /// Number of levels, leaf level and root level included.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Root digest in the hasher's native representation.
    pub fn root(&self) -> &H::Digest {
        &self.levels[self.levels.len() - 1][0]
    }

    pub fn root_hash(&self) -> Digest {
        convert_digest::<H>(self.root())
    }

    /// Leaf digest at `index`, if present.
    pub fn leaf(&self, index: usize) -> Option<Digest> {
        self.levels[0].get(index).map(convert_digest::<H>)
    }

    /// All digests of one level (`0` = leaves).
    pub fn level(&self, depth: usize) -> Option<&[H::Digest]> {
        self.levels.get(depth).map(Vec::as_slice)
    }

    /// Inclusion proof for the leaf at `index`.
    #[instrument(skip(self), fields(leaves = self.leaf_count()))]
    pub fn get_proof(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        let leaf_count = self.leaf_count();
        if index >= leaf_count {
            return Err(MerkleError::IndexOutOfRange { index, leaf_count });
        }

        let mut siblings = Vec::with_capacity(self.depth() - 1);
        let mut position = index;
        for level in &self.levels[..self.depth() - 1] {
            let sibling = level.get(position ^ 1).unwrap_or(&level[position]);
            siblings.push(convert_digest::<H>(sibling));
            position /= 2;
        }
        debug!(siblings = siblings.len(), "generated inclusion proof");

        Ok(MerkleProof {
            root: self.root_hash(),
            leaf: convert_digest::<H>(&self.levels[0][index]),
            index: index as u64,
            proof: siblings,
        })
    }

    /// Verification context a remote proof should be checked against.
    pub fn trusted_root(&self) -> TrustedRoot {
        TrustedRoot::new(self.root_hash(), self.leaf_count())
    }

    /// Summary of the tree with the first `preview` leaf digests.
    pub fn info(&self, preview: usize) -> TreeInfo {
        TreeInfo {
            depth: self.depth(),
            total_leaves: self.leaf_count(),
            root_hash: self.root_hash(),
            leaves: self.levels[0]
                .iter()
                .take(preview)
                .map(convert_digest::<H>)
                .collect(),
        }
    }
}

impl<H: MerkleHasher> Clone for MerkleTree<H> {
    fn clone(&self) -> Self {
        Self {
            levels: self.levels.clone(),
            marker: PhantomData,
        }
    }
}

impl<H: MerkleHasher> fmt::Debug for MerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleTree")
            .field("hash", &H::hash_family())
            .field("leaves", &self.leaf_count())
            .field("depth", &self.depth())
            .field("root", &self.root_hash())
            .finish()
    }
}

fn next_level<H: MerkleHasher>(current: &[H::Digest], threshold: usize) -> Vec<H::Digest> {
    let parents = current.len().div_ceil(2);
    map_indices(parents, use_parallel(parents, threshold), |index| {
        let left = &current[2 * index];
        let right = current.get(2 * index + 1).unwrap_or(left);
        H::hash_nodes(left, right)
    })
}

pub(crate) fn convert_digest<H: MerkleHasher>(digest: &H::Digest) -> Digest {
    Digest::new(digest.as_ref().to_vec())
}
