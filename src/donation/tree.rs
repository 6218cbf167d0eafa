use std::collections::HashMap;
use std::fmt;

use tracing::{debug, instrument};

use crate::config::MerkleConfig;
use crate::hash::{MerkleHasher, Sha256Hasher};
use crate::merkle::{convert_digest, Digest, LeafEncode, MerkleError, MerkleProof, MerkleTree};

use super::record::Donation;

/// Merkle tree over one snapshot of donations.
///
/// Wraps a generic [`MerkleTree`] and keeps an id → leaf index map, so
/// lookups are constant time.  Leaf order is the order of the snapshot passed
/// in; the tree never reorders.
pub struct DonationMerkleTree<H: MerkleHasher = Sha256Hasher> {
    tree: MerkleTree<H>,
    donations: Vec<Donation>,
    positions: HashMap<u64, usize>,
}

impl<H: MerkleHasher> DonationMerkleTree<H> {
    pub fn new(donations: Vec<Donation>) -> Result<Self, MerkleError> {
        Self::with_config(donations, &MerkleConfig::for_hasher::<H>())
    }

    #[instrument(skip_all, fields(donations = donations.len()))]
    pub fn with_config(
        donations: Vec<Donation>,
        config: &MerkleConfig,
    ) -> Result<Self, MerkleError> {
        let mut positions = HashMap::with_capacity(donations.len());
        for (position, donation) in donations.iter().enumerate() {
            if positions.insert(donation.id, position).is_some() {
                return Err(MerkleError::DuplicateId { id: donation.id });
            }
        }
        let tree = MerkleTree::build_with_config(&donations, config)?;
        Ok(Self {
            tree,
            donations,
            positions,
        })
    }

    pub fn tree(&self) -> &MerkleTree<H> {
        &self.tree
    }

    /// Donations in leaf order.
    pub fn donations(&self) -> &[Donation] {
        &self.donations
    }

    pub fn len(&self) -> usize {
        self.donations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.donations.is_empty()
    }

    pub fn root_hash(&self) -> Digest {
        self.tree.root_hash()
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Leaf position of the donation with `id`.
    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn donation(&self, id: u64) -> Option<&Donation> {
        self.index_of(id).map(|index| &self.donations[index])
    }

    /// Inclusion proof for the donation with `id`.
    pub fn proof_for(&self, id: u64) -> Result<MerkleProof, MerkleError> {
        let index = self.index_of(id).ok_or(MerkleError::NotFound { id })?;
        debug!(id, index, "resolved donation leaf");
        self.tree.get_proof(index)
    }

    /// Leaf digest a donation has, or would have, in any tree.
    pub fn donation_hash(donation: &Donation) -> Digest {
        convert_digest::<H>(&H::hash(&donation.to_leaf_bytes()))
    }
}

impl<H: MerkleHasher> Clone for DonationMerkleTree<H> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            donations: self.donations.clone(),
            positions: self.positions.clone(),
        }
    }
}

impl<H: MerkleHasher> fmt::Debug for DonationMerkleTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DonationMerkleTree")
            .field("tree", &self.tree)
            .field("donations", &self.donations.len())
            .finish()
    }
}
