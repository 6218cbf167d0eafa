//! Proof generation and verification over the current donation snapshot.
//!
//! Every call rebuilds the charity's tree from the [`DonationSource`]; the
//! freshly built root is the trusted root a submitted proof is checked
//! against.  A proof generated before a new donation was confirmed therefore
//! still recomputes its own root but no longer matches the current one.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::MerkleConfig;
use crate::hash::{MerkleHasher, Sha256Hasher};
use crate::merkle::{verify_proof, Digest, MerkleError, MerkleProof, TreeInfo};

use super::record::Donation;
use super::tree::DonationMerkleTree;

/// Read access to the donation store.
pub trait DonationSource {
    fn donation(&self, id: u64) -> Option<Donation>;

    /// Confirmed donations of one charity, in any order.
    fn confirmed_for_charity(&self, charity_id: u64) -> Vec<Donation>;
}

/// [`DonationSource`] backed by an ordered map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDonations {
    donations: BTreeMap<u64, Donation>,
}

impl InMemoryDonations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `donation`, replacing any previous donation with the same id.
    pub fn insert(&mut self, donation: Donation) -> Option<Donation> {
        self.donations.insert(donation.id, donation)
    }

    pub fn len(&self) -> usize {
        self.donations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.donations.is_empty()
    }
}

impl FromIterator<Donation> for InMemoryDonations {
    fn from_iter<I: IntoIterator<Item = Donation>>(iter: I) -> Self {
        let mut store = Self::new();
        for donation in iter {
            store.insert(donation);
        }
        store
    }
}

impl DonationSource for InMemoryDonations {
    fn donation(&self, id: u64) -> Option<Donation> {
        self.donations.get(&id).cloned()
    }

    fn confirmed_for_charity(&self, charity_id: u64) -> Vec<Donation> {
        self.donations
            .values()
            .filter(|donation| donation.charity_id == charity_id && donation.confirmed)
            .cloned()
            .collect()
    }
}

impl<S: DonationSource + ?Sized> DonationSource for &S {
    fn donation(&self, id: u64) -> Option<Donation> {
        (**self).donation(id)
    }

    fn confirmed_for_charity(&self, charity_id: u64) -> Vec<Donation> {
        (**self).confirmed_for_charity(charity_id)
    }
}

/// Public fields of the donation a proof was generated for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationDetails {
    pub donor_address: String,
    /// Decimal string so amounts above 2^53 survive JSON consumers.
    pub amount: String,
    pub tx_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Donation> for DonationDetails {
    fn from(donation: &Donation) -> Self {
        Self {
            donor_address: donation.donor_address.clone(),
            amount: donation.amount.to_string(),
            tx_hash: donation.tx_hash.clone(),
            created_at: donation.created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResponse {
    pub donation_id: u64,
    pub charity_id: u64,
    pub merkle_proof: MerkleProof,
    pub tree_info: TreeInfo,
    pub donation_details: DonationDetails,
}

/// Proof submitted for verification.  A serialised [`ProofResponse`] is
/// accepted as is; extra fields are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub donation_id: u64,
    pub charity_id: u64,
    pub merkle_proof: MerkleProof,
}

impl From<ProofResponse> for VerifyRequest {
    fn from(response: ProofResponse) -> Self {
        Self {
            donation_id: response.donation_id,
            charity_id: response.charity_id,
            merkle_proof: response.merkle_proof,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub proof_valid: bool,
    pub root_matches: bool,
    /// The proof's leaf is the digest of the named donation.
    pub leaf_matches: bool,
    pub current_root: Digest,
    pub provided_root: Digest,
    pub tree_info: TreeInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleInfo {
    pub root_hash: Digest,
    pub total_donations: usize,
    pub tree_depth: usize,
    /// Timestamp of the earliest donation in the snapshot.
    pub created_at: DateTime<Utc>,
}

/// Inclusion proofs for the confirmed donations of each charity.
pub struct InclusionService<S, H: MerkleHasher = Sha256Hasher> {
    source: S,
    config: MerkleConfig,
    marker: PhantomData<H>,
}

impl<S: DonationSource, H: MerkleHasher> InclusionService<S, H> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: MerkleConfig::for_hasher::<H>(),
            marker: PhantomData,
        }
    }

    pub fn with_config(source: S, config: MerkleConfig) -> Result<Self, MerkleError> {
        config.ensure_hasher::<H>()?;
        Ok(Self {
            source,
            config,
            marker: PhantomData,
        })
    }

    pub fn config(&self) -> &MerkleConfig {
        &self.config
    }

    /// Confirmed donations of `charity_id` in canonical `(created_at, id)`
    /// order.
    pub fn snapshot(&self, charity_id: u64) -> Vec<Donation> {
        let mut donations = self.source.confirmed_for_charity(charity_id);
        donations.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        donations
    }

    /// Tree over the current snapshot of `charity_id`.
    pub fn charity_tree(&self, charity_id: u64) -> Result<DonationMerkleTree<H>, MerkleError> {
        DonationMerkleTree::with_config(self.snapshot(charity_id), &self.config)
    }

    fn confirmed_donation(&self, id: u64) -> Result<Donation, MerkleError> {
        self.source
            .donation(id)
            .filter(|donation| donation.confirmed)
            .ok_or(MerkleError::NotFound { id })
    }

    /// Inclusion proof for a confirmed donation.
    #[instrument(skip(self))]
    pub fn generate_proof(&self, donation_id: u64) -> Result<ProofResponse, MerkleError> {
        let donation = self.confirmed_donation(donation_id)?;

        let tree = self.charity_tree(donation.charity_id)?;
        let merkle_proof = tree.proof_for(donation_id)?;
        info!(
            charity_id = donation.charity_id,
            index = merkle_proof.index,
            root = %merkle_proof.root,
            "generated donation proof"
        );

        Ok(ProofResponse {
            donation_id,
            charity_id: donation.charity_id,
            merkle_proof,
            tree_info: tree.tree().info(self.config.info_preview),
            donation_details: DonationDetails::from(&donation),
        })
    }

    /// Checks a submitted proof against the charity's current root.
    ///
    /// The named donation must be a confirmed donation of the named charity
    /// ([`MerkleError::NotFound`] otherwise) and the proof's leaf must be that
    /// donation's digest.  Structurally malformed proofs are rejected with
    /// [`MerkleError::MalformedProof`]; every other outcome, including a stale
    /// root, is reported in the [`VerificationReport`].
    #[instrument(
        skip(self, request),
        fields(donation_id = request.donation_id, charity_id = request.charity_id)
    )]
    pub fn verify_inclusion(
        &self,
        request: &VerifyRequest,
    ) -> Result<VerificationReport, MerkleError> {
        let donation = self.confirmed_donation(request.donation_id)?;
        if donation.charity_id != request.charity_id {
            return Err(MerkleError::NotFound {
                id: request.donation_id,
            });
        }
        let leaf_matches =
            request.merkle_proof.leaf == DonationMerkleTree::<H>::donation_hash(&donation);

        let tree = self.charity_tree(request.charity_id)?;
        let trusted = tree.tree().trusted_root();
        let verification = verify_proof::<H>(&request.merkle_proof, &trusted)?;
        let verified = verification.verified() && leaf_matches;
        info!(verified, leaf_matches, "checked donation proof");

        Ok(VerificationReport {
            verified,
            proof_valid: verification.proof_valid,
            root_matches: verification.root_matches,
            leaf_matches,
            current_root: trusted.root,
            provided_root: request.merkle_proof.root.clone(),
            tree_info: tree.tree().info(self.config.info_preview),
        })
    }

    /// Current root and size of a charity's tree.
    #[instrument(skip(self))]
    pub fn merkle_info(&self, charity_id: u64) -> Result<MerkleInfo, MerkleError> {
        let tree = self.charity_tree(charity_id)?;
        let created_at = tree
            .donations()
            .first()
            .map(|donation| donation.created_at)
            .ok_or(MerkleError::EmptyInput)?;
        debug!(leaves = tree.len(), "summarised charity tree");

        Ok(MerkleInfo {
            root_hash: tree.root_hash(),
            total_donations: tree.len(),
            tree_depth: tree.depth(),
            created_at,
        })
    }
}

#[cfg(feature = "tokio")]
impl<S: DonationSource, H: MerkleHasher> InclusionService<S, H> {
    /// Builds the charity's tree on the blocking thread pool.
    ///
    /// The snapshot is read on the calling task; only hashing moves off it.
    #[instrument(skip(self))]
    pub async fn build_in_background(
        &self,
        charity_id: u64,
    ) -> Result<DonationMerkleTree<H>, MerkleError> {
        let snapshot = self.snapshot(charity_id);
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || DonationMerkleTree::with_config(snapshot, &config))
            .await
            .map_err(|err| MerkleError::BackgroundTask {
                reason: err.to_string(),
            })?
    }
}
