//! Donation records committed per charity.
//!
//! A charity's snapshot is its confirmed donations ordered by
//! `(created_at, id)`.  [`DonationMerkleTree`] commits to one snapshot and
//! [`InclusionService`] rebuilds it from a [`DonationSource`] to issue and check
//! inclusion proofs.

mod record;
mod service;
mod tree;

pub use record::Donation;
pub use service::{
    DonationDetails, DonationSource, InMemoryDonations, InclusionService, MerkleInfo,
    ProofResponse, VerificationReport, VerifyRequest,
};
pub use tree::DonationMerkleTree;
