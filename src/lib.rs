//! Merkle inclusion proofs for charity donations.
//!
//! A charity's confirmed donations, ordered by `(created_at, id)`, are
//! committed to a single root.  Donors receive an inclusion proof for their
//! donation and anyone holding the current root and donation count can check
//! it without seeing the other records.
//!
//! * [`merkle`] – the generic tree, proofs, verification and the binary proof
//!   codec.
//! * [`hash`] – the swappable [`MerkleHasher`] backends.
//! * [`donation`] – the donation record, its tree and the
//!   [`InclusionService`].
//! * [`config`] – construction settings.
//!
//! ```
//! use donation_merkle::{verify, MerkleTree, Sha256Hasher};
//!
//! let tree = MerkleTree::<Sha256Hasher>::build(["A", "B", "C"]).unwrap();
//! let proof = tree.get_proof(2).unwrap();
//! assert!(verify::<Sha256Hasher>(&proof, &tree.trusted_root()).unwrap());
//! ```

pub mod config;
pub mod donation;
pub mod hash;
pub mod merkle;
pub mod utils;

pub use config::MerkleConfig;
pub use donation::{
    Donation, DonationMerkleTree, DonationSource, InMemoryDonations, InclusionService,
    ProofResponse, VerificationReport, VerifyRequest,
};
pub use hash::{Blake2sHasher, Blake3Hasher, HashFamily, MerkleHasher, Sha256Hasher};
pub use merkle::{
    decode_proof, encode_proof, verify, verify_proof, Digest, LeafEncode, MerkleError,
    MerkleProof, MerkleTree, TreeInfo, TrustedRoot, Verification,
};
