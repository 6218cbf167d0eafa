use donation_merkle::merkle::expected_depth;
use donation_merkle::{
    decode_proof, encode_proof, verify, verify_proof, Blake2sHasher, Blake3Hasher, MerkleHasher,
    MerkleTree, Sha256Hasher,
};
use proptest::prelude::*;

fn records(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            let mut bytes = (i as u64).to_le_bytes().to_vec();
            bytes.extend_from_slice(b"donation");
            bytes
        })
        .collect()
}

fn roundtrip_all<H: MerkleHasher>(count: usize) {
    let tree = MerkleTree::<H>::build(records(count)).unwrap();
    let trusted = tree.trusted_root();
    assert_eq!(tree.depth(), expected_depth(count));
    for index in 0..count {
        let proof = tree.get_proof(index).unwrap();
        assert_eq!(proof.proof.len(), tree.depth() - 1);
        assert!(verify::<H>(&proof, &trusted).unwrap(), "{count} leaves, index {index}");
    }
}

#[test]
fn roundtrip_every_backend() {
    for count in [1, 2, 3, 4, 7, 16, 17] {
        roundtrip_all::<Sha256Hasher>(count);
        roundtrip_all::<Blake2sHasher>(count);
        roundtrip_all::<Blake3Hasher>(count);
    }
}

#[test]
fn json_roundtrip_preserves_verification() {
    let tree = MerkleTree::<Sha256Hasher>::build(records(9)).unwrap();
    let proof = tree.get_proof(8).unwrap();
    let json = serde_json::to_string(&proof).unwrap();
    let parsed = serde_json::from_str(&json).unwrap();
    assert_eq!(proof, parsed);
    assert!(verify::<Sha256Hasher>(&parsed, &tree.trusted_root()).unwrap());
}

proptest! {
    #[test]
    fn random_roundtrip(count in 1usize..80, seed in any::<u64>()) {
        let index = (seed % count as u64) as usize;
        let tree = MerkleTree::<Sha256Hasher>::build(records(count)).unwrap();
        let proof = tree.get_proof(index).unwrap();
        prop_assert!(verify::<Sha256Hasher>(&proof, &tree.trusted_root()).unwrap());

        let decoded = decode_proof(&encode_proof(&proof).unwrap()).unwrap();
        prop_assert_eq!(&decoded, &proof);
    }

    #[test]
    fn random_sibling_mutation_fails(count in 2usize..64, seed in any::<u64>(), bit in 0u8..8) {
        let index = (seed % count as u64) as usize;
        let tree = MerkleTree::<Sha256Hasher>::build(records(count)).unwrap();
        let mut proof = tree.get_proof(index).unwrap();
        let level = ((seed >> 32) as usize) % proof.proof.len();
        let byte = ((seed >> 16) as usize) % 32;
        proof.proof[level].as_bytes_mut()[byte] ^= 1 << bit;

        let outcome = verify_proof::<Sha256Hasher>(&proof, &tree.trusted_root()).unwrap();
        prop_assert!(!outcome.proof_valid);
        prop_assert!(!outcome.verified());
    }

    #[test]
    fn random_leaf_mutation_fails(count in 1usize..64, seed in any::<u64>(), bit in 0u8..8) {
        let index = (seed % count as u64) as usize;
        let tree = MerkleTree::<Blake3Hasher>::build(records(count)).unwrap();
        let mut proof = tree.get_proof(index).unwrap();
        proof.leaf.as_bytes_mut()[((seed >> 8) as usize) % 32] ^= 1 << bit;
        prop_assert!(!verify::<Blake3Hasher>(&proof, &tree.trusted_root()).unwrap());
    }
}
