// Path: crates/state/src/proof/reconstruct.rs
//! `TreeFromProof`: rebuilds a stateless tree purely from a [`Proof`]'s state
//! diff, for a caller that starts with nothing but the wire proof (no local
//! root to re-walk, unlike [`super::verify_proof`]'s fast path).

use super::Proof;
use crate::config::VerkleTreeConfig;
use crate::tree::VerkleTree;
use std::collections::BTreeMap;
use std::sync::Arc;
use verkle_api::commitment::CommitmentBackend;
use verkle_types::error::VerkleError;
use verkle_types::key::Stem;

fn decode_stem(hex_stem: &str) -> Result<Stem, VerkleError> {
    let bytes = hex::decode(hex_stem)
        .map_err(|e| VerkleError::ProofDeserialization(format!("bad stem hex: {e}")))?;
    Ok(Stem::truncate_from(&bytes))
}

fn decode_value(hex_value: &str) -> Result<Vec<u8>, VerkleError> {
    hex::decode(hex_value).map_err(|e| VerkleError::ProofDeserialization(format!("bad value hex: {e}")))
}

/// Rebuilds the pre-state tree a [`Proof`] attests to: every opened stem gets
/// its proven values inserted; stems proven absent by a different occupying
/// stem get a placeholder leaf at suffix 0 so the divergence shape that made
/// the proof valid is preserved. Absent-empty stems contribute nothing.
pub fn tree_from_proof<B: CommitmentBackend>(
    backend: Arc<B>,
    proof: &Proof<B>,
    diff: &super::StateDiff,
) -> Result<VerkleTree<B>, VerkleError> {
    let mut tree = VerkleTree::new(backend, VerkleTreeConfig::default());

    for stem_diff in &diff.0 {
        let stem = decode_stem(&stem_diff.stem)?;
        let mut values = BTreeMap::new();
        for suffix_diff in &stem_diff.suffix_diffs {
            if let Some(hex_value) = &suffix_diff.current_value {
                values.insert(suffix_diff.suffix, decode_value(hex_value)?);
            }
        }
        if !values.is_empty() {
            tree.insert_stem(&stem, &values, None)?;
        }
    }

    for poa_stem in &proof.poa_stems {
        tree.insert_stem(poa_stem, &BTreeMap::from([(0u8, Vec::new())]), None)?;
    }

    Ok(tree)
}

/// Rebuilds the post-state tree a [`Proof`] with `post_values` attests to:
/// starts from [`tree_from_proof`]'s pre-state shape, then applies every
/// stem's `new_value` entries on top.
pub fn post_state_tree_from_proof<B: CommitmentBackend>(
    backend: Arc<B>,
    proof: &Proof<B>,
    diff: &super::StateDiff,
) -> Result<VerkleTree<B>, VerkleError> {
    let mut tree = tree_from_proof(backend, proof, diff)?;

    for stem_diff in &diff.0 {
        let stem = decode_stem(&stem_diff.stem)?;
        let mut new_values = BTreeMap::new();
        for suffix_diff in &stem_diff.suffix_diffs {
            if let Some(hex_value) = &suffix_diff.new_value {
                new_values.insert(suffix_diff.suffix, decode_value(hex_value)?);
            }
        }
        if !new_values.is_empty() {
            tree.insert_stem(&stem, &new_values, None)?;
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NODE_WIDTH;
    use crate::proof::{create_proof, format::diff_from_proof, with_post_state};
    use crate::tree::VerkleTree as Tree;
    use verkle_crypto::bls_commitment::Bls12DegreeCommitment;
    use verkle_types::key::Key;

    fn backend() -> Arc<Bls12DegreeCommitment> {
        Arc::new(Bls12DegreeCommitment::new_for_testing(21, NODE_WIDTH))
    }

    fn key(stem_byte: u8, suffix: u8) -> Key {
        let mut k = [0u8; 32];
        k[..31].fill(stem_byte);
        k[31] = suffix;
        k
    }

    #[test]
    fn reconstructed_tree_answers_the_proven_key() {
        let backend = backend();
        let mut tree = Tree::new(backend.clone(), VerkleTreeConfig::default());
        tree.insert(&key(1, 0), vec![7u8; 32], None).expect("insert");

        let proof = create_proof(&*backend, tree.root(), &[key(1, 0)], None).expect("create proof");
        let diff = diff_from_proof(&proof);
        let reconstructed = tree_from_proof(backend, &proof, &diff).expect("reconstruct");
        assert_eq!(
            reconstructed.get(&key(1, 0), None).expect("get"),
            Some(vec![7u8; 32])
        );
    }

    #[test]
    fn post_state_reconstruction_reflects_the_new_value() {
        let backend = backend();
        let mut tree = Tree::new(backend.clone(), VerkleTreeConfig::default());
        tree.insert(&key(2, 0), vec![1u8; 32], None).expect("insert");

        let proof = create_proof(&*backend, tree.root(), &[key(2, 0)], None).expect("create proof");
        tree.insert(&key(2, 0), vec![2u8; 32], None).expect("insert again");
        let proof = with_post_state(&*backend, proof, tree.root(), None).expect("post state");

        let diff = diff_from_proof(&proof);
        let reconstructed = post_state_tree_from_proof(backend, &proof, &diff).expect("reconstruct");
        assert_eq!(
            reconstructed.get(&key(2, 0), None).expect("get"),
            Some(vec![2u8; 32])
        );
    }
}
