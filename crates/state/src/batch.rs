// Path: crates/state/src/batch.rs
//! Parallel bulk construction: turns a large, already-sorted batch of
//! `(stem, values)` entries into a tree in `O(log n)` parallel depth instead
//! of `O(n)` sequential inserts, by amortizing the scalar-field mapping
//! across the whole batch and building the first two levels of partitions
//! concurrently before merging them into the root.

use crate::commitment::{
    build_internal_commitment, half_polynomial_for_stem, leaf_commitment_from_half_scalars,
};
use crate::config::StateEpoch;
use crate::node::{InternalNode, LeafNode, VerkleNode};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use verkle_api::commitment::CommitmentBackend;
use verkle_types::error::VerkleError;
use verkle_types::key::{Key, Stem};

/// Groups raw `(key, value)` entries by stem, the shape `BatchNewLeafNode`
/// consumes.
pub fn group_entries_by_stem(entries: &[(Key, Vec<u8>)]) -> Vec<(Stem, BTreeMap<u8, Vec<u8>>)> {
    let mut by_stem: BTreeMap<Stem, BTreeMap<u8, Vec<u8>>> = BTreeMap::new();
    for (key, value) in entries {
        by_stem
            .entry(Stem::from_key(key))
            .or_default()
            .insert(Stem::suffix_of(key), value.clone());
    }
    by_stem.into_iter().collect()
}

/// `BatchNewLeafNode`: builds every leaf's `(c1, c2)` in parallel, then maps
/// all of them to scalars in one batched call before deriving each leaf's
/// top-level commitment, rather than mapping `ScalarOf` once per leaf.
/// Returns leaves sorted by stem, ready for [`batch_insert_ordered_leaves`].
pub fn batch_new_leaf_nodes<B: CommitmentBackend>(
    backend: &B,
    entries: Vec<(Stem, BTreeMap<u8, Vec<u8>>)>,
    epoch: StateEpoch,
) -> Result<Vec<LeafNode<B>>, VerkleError> {
    for values in entries.iter().map(|(_, values)| values) {
        for value in values.values() {
            if value.len() > verkle_types::MAX_VALUE_BYTES {
                return Err(VerkleError::ValueTooLarge {
                    len: value.len(),
                    max: verkle_types::MAX_VALUE_BYTES,
                });
            }
        }
    }
    let halves: Vec<(B::Point, B::Point)> = entries
        .par_iter()
        .map(|(_, values)| {
            let c1_poly = half_polynomial_for_stem(backend, values, false)?;
            let c2_poly = half_polynomial_for_stem(backend, values, true)?;
            Ok::<_, VerkleError>((backend.commit(&c1_poly)?, backend.commit(&c2_poly)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut points = Vec::with_capacity(halves.len() * 2);
    for (c1, c2) in &halves {
        points.push(c1.clone());
        points.push(c2.clone());
    }
    let scalars = backend.multi_map_to_scalar_field(&points);
    let mut scalar_pairs = scalars.chunks(2);

    let mut leaves = Vec::with_capacity(entries.len());
    for ((stem, values), (c1, c2)) in entries.into_iter().zip(halves.into_iter()) {
        let pair = scalar_pairs
            .next()
            .ok_or_else(|| VerkleError::InvalidNodeEncoding("scalar batch shorter than leaves".into()))?;
        let c1_scalar = pair
            .first()
            .cloned()
            .ok_or_else(|| VerkleError::InvalidNodeEncoding("missing c1 scalar".into()))?;
        let c2_scalar = pair
            .get(1)
            .cloned()
            .ok_or_else(|| VerkleError::InvalidNodeEncoding("missing c2 scalar".into()))?;
        let commitment = leaf_commitment_from_half_scalars(backend, &stem, c1_scalar, c2_scalar)?;
        leaves.push(LeafNode {
            stem,
            depth: 0, // overwritten once the leaf's final position is known
            epoch,
            values,
            c1,
            c2,
            commitment,
        });
    }
    leaves.sort_by_key(|leaf| leaf.stem);
    Ok(leaves)
}

fn build_subtree<B: CommitmentBackend>(
    backend: &B,
    leaves: &[LeafNode<B>],
    depth: u8,
) -> Result<Arc<VerkleNode<B>>, VerkleError> {
    match leaves {
        [] => Ok(Arc::new(VerkleNode::Empty)),
        [only] => {
            let mut leaf = only.clone();
            leaf.depth = depth;
            Ok(Arc::new(VerkleNode::Leaf(leaf)))
        }
        many => {
            let mut groups: BTreeMap<u8, Vec<LeafNode<B>>> = BTreeMap::new();
            for leaf in many {
                let idx = leaf
                    .stem
                    .as_ref()
                    .get(depth as usize)
                    .copied()
                    .unwrap_or(0);
                groups.entry(idx).or_default().push(leaf.clone());
            }
            let children: BTreeMap<u8, Arc<VerkleNode<B>>> = groups
                .into_iter()
                .map(|(idx, group)| {
                    let subtree = build_subtree(backend, &group, depth + 1)?;
                    Ok::<_, VerkleError>((idx, subtree))
                })
                .collect::<Result<_, _>>()?;
            let commitment = build_internal_commitment(backend, &children)?;
            Ok(Arc::new(VerkleNode::Internal(InternalNode { depth, children, commitment })))
        }
    }
}

/// `BuildFirstTwoLayers`: partitions `leaves` (already sorted by stem) by
/// their first stem byte and builds each partition's subtree — itself
/// partitioned one level further by the second stem byte — concurrently.
fn build_first_two_layers<B: CommitmentBackend>(
    backend: &B,
    leaves: &[LeafNode<B>],
) -> Result<Vec<(u8, Arc<VerkleNode<B>>)>, VerkleError> {
    let mut groups: BTreeMap<u8, Vec<LeafNode<B>>> = BTreeMap::new();
    for leaf in leaves {
        let idx = leaf.stem.as_ref().first().copied().unwrap_or(0);
        groups.entry(idx).or_default().push(leaf.clone());
    }
    groups
        .into_par_iter()
        .map(|(idx, group)| {
            let subtree = build_subtree(backend, &group, 1)?;
            Ok::<_, VerkleError>((idx, subtree))
        })
        .collect()
}

/// `MergeLevelTwoPartitions`: folds the per-partition subtrees from
/// [`build_first_two_layers`] into the root internal node's children map and
/// commits it with a single batched `MultiMapToScalarField` call (inside
/// [`build_internal_commitment`]).
fn merge_level_two_partitions<B: CommitmentBackend>(
    backend: &B,
    partitions: Vec<(u8, Arc<VerkleNode<B>>)>,
) -> Result<Arc<VerkleNode<B>>, VerkleError> {
    if partitions.is_empty() {
        return Ok(Arc::new(VerkleNode::Empty));
    }
    let children: BTreeMap<u8, Arc<VerkleNode<B>>> = partitions.into_iter().collect();
    let commitment = build_internal_commitment(backend, &children)?;
    Ok(Arc::new(VerkleNode::Internal(InternalNode { depth: 0, children, commitment })))
}

/// `BatchInsertOrderedLeaves`: assembles a full tree from pre-built,
/// stem-sorted leaves via `BuildFirstTwoLayers` + `MergeLevelTwoPartitions`.
/// Produces the same root commitment as inserting the same leaves
/// sequentially through [`crate::tree::VerkleTree::insert`].
pub fn batch_insert_ordered_leaves<B: CommitmentBackend>(
    backend: &B,
    leaves: Vec<LeafNode<B>>,
) -> Result<Arc<VerkleNode<B>>, VerkleError> {
    if leaves.is_empty() {
        return Ok(Arc::new(VerkleNode::Empty));
    }
    if leaves.len() == 1 {
        return build_subtree(backend, &leaves, 0);
    }
    let partitions = build_first_two_layers(backend, &leaves)?;
    merge_level_two_partitions(backend, partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NODE_WIDTH;
    use crate::tree::VerkleTree;
    use verkle_crypto::bls_commitment::Bls12DegreeCommitment;

    fn backend() -> Bls12DegreeCommitment {
        Bls12DegreeCommitment::new_for_testing(17, NODE_WIDTH)
    }

    fn key(stem_byte: u8, suffix: u8) -> Key {
        let mut k = [0u8; 32];
        k[..31].fill(stem_byte);
        k[31] = suffix;
        k
    }

    #[test]
    fn batch_build_matches_sequential_insert() {
        let backend = backend();
        let entries = vec![
            (key(1, 0), vec![1u8; 32]),
            (key(2, 5), vec![2u8; 32]),
            (key(1, 200), vec![3u8; 32]),
            (key(250, 1), vec![4u8; 32]),
        ];

        let grouped = group_entries_by_stem(&entries);
        let leaves = batch_new_leaf_nodes(&backend, grouped, StateEpoch::ZERO).expect("batch leaves");
        let batch_root = batch_insert_ordered_leaves(&backend, leaves).expect("batch build");
        let batch_commitment = batch_root.commitment_with(&backend);

        let mut sequential = VerkleTree::new(Arc::new(backend.clone()), crate::config::VerkleTreeConfig::default());
        for (k, v) in &entries {
            sequential.insert(k, v.clone(), None).expect("insert");
        }

        assert_eq!(batch_commitment, sequential.commitment());
    }

    #[test]
    fn batch_build_of_a_single_leaf_matches_a_single_insert() {
        let backend = backend();
        let entries = vec![(key(9, 0), vec![9u8; 32])];
        let grouped = group_entries_by_stem(&entries);
        let leaves = batch_new_leaf_nodes(&backend, grouped, StateEpoch::ZERO).expect("batch leaves");
        let batch_root = batch_insert_ordered_leaves(&backend, leaves).expect("batch build");

        let mut sequential = VerkleTree::new(Arc::new(backend.clone()), crate::config::VerkleTreeConfig::default());
        sequential.insert(&entries[0].0, entries[0].1.clone(), None).expect("insert");

        assert_eq!(batch_root.commitment_with(&backend), sequential.commitment());
    }
}
