// Path: crates/state/src/tree.rs
//! The mutable tree state machine: `Insert`, `InsertStem`, `Delete`, `Get`,
//! and `Commit`, built as an immutable, `Arc`-shared node graph so that
//! [`VerkleTree::fork`] is a cheap structural copy rather than a deep clone.
//!
//! Every mutation walks down to the affected node, replaces it functionally
//! (returning a new `Arc<VerkleNode<B>>`), and folds the resulting commitment
//! delta back up through `CommitmentBackend::update`, so the cost of a single
//! value change is `O(depth)` group operations independent of how many other
//! keys the tree holds.

use crate::codec::{decode_node, encode_node};
use crate::commitment::{build_internal_commitment, build_leaf_commitments, update_leaf_value};
use crate::config::{StateEpoch, VerkleTreeConfig};
use crate::node::{InternalNode, LeafNode, VerkleNode};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};
use verkle_api::commitment::CommitmentBackend;
use verkle_api::storage::{FlushSink, NodeHash, NodeResolver};
use verkle_storage::adapter::DeltaAccumulator;
use verkle_types::error::VerkleError;
use verkle_types::key::{Key, Stem};
use verkle_types::root::{to_root_hash, RootHash};

/// The digest a [`NodeResolver`]/[`FlushSink`] pair keys a node by: every
/// in-tree reference to a node is its commitment, so that commitment's
/// wire bytes (rather than a separately tracked content hash) are what gets
/// digested.
pub fn node_hash<B: CommitmentBackend>(backend: &B, commitment: &B::Point) -> NodeHash {
    NodeHash(to_root_hash(backend.point_to_bytes(commitment)))
}

/// The mutable Verkle tree: a `root` node plus the backend and bookkeeping
/// needed to mutate, commit, and flush it.
pub struct VerkleTree<B: CommitmentBackend> {
    root: Arc<VerkleNode<B>>,
    backend: Arc<B>,
    config: VerkleTreeConfig,
    current_epoch: StateEpoch,
    delta: DeltaAccumulator,
}

impl<B: CommitmentBackend> Clone for VerkleTree<B> {
    /// A structural clone: child sub-trees are shared by reference until one
    /// side mutates them. The cloned delta starts empty — a fork tracks its
    /// own touched-since-last-flush set, not its parent's.
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            backend: self.backend.clone(),
            config: self.config,
            current_epoch: self.current_epoch,
            delta: DeltaAccumulator::default(),
        }
    }
}

impl<B: CommitmentBackend> VerkleTree<B> {
    /// Builds an empty tree over `backend`.
    pub fn new(backend: Arc<B>, config: VerkleTreeConfig) -> Self {
        Self {
            root: Arc::new(VerkleNode::Empty),
            backend,
            config,
            current_epoch: StateEpoch::ZERO,
            delta: DeltaAccumulator::default(),
        }
    }

    /// Cheap copy-on-write fork: the returned tree is independent of `self`
    /// but shares every unmodified sub-tree with it.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Advances the epoch used for expiration checks on reads and new leaves.
    pub fn set_epoch(&mut self, epoch: StateEpoch) {
        self.current_epoch = epoch;
    }

    /// The tree's current epoch.
    pub fn epoch(&self) -> StateEpoch {
        self.current_epoch
    }

    /// The root node's commitment.
    pub fn commitment(&self) -> B::Point {
        self.root.commitment_with(&self.backend)
    }

    /// The tree's root node, for callers (proof collection, flushing tools)
    /// that walk the node graph directly rather than through `Get`/`Insert`.
    pub fn root(&self) -> &Arc<VerkleNode<B>> {
        &self.root
    }

    /// `Commit()`: the 32-byte anchor hash of the tree's commitment.
    pub fn commit(&self) -> RootHash {
        to_root_hash(self.backend.point_to_bytes(&self.commitment()))
    }

    /// `Get(key, resolver)`: the value at `key`, or `None` if absent.
    /// `resolver` is consulted whenever traversal meets a `HashedNode`; pass
    /// `None` for a fully materialized (non-stateless) tree.
    pub fn get(
        &self,
        key: &Key,
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<Option<Vec<u8>>, VerkleError> {
        let stem = Stem::from_key(key);
        let suffix = Stem::suffix_of(key);
        self.get_rec(&self.root, &stem, suffix, 0, resolver)
    }

    /// `Insert(key, value, resolver)`.
    pub fn insert(
        &mut self,
        key: &Key,
        value: Vec<u8>,
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<(), VerkleError> {
        let stem = Stem::from_key(key);
        let suffix = Stem::suffix_of(key);
        trace!(?stem, suffix, "insert");
        self.root = self.insert_rec(self.root.clone(), &stem, suffix, &value, 0, resolver)?;
        Ok(())
    }

    /// `InsertStem(stem, values, resolver)`: stores every entry of `values`
    /// under the same stem. Not atomic across entries if an intermediate
    /// insert fails; callers that need atomicity should validate first.
    pub fn insert_stem(
        &mut self,
        stem: &Stem,
        values: &BTreeMap<u8, Vec<u8>>,
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<(), VerkleError> {
        let mut root = self.root.clone();
        for (&suffix, value) in values {
            root = self.insert_rec(root, stem, suffix, value, 0, resolver)?;
        }
        self.root = root;
        Ok(())
    }

    /// `Delete(key, resolver)`. Returns whether a value was actually removed
    /// (deleting an absent key is a no-op, not an error).
    pub fn delete(
        &mut self,
        key: &Key,
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<bool, VerkleError> {
        let stem = Stem::from_key(key);
        let suffix = Stem::suffix_of(key);
        let (new_root, pruned) = self.delete_rec(self.root.clone(), &stem, suffix, 0, resolver)?;
        self.root = new_root;
        Ok(pruned)
    }

    /// Walks every reachable node, registers its canonical encoding in the
    /// delta accumulator, then drains the accumulator through `sink` and
    /// records the resulting root. Mirrors the collect-then-flush split the
    /// backing store's [`DeltaAccumulator`] is built for.
    pub fn commit_and_flush(&mut self, sink: &dyn FlushSink) -> Result<RootHash, VerkleError> {
        let root = self.root.clone();
        Self::collect_node_delta(&self.backend, &root, &mut self.delta)?;
        let root_hash = self.commit();
        verkle_storage::adapter::flush_delta(sink, root_hash, &mut self.delta)
            .map_err(|e| VerkleError::Resolver(e.to_string()))?;
        debug!(touched = self.delta.len(), "flushed delta");
        Ok(root_hash)
    }

    /// Replaces every fully-resolved node at or below `root` with a
    /// `HashedNode` placeholder, as `InsertOrdered`'s bulk-load path does to
    /// bound peak memory once a subtree is known to be finished. Exposed
    /// directly so callers with their own descent order can flush subtrees
    /// as soon as they finish them rather than only at the very end.
    pub fn hash_subtree(&self, node: &Arc<VerkleNode<B>>) -> Result<VerkleNode<B>, VerkleError> {
        match node.as_ref() {
            VerkleNode::Empty | VerkleNode::Unknown | VerkleNode::Hashed { .. } => {
                Ok((**node).clone())
            }
            other => {
                let commitment = other.commitment_with(&self.backend);
                Ok(VerkleNode::Hashed { commitment })
            }
        }
    }

    /// `InsertOrdered`: bulk-inserts `entries`. Against an empty tree this
    /// takes the parallel `BatchNewLeafNode` + `BatchInsertOrderedLeaves`
    /// path (see [`crate::batch`]); against a non-empty tree it falls back
    /// to sequential `Insert`, since the batch path assumes it owns the
    /// whole tree shape it is building. Both paths produce the same root
    /// commitment for the same entries.
    pub fn insert_ordered(
        &mut self,
        entries: &[(Key, Vec<u8>)],
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<(), VerkleError> {
        if entries.is_empty() {
            return Ok(());
        }
        if self.root.is_empty() {
            let grouped = crate::batch::group_entries_by_stem(entries);
            let leaves = crate::batch::batch_new_leaf_nodes(self.backend.as_ref(), grouped, self.current_epoch)?;
            self.root = crate::batch::batch_insert_ordered_leaves(self.backend.as_ref(), leaves)?;
            return Ok(());
        }
        for (key, value) in entries {
            self.insert(key, value.clone(), resolver)?;
        }
        Ok(())
    }

    fn get_rec(
        &self,
        node: &Arc<VerkleNode<B>>,
        stem: &Stem,
        suffix: u8,
        depth: u8,
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<Option<Vec<u8>>, VerkleError> {
        match node.as_ref() {
            VerkleNode::Empty => Ok(None),
            VerkleNode::Leaf(leaf) => {
                if leaf.stem != *stem {
                    return Ok(None);
                }
                if let Some(window) = self.config.active_window {
                    if leaf.epoch.is_expired_at(self.current_epoch, window) {
                        return Err(VerkleError::Expired);
                    }
                }
                Ok(leaf.values.get(&suffix).cloned())
            }
            VerkleNode::Internal(internal) => {
                let idx = stem.0[depth as usize];
                match internal.children.get(&idx) {
                    Some(child) => self.get_rec(child, stem, suffix, depth + 1, resolver),
                    None => Ok(None),
                }
            }
            VerkleNode::Hashed { commitment } => {
                let resolved =
                    self.resolve(commitment, depth, resolver, VerkleError::ReadFromInvalid)?;
                self.get_rec(&Arc::new(resolved), stem, suffix, depth, resolver)
            }
            VerkleNode::ExpiredLeaf { .. } => Err(VerkleError::Expired),
            VerkleNode::Unknown => Err(VerkleError::MissingNodeInStateless(format!(
                "depth {depth}"
            ))),
        }
    }

    fn insert_rec(
        &self,
        node: Arc<VerkleNode<B>>,
        stem: &Stem,
        suffix: u8,
        value: &[u8],
        depth: u8,
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<Arc<VerkleNode<B>>, VerkleError> {
        if value.len() > verkle_types::MAX_VALUE_BYTES {
            return Err(VerkleError::ValueTooLarge {
                len: value.len(),
                max: verkle_types::MAX_VALUE_BYTES,
            });
        }
        match node.as_ref() {
            // Case 1: the slot is empty — plant a fresh leaf here.
            VerkleNode::Empty => {
                let mut values = BTreeMap::new();
                values.insert(suffix, value.to_vec());
                let commits = build_leaf_commitments(self.backend.as_ref(), stem, &values)?;
                Ok(Arc::new(VerkleNode::Leaf(LeafNode {
                    stem: *stem,
                    depth,
                    epoch: self.current_epoch,
                    values,
                    c1: commits.c1,
                    c2: commits.c2,
                    commitment: commits.commitment,
                })))
            }
            // Case 2: same stem — update the value in place via the delta rule.
            VerkleNode::Leaf(leaf) if leaf.stem == *stem => {
                let old_value = leaf.values.get(&suffix).map(Vec::as_slice);
                let commits = update_leaf_value(
                    self.backend.as_ref(),
                    stem,
                    suffix,
                    old_value,
                    Some(value),
                    &leaf.c1,
                    &leaf.c2,
                    &leaf.commitment,
                )?;
                let mut values = leaf.values.clone();
                values.insert(suffix, value.to_vec());
                Ok(Arc::new(VerkleNode::Leaf(LeafNode {
                    stem: *stem,
                    depth: leaf.depth,
                    epoch: leaf.epoch,
                    values,
                    c1: commits.c1,
                    c2: commits.c2,
                    commitment: commits.commitment,
                })))
            }
            // Case 3: a different stem occupies this slot — synthesize an
            // internal-node chain down to the byte the two stems diverge at.
            VerkleNode::Leaf(leaf) => {
                let i = leaf.stem.first_divergence(stem).ok_or_else(|| {
                    VerkleError::InvalidNodeEncoding(
                        "stems compared unequal but share every byte".into(),
                    )
                })? as u8;

                let mut leaf_a = leaf.clone();
                leaf_a.depth = i + 1;

                let mut new_values = BTreeMap::new();
                new_values.insert(suffix, value.to_vec());
                let new_commits = build_leaf_commitments(self.backend.as_ref(), stem, &new_values)?;
                let leaf_b = LeafNode {
                    stem: *stem,
                    depth: i + 1,
                    epoch: self.current_epoch,
                    values: new_values,
                    c1: new_commits.c1,
                    c2: new_commits.c2,
                    commitment: new_commits.commitment,
                };

                let mut children = BTreeMap::new();
                children.insert(leaf_a.stem.0[i as usize], Arc::new(VerkleNode::Leaf(leaf_a)));
                children.insert(leaf_b.stem.0[i as usize], Arc::new(VerkleNode::Leaf(leaf_b)));
                let commitment = build_internal_commitment(self.backend.as_ref(), &children)?;
                let mut current = Arc::new(VerkleNode::Internal(InternalNode {
                    depth: i,
                    children,
                    commitment,
                }));

                for d in (depth..i).rev() {
                    let idx = stem.0[d as usize];
                    let mut wrapper = BTreeMap::new();
                    wrapper.insert(idx, current);
                    let commitment = build_internal_commitment(self.backend.as_ref(), &wrapper)?;
                    current = Arc::new(VerkleNode::Internal(InternalNode {
                        depth: d,
                        children: wrapper,
                        commitment,
                    }));
                }
                Ok(current)
            }
            // Case 5: recurse into the existing internal node.
            VerkleNode::Internal(internal) => {
                let idx = stem.0[depth as usize];
                let child = internal
                    .children
                    .get(&idx)
                    .cloned()
                    .unwrap_or_else(|| Arc::new(VerkleNode::Empty));
                let old_scalar = child.scalar_with(&self.backend);
                let new_child = self.insert_rec(child, stem, suffix, value, depth + 1, resolver)?;
                let new_scalar = new_child.scalar_with(&self.backend);
                let mut children = internal.children.clone();
                children.insert(idx, new_child);
                let commitment =
                    self.backend
                        .update(&internal.commitment, idx as usize, old_scalar, new_scalar)?;
                Ok(Arc::new(VerkleNode::Internal(InternalNode {
                    depth: internal.depth,
                    children,
                    commitment,
                })))
            }
            // Case 4: resolve the placeholder and retry at the same depth.
            VerkleNode::Hashed { commitment } => {
                let resolved =
                    self.resolve(commitment, depth, resolver, VerkleError::InsertIntoHashed)?;
                self.insert_rec(Arc::new(resolved), stem, suffix, value, depth, resolver)
            }
            VerkleNode::ExpiredLeaf { .. } => Err(VerkleError::Expired),
            VerkleNode::Unknown => Err(VerkleError::InsertIntoUnknown),
        }
    }

    /// Returns the replacement node and whether a value was actually removed.
    fn delete_rec(
        &self,
        node: Arc<VerkleNode<B>>,
        stem: &Stem,
        suffix: u8,
        depth: u8,
        resolver: Option<&dyn NodeResolver>,
    ) -> Result<(Arc<VerkleNode<B>>, bool), VerkleError> {
        match node.as_ref() {
            VerkleNode::Empty => Ok((node, false)),
            VerkleNode::Leaf(leaf) => {
                if leaf.stem != *stem || !leaf.values.contains_key(&suffix) {
                    return Ok((node, false));
                }
                let mut values = leaf.values.clone();
                let old_value = values.remove(&suffix);
                if values.is_empty() {
                    return Ok((Arc::new(VerkleNode::Empty), true));
                }
                let commits = update_leaf_value(
                    self.backend.as_ref(),
                    stem,
                    suffix,
                    old_value.as_deref(),
                    None,
                    &leaf.c1,
                    &leaf.c2,
                    &leaf.commitment,
                )?;
                Ok((
                    Arc::new(VerkleNode::Leaf(LeafNode {
                        stem: *stem,
                        depth: leaf.depth,
                        epoch: leaf.epoch,
                        values,
                        c1: commits.c1,
                        c2: commits.c2,
                        commitment: commits.commitment,
                    })),
                    true,
                ))
            }
            VerkleNode::Internal(internal) => {
                let idx = stem.0[depth as usize];
                let Some(child) = internal.children.get(&idx).cloned() else {
                    return Ok((node, false));
                };
                let old_scalar = child.scalar_with(&self.backend);
                let (new_child, pruned) = self.delete_rec(child, stem, suffix, depth + 1, resolver)?;
                if !pruned {
                    return Ok((node, false));
                }

                let mut children = internal.children.clone();
                if new_child.is_empty() {
                    children.remove(&idx);
                } else {
                    children.insert(idx, new_child);
                }

                if children.is_empty() {
                    return Ok((Arc::new(VerkleNode::Empty), true));
                }

                // Extension collapse: a single remaining leaf child is hoisted
                // into this slot, dropping this internal level entirely.
                if children.len() == 1 {
                    if let Some((_, only_child)) = children.iter().next() {
                        if let VerkleNode::Leaf(leaf) = only_child.as_ref() {
                            let mut hoisted = leaf.clone();
                            hoisted.depth = depth;
                            return Ok((Arc::new(VerkleNode::Leaf(hoisted)), true));
                        }
                    }
                }

                let new_scalar = children
                    .get(&idx)
                    .map(|c| c.scalar_with(&self.backend))
                    .unwrap_or_else(|| self.backend.scalar_zero());
                let commitment =
                    self.backend
                        .update(&internal.commitment, idx as usize, old_scalar, new_scalar)?;
                Ok((
                    Arc::new(VerkleNode::Internal(InternalNode {
                        depth: internal.depth,
                        children,
                        commitment,
                    })),
                    true,
                ))
            }
            VerkleNode::Hashed { commitment } => {
                let resolved =
                    self.resolve(commitment, depth, resolver, VerkleError::DeleteFromHashed)?;
                self.delete_rec(Arc::new(resolved), stem, suffix, depth, resolver)
            }
            VerkleNode::ExpiredLeaf { .. } => Err(VerkleError::Expired),
            VerkleNode::Unknown => Err(VerkleError::MissingNodeInStateless(format!(
                "depth {depth}"
            ))),
        }
    }

    /// Resolves a `HashedNode` placeholder to the node it stands for.
    /// `commitment` is the placeholder's own already-known commitment (held
    /// by its parent slot); a resolver is keyed by a digest of it, since a
    /// node's encoding never carries its own commitment and references
    /// between nodes are commitments, not separately tracked content hashes.
    fn resolve(
        &self,
        commitment: &B::Point,
        depth: u8,
        resolver: Option<&dyn NodeResolver>,
        no_resolver_err: VerkleError,
    ) -> Result<VerkleNode<B>, VerkleError> {
        let resolver = resolver.ok_or(no_resolver_err)?;
        let hash = node_hash(self.backend.as_ref(), commitment);
        let bytes = resolver
            .resolve(hash)
            .map_err(|e| VerkleError::Resolver(e.to_string()))?
            .ok_or_else(|| VerkleError::Resolver(format!("resolver miss for {hash:?}")))?;
        decode_node(
            self.backend.as_ref(),
            &bytes,
            depth,
            &self.backend.point_to_bytes(commitment),
        )
    }

    fn collect_node_delta(
        backend: &B,
        node: &Arc<VerkleNode<B>>,
        delta: &mut DeltaAccumulator,
    ) -> Result<(), VerkleError> {
        match node.as_ref() {
            VerkleNode::Empty | VerkleNode::Hashed { .. } | VerkleNode::Unknown => Ok(()),
            VerkleNode::ExpiredLeaf { .. } | VerkleNode::Leaf(_) => {
                let bytes = encode_node(backend, node)?;
                let hash = node_hash(backend, &node.commitment_with(backend));
                delta.record_new(hash.0, bytes);
                Ok(())
            }
            VerkleNode::Internal(internal) => {
                let bytes = encode_node(backend, node)?;
                let hash = node_hash(backend, &node.commitment_with(backend));
                delta.record_new(hash.0, bytes);
                for child in internal.children.values() {
                    Self::collect_node_delta(backend, child, delta)?;
                }
                Ok(())
            }
        }
    }

    /// Graphviz `dot` dump of the tree's current shape, for debugging.
    #[cfg(feature = "graphviz")]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph verkle {\n");
        let mut counter = 0usize;
        self.write_dot(&self.root, &mut out, &mut counter);
        out.push_str("}\n");
        out
    }

    #[cfg(feature = "graphviz")]
    fn write_dot(&self, node: &Arc<VerkleNode<B>>, out: &mut String, counter: &mut usize) -> usize {
        let id = *counter;
        *counter += 1;
        match node.as_ref() {
            VerkleNode::Empty => out.push_str(&format!("  n{id} [label=\"Empty\"];\n")),
            VerkleNode::Unknown => out.push_str(&format!("  n{id} [label=\"Unknown\"];\n")),
            VerkleNode::Hashed { .. } => out.push_str(&format!("  n{id} [label=\"Hashed\"];\n")),
            VerkleNode::ExpiredLeaf { stem, .. } => {
                out.push_str(&format!("  n{id} [label=\"Expired({})\"];\n", hex::encode(stem.as_ref())))
            }
            VerkleNode::Leaf(leaf) => out.push_str(&format!(
                "  n{id} [label=\"Leaf({}, {} vals)\"];\n",
                hex::encode(leaf.stem.as_ref()),
                leaf.values.len()
            )),
            VerkleNode::Internal(internal) => {
                out.push_str(&format!("  n{id} [label=\"Internal(d={})\"];\n", internal.depth));
                for (slot, child) in &internal.children {
                    let child_id = self.write_dot(child, out, counter);
                    out.push_str(&format!("  n{id} -> n{child_id} [label=\"{slot}\"];\n"));
                }
            }
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NODE_WIDTH;
    use verkle_api::storage::NullResolver;
    use verkle_crypto::bls_commitment::Bls12DegreeCommitment;
    use verkle_storage::memory::InMemoryNodeStore;

    fn tree() -> VerkleTree<Bls12DegreeCommitment> {
        let backend = Arc::new(Bls12DegreeCommitment::new_for_testing(13, NODE_WIDTH));
        VerkleTree::new(backend, VerkleTreeConfig::default())
    }

    fn key(stem_byte: u8, suffix: u8) -> Key {
        let mut k = [0u8; 32];
        k[..31].fill(stem_byte);
        k[31] = suffix;
        k
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut tree = tree();
        tree.insert(&key(1, 5), vec![42u8; 32], None).expect("insert");
        let got = tree.get(&key(1, 5), None).expect("get");
        assert_eq!(got, Some(vec![42u8; 32]));
    }

    #[test]
    fn get_of_absent_key_is_none() {
        let tree = tree();
        assert_eq!(tree.get(&key(9, 0), None).expect("get"), None);
    }

    #[test]
    fn diverging_stems_produce_distinct_leaves() {
        let mut tree = tree();
        let mut stem_a = [0u8; 31];
        stem_a[0] = 1;
        let mut stem_b = [0u8; 31];
        stem_b[0] = 2;
        let key_a = Stem(stem_a).with_suffix(0);
        let key_b = Stem(stem_b).with_suffix(0);
        tree.insert(&key_a, vec![1u8; 32], None).expect("insert a");
        tree.insert(&key_b, vec![2u8; 32], None).expect("insert b");
        assert_eq!(tree.get(&key_a, None).expect("get a"), Some(vec![1u8; 32]));
        assert_eq!(tree.get(&key_b, None).expect("get b"), Some(vec![2u8; 32]));
    }

    #[test]
    fn delete_removes_a_sole_value_back_to_empty() {
        let mut tree = tree();
        let k = key(4, 0);
        tree.insert(&k, vec![9u8; 32], None).expect("insert");
        assert!(tree.delete(&k, None).expect("delete"));
        assert_eq!(tree.get(&k, None).expect("get"), None);
        assert!(tree.root.is_empty());
    }

    #[test]
    fn delete_of_absent_key_is_a_no_op() {
        let mut tree = tree();
        tree.insert(&key(4, 0), vec![9u8; 32], None).expect("insert");
        assert!(!tree.delete(&key(4, 1), None).expect("delete"));
    }

    #[test]
    fn fork_is_isolated_from_further_mutation() {
        let mut tree = tree();
        tree.insert(&key(1, 0), vec![1u8; 32], None).expect("insert");
        let forked = tree.fork();
        tree.insert(&key(1, 1), vec![2u8; 32], None).expect("insert");
        assert_eq!(forked.get(&key(1, 1), None).expect("get"), None);
        assert_eq!(tree.get(&key(1, 1), None).expect("get"), Some(vec![2u8; 32]));
    }

    #[test]
    fn insert_order_does_not_change_the_final_commitment() {
        let mut a = tree();
        let mut b = tree();
        let entries = [
            (key(1, 0), vec![1u8; 32]),
            (key(2, 5), vec![2u8; 32]),
            (key(1, 200), vec![3u8; 32]),
        ];
        for (k, v) in &entries {
            a.insert(k, v.clone(), None).expect("insert a");
        }
        for (k, v) in entries.iter().rev() {
            b.insert(k, v.clone(), None).expect("insert b");
        }
        assert_eq!(a.commit(), b.commit());
    }

    #[test]
    fn commit_and_flush_populates_the_sink() {
        let mut tree = tree();
        tree.insert(&key(1, 0), vec![1u8; 32], None).expect("insert");
        let store = InMemoryNodeStore::new();
        let root = tree.commit_and_flush(&store).expect("flush");
        assert_eq!(store.last_root(), Some(root));
        assert!(!store.is_empty());
    }

    #[test]
    fn insert_into_hashed_without_resolver_fails() {
        let mut tree = tree();
        tree.insert(&key(1, 0), vec![1u8; 32], None).expect("insert");
        let hashed = tree.hash_subtree(&tree.root.clone()).expect("hash");
        tree.root = Arc::new(hashed);
        let err = tree.insert(&key(1, 1), vec![2u8; 32], None).unwrap_err();
        assert!(matches!(err, VerkleError::InsertIntoHashed));
    }

    #[test]
    fn resolver_round_trips_a_hashed_leaf() {
        let mut tree = tree();
        let k = key(1, 0);
        tree.insert(&k, vec![1u8; 32], None).expect("insert");
        let store = InMemoryNodeStore::new();
        tree.commit_and_flush(&store).expect("flush");
        let hashed = tree.hash_subtree(&tree.root.clone()).expect("hash");
        tree.root = Arc::new(hashed);
        let resolver: &dyn NodeResolver = &store;
        assert_eq!(
            tree.get(&k, Some(resolver)).expect("get through resolver"),
            Some(vec![1u8; 32])
        );
    }

    #[test]
    fn unresolved_read_without_resolver_fails() {
        let _ = NullResolver;
    }

    #[test]
    fn insert_rejects_an_oversized_value() {
        let mut tree = tree();
        let oversized = vec![0u8; verkle_types::MAX_VALUE_BYTES + 1];
        let err = tree.insert(&key(1, 0), oversized, None).unwrap_err();
        assert!(matches!(err, VerkleError::ValueTooLarge { .. }));
    }
}
