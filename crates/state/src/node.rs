// Path: crates/state/src/node.rs
//! The polymorphic node tagged union and the two structured variants
//! (`LeafNode`, `InternalNode`) that carry real content. `Empty`,
//! `HashedNode`, `ExpiredLeaf`, and `UnknownNode` are opaque placeholders;
//! see the module docs on [`crate::tree`] for the operation table each
//! variant supports.

use crate::config::StateEpoch;
use std::collections::BTreeMap;
use std::sync::Arc;
use verkle_api::commitment::CommitmentBackend;
use verkle_types::key::Stem;

/// A leaf: a stem plus up to 256 sparse values, with cached sub-commitments.
pub struct LeafNode<B: CommitmentBackend> {
    /// The 31-byte stem this leaf addresses.
    pub stem: Stem,
    /// Depth at which this leaf sits (purely informational; lookups are
    /// driven by stem bytes, not this field).
    pub depth: u8,
    /// The epoch this leaf was (re)activated at, for expiration checks.
    pub epoch: StateEpoch,
    /// Sparse suffix -> value map; absent suffixes are simply not present.
    pub values: BTreeMap<u8, Vec<u8>>,
    /// Commitment over suffixes `0..128`.
    pub c1: B::Point,
    /// Commitment over suffixes `128..256`.
    pub c2: B::Point,
    /// This leaf's own commitment (over `[marker, stem, ScalarOf(c1), ScalarOf(c2)]`).
    pub commitment: B::Point,
}

/// An internal node: up to 256 children of mixed variants.
pub struct InternalNode<B: CommitmentBackend> {
    /// Depth of this node (0 for the root).
    pub depth: u8,
    /// Occupied child slots, indexed by the branching byte.
    pub children: BTreeMap<u8, Arc<VerkleNode<B>>>,
    /// This node's commitment over `ScalarOf(children[i].commitment)`.
    pub commitment: B::Point,
}

/// The six node variants spec-level contracts describe.
pub enum VerkleNode<B: CommitmentBackend> {
    /// No content; commitment is the group identity, scalar image is zero.
    Empty,
    /// Commitment-only placeholder; contents not loaded. Resolving replaces
    /// this variant with the node it stands for. A
    /// [`verkle_api::storage::NodeResolver`] is keyed by a digest of this
    /// commitment (see `crate::tree::node_hash`), so no separate content
    /// hash needs to be carried here.
    Hashed {
        /// The node's commitment, known without resolving its content.
        commitment: B::Point,
    },
    /// A populated leaf.
    Leaf(LeafNode<B>),
    /// A populated internal node.
    Internal(InternalNode<B>),
    /// A leaf whose active window has elapsed. Reads/writes fail with
    /// `Expired`; the commitment is preserved so ancestors still recompute
    /// correctly.
    ExpiredLeaf {
        /// The expired leaf's stem.
        stem: Stem,
        /// The expired leaf's preserved commitment.
        commitment: B::Point,
    },
    /// A placeholder for a sub-tree that was never proven to a stateless
    /// tree. Its commitment is the group identity; any operation against it
    /// either no-ops (`Get` returns `None`) or fails with
    /// `MissingNodeInStateless`.
    Unknown,
}

// `#[derive(Clone)]` on a type generic over `B` bounds `B: Clone`, but these
// types only ever hold `B::Point`/`Arc<VerkleNode<B>>`, never a `B` value
// itself. Implement `Clone` manually so `B` need not be `Clone`.

impl<B: CommitmentBackend> Clone for LeafNode<B> {
    fn clone(&self) -> Self {
        Self {
            stem: self.stem.clone(),
            depth: self.depth,
            epoch: self.epoch,
            values: self.values.clone(),
            c1: self.c1.clone(),
            c2: self.c2.clone(),
            commitment: self.commitment.clone(),
        }
    }
}

impl<B: CommitmentBackend> Clone for InternalNode<B> {
    fn clone(&self) -> Self {
        Self {
            depth: self.depth,
            children: self.children.clone(),
            commitment: self.commitment.clone(),
        }
    }
}

impl<B: CommitmentBackend> Clone for VerkleNode<B> {
    fn clone(&self) -> Self {
        match self {
            VerkleNode::Empty => VerkleNode::Empty,
            VerkleNode::Hashed { commitment } => VerkleNode::Hashed {
                commitment: commitment.clone(),
            },
            VerkleNode::Leaf(leaf) => VerkleNode::Leaf(leaf.clone()),
            VerkleNode::Internal(node) => VerkleNode::Internal(node.clone()),
            VerkleNode::ExpiredLeaf { stem, commitment } => VerkleNode::ExpiredLeaf {
                stem: stem.clone(),
                commitment: commitment.clone(),
            },
            VerkleNode::Unknown => VerkleNode::Unknown,
        }
    }
}

// `#[derive(Debug)]` on a type generic over `B` only bounds `B: Debug`, but
// every field here is the associated type `B::Point`, which the derive macro
// can't see through. Bound `B::Point: Debug` explicitly instead.

impl<B: CommitmentBackend> std::fmt::Debug for LeafNode<B>
where
    B::Point: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafNode")
            .field("stem", &self.stem)
            .field("depth", &self.depth)
            .field("epoch", &self.epoch)
            .field("values", &self.values)
            .field("c1", &self.c1)
            .field("c2", &self.c2)
            .field("commitment", &self.commitment)
            .finish()
    }
}

impl<B: CommitmentBackend> std::fmt::Debug for InternalNode<B>
where
    B::Point: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalNode")
            .field("depth", &self.depth)
            .field("children", &self.children)
            .field("commitment", &self.commitment)
            .finish()
    }
}

impl<B: CommitmentBackend> std::fmt::Debug for VerkleNode<B>
where
    B::Point: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerkleNode::Empty => f.write_str("Empty"),
            VerkleNode::Hashed { commitment } => {
                f.debug_struct("Hashed").field("commitment", commitment).finish()
            }
            VerkleNode::Leaf(leaf) => f.debug_tuple("Leaf").field(leaf).finish(),
            VerkleNode::Internal(node) => f.debug_tuple("Internal").field(node).finish(),
            VerkleNode::ExpiredLeaf { stem, commitment } => f
                .debug_struct("ExpiredLeaf")
                .field("stem", stem)
                .field("commitment", commitment)
                .finish(),
            VerkleNode::Unknown => f.write_str("Unknown"),
        }
    }
}

impl<B: CommitmentBackend> VerkleNode<B> {
    /// This node's commitment point, given the backend that owns identity.
    pub fn commitment_with(&self, backend: &B) -> B::Point {
        match self {
            VerkleNode::Empty | VerkleNode::Unknown => backend.identity(),
            VerkleNode::Hashed { commitment } | VerkleNode::ExpiredLeaf { commitment, .. } => {
                commitment.clone()
            }
            VerkleNode::Leaf(leaf) => leaf.commitment.clone(),
            VerkleNode::Internal(node) => node.commitment.clone(),
        }
    }

    /// This node's scalar image, as folded into a parent's polynomial.
    /// `Empty`/`Unknown` contribute the literal zero scalar (an unoccupied
    /// slot), not `ScalarOf(identity)`.
    pub fn scalar_with(&self, backend: &B) -> B::Scalar {
        match self {
            VerkleNode::Empty | VerkleNode::Unknown => backend.scalar_zero(),
            other => backend.scalar_of(&other.commitment_with(backend)),
        }
    }

    /// Whether this variant is `Empty`.
    pub fn is_empty(&self) -> bool {
        matches!(self, VerkleNode::Empty)
    }
}
