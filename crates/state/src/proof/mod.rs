// Path: crates/state/src/proof/mod.rs
//! Proof path collection and the finalized wire `Proof`: walks a set of keys
//! down the tree once, gathering the `(commitment, index, value, polynomial)`
//! tuples the external multiproof primitive needs, deduplicated per
//! `(node, index)` pair so a polynomial shared by several queried keys is
//! committed to only once.

pub mod format;
pub mod reconstruct;

use crate::commitment::internal_polynomial;
use crate::node::VerkleNode;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use verkle_api::commitment::{CommitmentBackend, Opening};
use verkle_api::storage::NodeResolver;
use verkle_types::error::VerkleError;
use verkle_types::key::{Key, Stem, SUFFIX_HALF_WIDTH};

pub use format::{StateDiff, StemStateDiff, SuffixDiff, VerkleProof};
pub use reconstruct::{post_state_tree_from_proof, tree_from_proof};

const LEAF_MARKER_SLOT: u8 = 0;
const STEM_SLOT: u8 = 1;
const C1_SLOT: u8 = 2;
const C2_SLOT: u8 = 3;

/// Per-stem extension classification: whether the queried prefix resolved to
/// an empty slot, a different stem, or the stem itself, and the depth at
/// which that was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtStatus {
    /// The prefix slot is empty; the stem is absent.
    AbsentEmpty {
        /// Depth the extension was resolved at.
        depth: u8,
    },
    /// A different stem occupies the prefix; the stem is absent.
    AbsentOtherStem {
        /// Depth the extension was resolved at.
        depth: u8,
    },
    /// The stem is present.
    Present {
        /// Depth the extension was resolved at.
        depth: u8,
    },
}

impl ExtStatus {
    /// Packs this status into the low 3 bits (code) / high 5 bits (depth) byte.
    pub fn to_byte(self) -> u8 {
        let (code, depth) = match self {
            ExtStatus::AbsentEmpty { depth } => (0u8, depth),
            ExtStatus::AbsentOtherStem { depth } => (1u8, depth),
            ExtStatus::Present { depth } => (2u8, depth),
        };
        (depth << 3) | code
    }

    /// Unpacks a status byte.
    pub fn from_byte(byte: u8) -> Result<Self, VerkleError> {
        let depth = byte >> 3;
        match byte & 0b111 {
            0 => Ok(ExtStatus::AbsentEmpty { depth }),
            1 => Ok(ExtStatus::AbsentOtherStem { depth }),
            2 => Ok(ExtStatus::Present { depth }),
            other => Err(VerkleError::InvalidNodeEncoding(format!(
                "unknown ext-status code {other}"
            ))),
        }
    }
}

/// Everything the collector gathers while walking the tree for a batch of
/// keys, in the exact emission order the external multiproof primitive's
/// transcript discipline requires.
pub struct ProofElements<B: CommitmentBackend> {
    /// Commitments touched, one per surviving `(node, index)` pair.
    pub cis: Vec<B::Point>,
    /// Child-index (or polynomial slot) queried at each step.
    pub zis: Vec<u8>,
    /// Claimed opening values, aligned with `cis`/`zis`.
    pub yis: Vec<B::Scalar>,
    /// Full length-256 polynomials backing each commitment in `cis`.
    pub fis: Vec<Vec<B::Scalar>>,
    /// Path prefix -> commitment, for lexicographic `Cs` output.
    pub by_path: BTreeMap<Vec<u8>, B::Point>,
    /// Per-stem extension classification.
    pub ext_status: BTreeMap<Stem, ExtStatus>,
    /// Stems proving absence-by-different-stem, one per `AbsentOtherStem`.
    pub poa_stems: Vec<Stem>,
    values_by_key: BTreeMap<Key, Option<Vec<u8>>>,
    seen_openings: BTreeSet<(Vec<u8>, u8)>,
}

impl<B: CommitmentBackend> ProofElements<B> {
    fn new() -> Self {
        Self {
            cis: Vec::new(),
            zis: Vec::new(),
            yis: Vec::new(),
            fis: Vec::new(),
            by_path: BTreeMap::new(),
            ext_status: BTreeMap::new(),
            poa_stems: Vec::new(),
            values_by_key: BTreeMap::new(),
            seen_openings: BTreeSet::new(),
        }
    }

    fn push_opening(
        &mut self,
        node_key: Vec<u8>,
        commitment: &B::Point,
        z: u8,
        y: B::Scalar,
        f: Vec<B::Scalar>,
    ) {
        self.by_path.entry(node_key.clone()).or_insert_with(|| commitment.clone());
        if !self.seen_openings.insert((node_key, z)) {
            return;
        }
        self.cis.push(commitment.clone());
        self.zis.push(z);
        self.yis.push(y);
        self.fis.push(f);
    }

    /// `vals` for `keys`, in the order supplied to [`collect_proof_elements`].
    pub fn vals_for(&self, keys: &[Key]) -> Vec<Option<Vec<u8>>> {
        keys.iter().map(|k| self.values_by_key.get(k).cloned().flatten()).collect()
    }
}

fn resolve_hashed<B: CommitmentBackend>(
    backend: &B,
    commitment: &B::Point,
    depth: u8,
    resolver: Option<&dyn NodeResolver>,
) -> Result<VerkleNode<B>, VerkleError> {
    let resolver = resolver.ok_or(VerkleError::ReadFromInvalid)?;
    let hash = crate::tree::node_hash(backend, commitment);
    let bytes = resolver
        .resolve(hash)
        .map_err(|e| VerkleError::Resolver(e.to_string()))?
        .ok_or_else(|| VerkleError::Resolver(format!("resolver miss for {hash:?}")))?;
    crate::codec::decode_node(backend, &bytes, depth, &backend.point_to_bytes(commitment))
}

#[allow(clippy::too_many_arguments)]
fn collect_stem<B: CommitmentBackend>(
    backend: &B,
    node: &Arc<VerkleNode<B>>,
    stem: &Stem,
    suffixes: &[u8],
    depth: u8,
    path: &mut Vec<u8>,
    resolver: Option<&dyn NodeResolver>,
    out: &mut ProofElements<B>,
) -> Result<(), VerkleError> {
    match node.as_ref() {
        VerkleNode::Empty => {
            out.ext_status.insert(*stem, ExtStatus::AbsentEmpty { depth });
            for &suffix in suffixes {
                out.values_by_key.insert(stem.with_suffix(suffix), None);
            }
            Ok(())
        }
        VerkleNode::Leaf(leaf) if leaf.stem == *stem => {
            out.ext_status.insert(*stem, ExtStatus::Present { depth });
            let mut leaf_path = path.clone();
            leaf_path.push(0xFE);
            let top_poly = leaf_top_polynomial(backend, leaf);
            out.push_opening(
                leaf_path.clone(),
                &leaf.commitment,
                LEAF_MARKER_SLOT,
                backend.scalar_from_index(1),
                top_poly.clone(),
            );
            out.push_opening(
                leaf_path.clone(),
                &leaf.commitment,
                STEM_SLOT,
                backend.scalar_from_value(leaf.stem.as_ref()),
                top_poly.clone(),
            );

            for &suffix in suffixes {
                let in_c2 = suffix as usize >= SUFFIX_HALF_WIDTH;
                let half_slot = if in_c2 { C2_SLOT } else { C1_SLOT };
                let half_commitment = if in_c2 { &leaf.c2 } else { &leaf.c1 };
                out.push_opening(
                    leaf_path.clone(),
                    &leaf.commitment,
                    half_slot,
                    backend.scalar_of(half_commitment),
                    top_poly.clone(),
                );

                let value = leaf.values.get(&suffix).cloned();
                out.values_by_key.insert(stem.with_suffix(suffix), value.clone());

                let local_index = suffix as usize % SUFFIX_HALF_WIDTH;
                let (low, high) = crate::commitment::coeffs_for_suffix(backend, &leaf.values, suffix)?;
                let half_poly = crate::commitment::half_polynomial_for_stem(backend, &leaf.values, in_c2)?;
                let mut half_path = leaf_path.clone();
                half_path.push(half_slot);
                #[allow(clippy::cast_possible_truncation)]
                let low_index = (2 * local_index) as u8;
                #[allow(clippy::cast_possible_truncation)]
                let high_index = (2 * local_index + 1) as u8;
                out.push_opening(half_path.clone(), half_commitment, low_index, low, half_poly.clone());
                out.push_opening(half_path, half_commitment, high_index, high, half_poly);
            }
            Ok(())
        }
        VerkleNode::Leaf(leaf) => {
            out.ext_status.insert(*stem, ExtStatus::AbsentOtherStem { depth });
            out.poa_stems.push(leaf.stem);
            let mut leaf_path = path.clone();
            leaf_path.push(0xFE);
            out.by_path.entry(leaf_path).or_insert_with(|| leaf.commitment.clone());
            for &suffix in suffixes {
                out.values_by_key.insert(stem.with_suffix(suffix), None);
            }
            Ok(())
        }
        VerkleNode::Internal(internal) => {
            let idx = stem.0[depth as usize];
            let occupied: Vec<(u8, B::Point)> = internal
                .children
                .iter()
                .map(|(&i, c)| (i, c.commitment_with(backend)))
                .collect();
            let poly = internal_polynomial(backend, &occupied);
            let child = internal
                .children
                .get(&idx)
                .cloned()
                .unwrap_or_else(|| Arc::new(VerkleNode::Empty));
            let y = child.scalar_with(backend);
            out.push_opening(path.clone(), &internal.commitment, idx, y, poly);

            path.push(idx);
            let resolved = match child.as_ref() {
                VerkleNode::Hashed { commitment } => {
                    Arc::new(resolve_hashed(backend, commitment, depth + 1, resolver)?)
                }
                _ => child,
            };
            collect_stem(backend, &resolved, stem, suffixes, depth + 1, path, resolver, out)?;
            path.pop();
            Ok(())
        }
        VerkleNode::Hashed { commitment } => {
            let resolved = Arc::new(resolve_hashed(backend, commitment, depth, resolver)?);
            collect_stem(backend, &resolved, stem, suffixes, depth, path, resolver, out)
        }
        VerkleNode::ExpiredLeaf { .. } => Err(VerkleError::Expired),
        VerkleNode::Unknown => Err(VerkleError::MissingNodeInStateless(format!("depth {depth}"))),
    }
}

fn leaf_top_polynomial<B: CommitmentBackend>(backend: &B, leaf: &crate::node::LeafNode<B>) -> Vec<B::Scalar> {
    let mut poly = vec![backend.scalar_zero(); crate::config::NODE_WIDTH];
    poly[LEAF_MARKER_SLOT as usize] = backend.scalar_from_index(1);
    poly[STEM_SLOT as usize] = backend.scalar_from_value(leaf.stem.as_ref());
    poly[C1_SLOT as usize] = backend.scalar_of(&leaf.c1);
    poly[C2_SLOT as usize] = backend.scalar_of(&leaf.c2);
    poly
}

/// Walks `keys` (need not be pre-sorted; sorted internally) down `root`,
/// producing the deduplicated proof elements every key's opening needs.
pub fn collect_proof_elements<B: CommitmentBackend>(
    backend: &B,
    root: &Arc<VerkleNode<B>>,
    keys: &[Key],
    resolver: Option<&dyn NodeResolver>,
) -> Result<ProofElements<B>, VerkleError> {
    if keys.is_empty() {
        return Err(VerkleError::NoKeyProvided);
    }
    let mut by_stem: BTreeMap<Stem, Vec<u8>> = BTreeMap::new();
    for key in keys {
        by_stem
            .entry(Stem::from_key(key))
            .or_default()
            .push(Stem::suffix_of(key));
    }

    let mut out = ProofElements::new();
    for (stem, mut suffixes) in by_stem {
        suffixes.sort_unstable();
        suffixes.dedup();
        let mut path = Vec::new();
        collect_stem(backend, root, &stem, &suffixes, 0, &mut path, resolver, &mut out)?;
    }
    Ok(out)
}

/// A finalized, verifiable proof: the aggregated multiproof plus the
/// bookkeeping a verifier needs to reconstruct the queried paths.
#[derive(Clone)]
pub struct Proof<B: CommitmentBackend> {
    /// The opaque aggregated opening proof.
    pub multi_proof: B::MultiProof,
    /// Per-stem extension classification, ordered by stem.
    pub ext_status: BTreeMap<Stem, ExtStatus>,
    /// Commitments by path, excluding the root (it travels out-of-band).
    pub cs: Vec<(Vec<u8>, B::Point)>,
    /// Stems proving absence-by-different-stem.
    pub poa_stems: Vec<Stem>,
    /// The queried keys, in the order `pre_values`/`post_values` align to.
    pub keys: Vec<Key>,
    /// Values at `keys` under the pre-state root.
    pub pre_values: Vec<Option<Vec<u8>>>,
    /// Values at `keys` under the post-state root, if a post-state was proven.
    pub post_values: Option<Vec<Option<Vec<u8>>>>,
}

/// Builds a [`Proof`] for `keys` against `root`, re-deriving the witness for
/// every committed polynomial so the external multiproof primitive can open
/// them in one aggregated call.
pub fn create_proof<B: CommitmentBackend>(
    backend: &B,
    root: &Arc<VerkleNode<B>>,
    keys: &[Key],
    resolver: Option<&dyn NodeResolver>,
) -> Result<Proof<B>, VerkleError> {
    let mut sorted_keys = keys.to_vec();
    sorted_keys.sort();
    let elements = collect_proof_elements(backend, root, &sorted_keys, resolver)?;

    let mut witnesses = Vec::with_capacity(elements.fis.len());
    for poly in &elements.fis {
        let (_, witness) = backend.commit_with_witness(poly)?;
        witnesses.push(witness);
    }

    let openings = build_openings(backend, &elements);
    let multi_proof = backend.create_multi_proof(&elements.cis, &witnesses, &openings)?;
    let pre_values = elements.vals_for(&sorted_keys);
    let cs: Vec<(Vec<u8>, B::Point)> = elements
        .by_path
        .iter()
        .filter(|(path, _)| !path.is_empty())
        .map(|(path, point)| (path.clone(), point.clone()))
        .collect();

    Ok(Proof {
        multi_proof,
        ext_status: elements.ext_status,
        cs,
        poa_stems: elements.poa_stems,
        keys: sorted_keys,
        pre_values,
        post_values: None,
    })
}

/// Extends a pre-state-only [`Proof`] with post-state values, per spec's
/// pre/post-state proof support: `PostValues[i]` is populated only when it
/// differs from `PreValues[i]`.
pub fn with_post_state<B: CommitmentBackend>(
    backend: &B,
    mut proof: Proof<B>,
    post_root: &Arc<VerkleNode<B>>,
    resolver: Option<&dyn NodeResolver>,
) -> Result<Proof<B>, VerkleError> {
    let post_elements = collect_proof_elements(backend, post_root, &proof.keys, resolver)?;
    let post_vals = post_elements.vals_for(&proof.keys);
    let merged = post_vals
        .into_iter()
        .zip(proof.pre_values.iter())
        .map(|(post, pre)| if &post == pre { None } else { post })
        .collect();
    proof.post_values = Some(merged);
    Ok(proof)
}

fn build_openings<B: CommitmentBackend>(
    backend: &B,
    elements: &ProofElements<B>,
) -> Vec<Opening<B::Scalar>> {
    elements
        .zis
        .iter()
        .zip(elements.yis.iter())
        .enumerate()
        .map(|(i, (&z, &y))| Opening {
            commitment_index: i,
            z: backend.scalar_from_index(z),
            y,
        })
        .collect()
}

/// Verifies a [`Proof`] by re-walking `root` for the same keys and checking
/// that the resulting openings satisfy `proof.multi_proof`.
///
/// This re-derives `(Cis, Zis, Yis)` from `root` rather than from the
/// standalone [`reconstruct::tree_from_proof`] shape, since a verifier that
/// already holds `root` (the common case: a full node checking a stateless
/// peer's proof) gets the same openings either way and avoids reconstructing
/// a throwaway tree just to re-derive them. [`reconstruct::tree_from_proof`]
/// and [`reconstruct::post_state_tree_from_proof`] remain the entry points
/// for a caller that genuinely starts from nothing but the wire proof.
pub fn verify_proof<B: CommitmentBackend>(
    backend: &B,
    proof: &Proof<B>,
    root: &Arc<VerkleNode<B>>,
    resolver: Option<&dyn NodeResolver>,
) -> Result<bool, VerkleError> {
    let elements = collect_proof_elements(backend, root, &proof.keys, resolver)?;
    let openings = build_openings(backend, &elements);
    backend.check_multi_proof(&elements.cis, &openings, &proof.multi_proof)
}
