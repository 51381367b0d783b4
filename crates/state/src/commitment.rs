// Path: crates/state/src/commitment.rs
//! The fixed polynomial layout every leaf and internal node commits to, and
//! the helpers that build and delta-update those polynomials through a
//! [`CommitmentBackend`].
//!
//! A leaf's 256-coefficient polynomial carries four metadata slots
//! (`[0]` leaf marker, `[1]` stem, `[2]` `ScalarOf(C1)`, `[3]` `ScalarOf(C2)`)
//! and is otherwise zero; `C1`/`C2` each commit to 128 values packed two
//! coefficients apiece. An internal node's polynomial holds `ScalarOf(child
//! commitment)` at each occupied slot and zero elsewhere.

use crate::config::{NODE_WIDTH, SUFFIX_HALF_WIDTH};
use std::collections::BTreeMap;
use verkle_api::commitment::CommitmentBackend;
use verkle_types::error::VerkleError;
use verkle_types::key::Stem;

const LEAF_MARKER_SLOT: usize = 0;
const STEM_SLOT: usize = 1;
const C1_SLOT: usize = 2;
const C2_SLOT: usize = 3;

/// Packs one stored value into its low/high coefficient pair.
///
/// The value is right-zero-padded to 32 bytes, split into two 16-byte
/// halves, and each half is embedded into the backend's scalar field via its
/// canonical byte encoding. The low half additionally carries a leaf-marker
/// bit (the top bit of its last byte) so an all-zero stored value is still
/// distinguishable from an absent suffix.
fn value_to_coeffs<B: CommitmentBackend>(
    backend: &B,
    value: Option<&[u8]>,
) -> Result<(B::Scalar, B::Scalar), VerkleError> {
    let Some(v) = value else {
        return Ok((backend.scalar_zero(), backend.scalar_zero()));
    };
    let mut padded = [0u8; 32];
    let n = v.len().min(32);
    padded[..n].copy_from_slice(&v[..n]);

    let mut low = [0u8; 32];
    low[..16].copy_from_slice(&padded[..16]);
    low[15] |= 0x80;
    let mut high = [0u8; 32];
    high[..16].copy_from_slice(&padded[16..32]);

    let low_scalar = backend.scalar_from_bytes(&low)?;
    let high_scalar = backend.scalar_from_bytes(&high)?;
    Ok((low_scalar, high_scalar))
}

/// Builds the 256-coefficient polynomial for one leaf half (`C1` covers
/// suffixes `0..128`, `C2` covers `128..256`) from a sparse suffix map.
fn half_polynomial<B: CommitmentBackend>(
    backend: &B,
    values: &BTreeMap<u8, Vec<u8>>,
    base_suffix: u8,
) -> Result<Vec<B::Scalar>, VerkleError> {
    let mut poly = vec![backend.scalar_zero(); NODE_WIDTH];
    for i in 0..SUFFIX_HALF_WIDTH {
        let suffix = base_suffix as usize + i;
        #[allow(clippy::cast_possible_truncation)]
        let stored = values.get(&(suffix as u8)).map(Vec::as_slice);
        let (low, high) = value_to_coeffs(backend, stored)?;
        poly[2 * i] = low;
        poly[2 * i + 1] = high;
    }
    Ok(poly)
}

/// The two leaf sub-commitments and the committed leaf polynomial, computed
/// from scratch. Used whenever a leaf is built fully (construction, or the
/// `[0..3]`-slot batch path); in-place mutation instead applies deltas via
/// [`update_leaf_value`].
pub fn build_leaf_commitments<B: CommitmentBackend>(
    backend: &B,
    stem: &Stem,
    values: &BTreeMap<u8, Vec<u8>>,
) -> Result<LeafCommitments<B>, VerkleError> {
    let c1_poly = half_polynomial(backend, values, 0)?;
    let c2_poly = half_polynomial(backend, values, SUFFIX_HALF_WIDTH as u8)?;
    let c1 = backend.commit(&c1_poly)?;
    let c2 = backend.commit(&c2_poly)?;
    let commitment = leaf_commitment_from_halves(backend, stem, &c1, &c2)?;
    Ok(LeafCommitments { c1, c2, commitment })
}

/// The committed `[C1, C2]` pair for a leaf, plus the leaf's own commitment.
pub struct LeafCommitments<B: CommitmentBackend> {
    /// Sub-commitment over suffixes `0..128`.
    pub c1: B::Point,
    /// Sub-commitment over suffixes `128..256`.
    pub c2: B::Point,
    /// The leaf's own commitment, over `[marker, stem, ScalarOf(c1), ScalarOf(c2)]`.
    pub commitment: B::Point,
}

/// Computes a leaf's top-level commitment from its already-committed halves.
pub fn leaf_commitment_from_halves<B: CommitmentBackend>(
    backend: &B,
    stem: &Stem,
    c1: &B::Point,
    c2: &B::Point,
) -> Result<B::Point, VerkleError> {
    let mut poly = vec![backend.scalar_zero(); NODE_WIDTH];
    poly[LEAF_MARKER_SLOT] = backend.scalar_from_index(1);
    poly[STEM_SLOT] = backend.scalar_from_value(stem.as_ref());
    poly[C1_SLOT] = backend.scalar_of(c1);
    poly[C2_SLOT] = backend.scalar_of(c2);
    backend.commit(&poly)
}

/// Applies a single stored-value change to a leaf's `(c1, c2, commitment)`
/// triple via the delta rule, without recomputing either half from scratch.
///
/// Returns the updated triple. `old_value`/`new_value` are the previous and
/// new bytes at `suffix` (`None` for "absent").
#[allow(clippy::too_many_arguments)]
pub fn update_leaf_value<B: CommitmentBackend>(
    backend: &B,
    _stem: &Stem,
    suffix: u8,
    old_value: Option<&[u8]>,
    new_value: Option<&[u8]>,
    c1: &B::Point,
    c2: &B::Point,
    leaf_commitment: &B::Point,
) -> Result<LeafCommitments<B>, VerkleError> {
    let (old_low, old_high) = value_to_coeffs(backend, old_value)?;
    let (new_low, new_high) = value_to_coeffs(backend, new_value)?;

    let in_c2 = suffix as usize >= SUFFIX_HALF_WIDTH;
    let local_index = suffix as usize % SUFFIX_HALF_WIDTH;
    let low_coeff_index = 2 * local_index;
    let high_coeff_index = 2 * local_index + 1;

    let old_half = if in_c2 { c2 } else { c1 };
    let stepped = backend.update(old_half, low_coeff_index, old_low, new_low)?;
    let updated_half = backend.update(&stepped, high_coeff_index, old_high, new_high)?;

    let old_half_scalar = backend.scalar_of(old_half);
    let new_half_scalar = backend.scalar_of(&updated_half);
    let leaf_slot = if in_c2 { C2_SLOT } else { C1_SLOT };
    let updated_leaf_commitment =
        backend.update(leaf_commitment, leaf_slot, old_half_scalar, new_half_scalar)?;

    let (c1, c2) = if in_c2 {
        (c1.clone(), updated_half)
    } else {
        (updated_half, c2.clone())
    };

    Ok(LeafCommitments {
        c1,
        c2,
        commitment: updated_leaf_commitment,
    })
}

/// Builds the 256-coefficient polynomial for an internal node from its
/// occupied child commitments, mapped to scalars via one batched call.
pub fn internal_polynomial<B: CommitmentBackend>(
    backend: &B,
    occupied: &[(u8, B::Point)],
) -> Vec<B::Scalar> {
    let mut poly = vec![backend.scalar_zero(); NODE_WIDTH];
    let points: Vec<B::Point> = occupied.iter().map(|(_, p)| p.clone()).collect();
    let scalars = backend.multi_map_to_scalar_field(&points);
    for ((index, _), scalar) in occupied.iter().zip(scalars.into_iter()) {
        poly[*index as usize] = scalar;
    }
    poly
}

/// The `[C1 or C2]` polynomial for a stem's sparse value map, exposed for the
/// proof collector (which needs the polynomial backing an opening, not just
/// the committed point).
pub fn half_polynomial_for_stem<B: CommitmentBackend>(
    backend: &B,
    values: &BTreeMap<u8, Vec<u8>>,
    in_c2: bool,
) -> Result<Vec<B::Scalar>, VerkleError> {
    let base = if in_c2 { SUFFIX_HALF_WIDTH as u8 } else { 0 };
    half_polynomial(backend, values, base)
}

/// The `(low, high)` coefficient pair a suffix's stored value occupies,
/// exposed for the proof collector's per-suffix openings.
pub fn coeffs_for_suffix<B: CommitmentBackend>(
    backend: &B,
    values: &BTreeMap<u8, Vec<u8>>,
    suffix: u8,
) -> Result<(B::Scalar, B::Scalar), VerkleError> {
    value_to_coeffs(backend, values.get(&suffix).map(Vec::as_slice))
}

/// Builds a leaf's top-level commitment from pre-mapped half scalars rather
/// than the halves themselves, so a caller that already ran one batched
/// `MultiMapToScalarField` over many leaves' halves never re-derives
/// `ScalarOf` per leaf.
pub fn leaf_commitment_from_half_scalars<B: CommitmentBackend>(
    backend: &B,
    stem: &Stem,
    c1_scalar: B::Scalar,
    c2_scalar: B::Scalar,
) -> Result<B::Point, VerkleError> {
    let mut poly = vec![backend.scalar_zero(); NODE_WIDTH];
    poly[LEAF_MARKER_SLOT] = backend.scalar_from_index(1);
    poly[STEM_SLOT] = backend.scalar_from_value(stem.as_ref());
    poly[C1_SLOT] = c1_scalar;
    poly[C2_SLOT] = c2_scalar;
    backend.commit(&poly)
}

/// Commits to an internal node's children map from scratch.
pub fn build_internal_commitment<B: CommitmentBackend>(
    backend: &B,
    children: &BTreeMap<u8, std::sync::Arc<crate::node::VerkleNode<B>>>,
) -> Result<B::Point, VerkleError> {
    let occupied: Vec<(u8, B::Point)> = children
        .iter()
        .map(|(&index, child)| (index, child.commitment_with(backend)))
        .collect();
    let poly = internal_polynomial(backend, &occupied);
    backend.commit(&poly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verkle_crypto::bls_commitment::Bls12DegreeCommitment;

    fn backend() -> Bls12DegreeCommitment {
        Bls12DegreeCommitment::new_for_testing(7, NODE_WIDTH)
    }

    #[test]
    fn leaf_commitment_with_no_values_is_deterministic() {
        let backend = backend();
        let stem = Stem([3u8; 31]);
        let values = BTreeMap::new();
        let a = build_leaf_commitments(&backend, &stem, &values).expect("commits");
        let b = build_leaf_commitments(&backend, &stem, &values).expect("commits");
        assert_eq!(a.commitment, b.commitment);
    }

    #[test]
    fn delta_update_matches_full_rebuild() {
        let backend = backend();
        let stem = Stem([9u8; 31]);
        let mut values = BTreeMap::new();
        values.insert(5u8, vec![1u8; 32]);
        let initial = build_leaf_commitments(&backend, &stem, &values).expect("commits");

        values.insert(5u8, vec![2u8; 32]);
        let rebuilt = build_leaf_commitments(&backend, &stem, &values).expect("commits");

        let delta = update_leaf_value(
            &backend,
            &stem,
            5,
            Some(&[1u8; 32]),
            Some(&[2u8; 32]),
            &initial.c1,
            &initial.c2,
            &initial.commitment,
        )
        .expect("delta update");

        assert_eq!(delta.commitment, rebuilt.commitment);
    }
}
