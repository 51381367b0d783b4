// Path: crates/api/src/commitment/scheme.rs
//! Defines the `CommitmentBackend` trait: the pluggable vector-commitment
//! primitive the tree and proof engine are built against.
//!
//! The tree state machine and proof collector never touch curve or field
//! arithmetic directly — every `Commit`, `ScalarOf`/`MultiMapToScalarField`,
//! `CreateMultiProof`, and `CheckMultiProof` call is dispatched through this
//! trait, mirroring how the wider workspace isolates `CommitmentScheme`
//! implementations behind a narrow interface so the tree logic stays
//! independent of any one curve.

use std::fmt::Debug;
use verkle_types::error::VerkleError;

/// A single opening claim: "the polynomial committed to by `commitment_index`
/// evaluates to `y` at `z`", where `commitment_index` indexes into the slice
/// of commitments passed alongside a batch of openings.
#[derive(Debug, Clone)]
pub struct Opening<S> {
    /// Index into the accompanying commitment list.
    pub commitment_index: usize,
    /// The evaluation point (a node width index 0..256, mapped to a scalar).
    pub z: S,
    /// The claimed evaluation `P(z)`.
    pub y: S,
}

/// A vector/polynomial commitment primitive over a fixed-width domain.
///
/// Implementations provide the five external primitives spec.md treats as
/// opaque: `Commit`, `ScalarOf`/`MultiMapToScalarField`, `CreateMultiProof`,
/// and `CheckMultiProof`. The tree and proof engine are generic over this
/// trait and never construct `Scalar`/`Point` values except through it.
pub trait CommitmentBackend: Debug + Send + Sync + 'static {
    /// An element of the backend's scalar field.
    type Scalar: Clone + Copy + PartialEq + Send + Sync + 'static;
    /// A commitment (a group element in the backend's curve).
    type Point: Clone + PartialEq + Send + Sync + 'static;
    /// Backend-internal opening witness (e.g. a polynomial's coefficient
    /// vector), kept around between `commit` and `create_multi_proof`.
    type Witness: Clone + Send + Sync + 'static;
    /// An opaque, backend-defined proof blob covering one or more openings.
    type MultiProof: Clone + Send + Sync + 'static;

    /// Fixed-width wire encoding of a [`Self::Point`], in bytes.
    const POINT_BYTES: usize;
    /// Fixed-width wire encoding of a [`Self::Scalar`], in bytes.
    const SCALAR_BYTES: usize;

    /// The additive identity point (the commitment to an all-zero vector).
    fn identity(&self) -> Self::Point;

    /// The additive identity of the scalar field.
    fn scalar_zero(&self) -> Self::Scalar;

    /// Commits to a width-256 vector of scalars, returning both the
    /// commitment and the witness needed to open it later.
    fn commit_with_witness(
        &self,
        values: &[Self::Scalar],
    ) -> Result<(Self::Point, Self::Witness), VerkleError>;

    /// Commits to a vector, discarding the witness.
    fn commit(&self, values: &[Self::Scalar]) -> Result<Self::Point, VerkleError> {
        self.commit_with_witness(values).map(|(c, _)| c)
    }

    /// Updates a commitment in place given a single coordinate delta,
    /// without recomputing the full vector: `C' = C + SRS[index] * (new - old)`.
    fn update(
        &self,
        commitment: &Self::Point,
        index: usize,
        old: Self::Scalar,
        new: Self::Scalar,
    ) -> Result<Self::Point, VerkleError>;

    /// Maps a single commitment to a scalar field element (`ScalarOf`),
    /// e.g. so a child commitment can occupy a coefficient slot in its
    /// parent's polynomial.
    fn scalar_of(&self, point: &Self::Point) -> Self::Scalar;

    /// Maps many commitments to scalars in one call (`MultiMapToScalarField`),
    /// allowing batched backends to amortize the cost.
    fn multi_map_to_scalar_field(&self, points: &[Self::Point]) -> Vec<Self::Scalar> {
        points.iter().map(|p| self.scalar_of(p)).collect()
    }

    /// Embeds a byte string shorter than the field's modulus as a
    /// little-endian integer in the scalar field (e.g. a 31-byte stem).
    /// Not a hash: callers that need an opaque mapping use [`Self::scalar_of`].
    fn scalar_from_value(&self, value: &[u8]) -> Self::Scalar;

    /// Maps a tree index (0..256) into the scalar field as an evaluation
    /// point for the polynomial at that commitment.
    fn scalar_from_index(&self, index: u8) -> Self::Scalar;

    /// Produces one proof covering every opening in `openings`, where
    /// `commitments` holds the set of commitments the openings index into
    /// and `witnesses` holds the matching witness for each commitment.
    fn create_multi_proof(
        &self,
        commitments: &[Self::Point],
        witnesses: &[Self::Witness],
        openings: &[Opening<Self::Scalar>],
    ) -> Result<Self::MultiProof, VerkleError>;

    /// Checks a multi-proof against the claimed openings.
    fn check_multi_proof(
        &self,
        commitments: &[Self::Point],
        openings: &[Opening<Self::Scalar>],
        proof: &Self::MultiProof,
    ) -> Result<bool, VerkleError>;

    /// Serializes a point to its fixed-width wire representation.
    fn point_to_bytes(&self, point: &Self::Point) -> Vec<u8>;
    /// Parses a point from its fixed-width wire representation.
    fn point_from_bytes(&self, bytes: &[u8]) -> Result<Self::Point, VerkleError>;
    /// Serializes a scalar to its fixed-width wire representation.
    fn scalar_to_bytes(&self, scalar: &Self::Scalar) -> Vec<u8>;
    /// Parses a scalar from its fixed-width wire representation.
    fn scalar_from_bytes(&self, bytes: &[u8]) -> Result<Self::Scalar, VerkleError>;
    /// Serializes a multi-proof to bytes.
    fn proof_to_bytes(&self, proof: &Self::MultiProof) -> Vec<u8>;
    /// Parses a multi-proof from bytes.
    fn proof_from_bytes(&self, bytes: &[u8]) -> Result<Self::MultiProof, VerkleError>;
}
