// Path: crates/crypto/src/bls_commitment.rs
//! A `CommitmentBackend` built on `dcrypt`'s BLS12-381 pairing, standing in
//! for the curve this workspace treats as external (bandersnatch/banderwagon
//! with an inner-product multiproof). The vector-commitment shape and the
//! batched-opening proof are real; the curve underneath is swapped for one
//! the rest of this workspace already depends on.
//!
//! Multi-point openings use the BDFG20 batched-KZG technique: a first
//! Fiat-Shamir challenge combines each opening's quotient into one
//! polynomial commitment, a second challenge collapses the whole batch to a
//! single evaluation, and the final proof is one more quotient commitment.

use crate::poly::{
    interpolate_at_integers, lagrange_basis_at, poly_div_linear, poly_scale, poly_sub_scalar, Polynomial,
};
use dcrypt::algorithms::ec::bls12_381::{
    pairing, Bls12_381Scalar as Scalar, G1Affine, G1Projective, G2Affine, G2Projective,
};
use verkle_api::commitment::{CommitmentBackend, Opening};
use verkle_types::error::VerkleError;

const TRANSCRIPT_DST: &[u8] = b"VERKLE-CORE-BLS-MULTIPROOF-V1";
const VALUE_DST: &[u8] = b"VERKLE-CORE-BLS-SCALAR-OF-V1";

/// A commitment: the compressed affine encoding of a G1 point.
#[derive(Clone)]
pub struct Point(pub G1Affine);

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_compressed().as_ref() == other.0.to_compressed().as_ref()
    }
}

impl Eq for Point {}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Point({})", hex::encode(self.0.to_compressed()))
    }
}

/// The coefficients of a committed polynomial, kept around to produce an
/// opening proof without recomputing the commitment.
#[derive(Clone, Debug)]
pub struct Witness(pub Polynomial);

/// A batched multi-point opening proof: one commitment to the combined
/// quotient, one commitment to the final collapsed quotient.
#[derive(Clone, Debug)]
pub struct MultiProof {
    /// Commitment to `h(X) = Σ γ^i · qᵢ(X)`.
    pub d: G1Affine,
    /// Commitment to the final quotient at the collapsed evaluation point.
    pub pi: G1Affine,
}

/// A structured reference string: one G1 point per supported polynomial
/// coefficient in both the monomial and Lagrange bases, plus the G2 trapdoor
/// point needed for pairing checks.
///
/// `g1_points[i] = sⁱ·G` backs the quotient commitments in
/// [`Bls12DegreeCommitment::create_multi_proof`], which are genuinely
/// monomial polynomials. `g1_lagrange[i] = L_i(s)·G`, the evaluation of the
/// `i`-th Lagrange basis polynomial over the integer domain `0..=max_degree`
/// at the trapdoor, backs vector commitments: `Σ values[i]·L_i(s)·G`
/// commits directly to `values` without interpolating it first, which keeps
/// it consistent with [`CommitmentBackend::update`]'s per-coordinate delta
/// `SRS[i]·(new - old)`.
#[derive(Debug, Clone)]
pub struct Srs {
    g1: G1Affine,
    g2: G2Affine,
    s_g2: G2Affine,
    g1_points: Vec<G1Affine>,
    g1_lagrange: Vec<G1Affine>,
}

impl Srs {
    /// Builds an insecure, deterministic SRS for development and tests.
    /// The discrete log of every point is derivable from `seed`; this must
    /// never be used where an honest trusted setup is required.
    pub fn insecure_for_testing(seed: u64, max_degree: usize) -> Self {
        tracing::warn!(seed, max_degree, "generating insecure BLS SRS for testing");
        let g1 = G1Affine::generator();
        let g2 = G2Affine::generator();
        let s = Scalar::from(seed.max(2));
        let s_g2 = G2Affine::from(G2Projective::from(g2) * s);
        let g1_proj = G1Projective::from(g1);
        let mut g1_points = Vec::with_capacity(max_degree + 1);
        let mut s_pow = Scalar::one();
        for _ in 0..=max_degree {
            g1_points.push(G1Affine::from(g1_proj * s_pow));
            s_pow *= s;
        }
        let lagrange_weights = lagrange_basis_at(s, max_degree + 1)
            .expect("domain 0..=max_degree is pairwise distinct, so no denominator vanishes");
        let g1_lagrange = lagrange_weights
            .into_iter()
            .map(|weight| G1Affine::from(g1_proj * weight))
            .collect();
        Self {
            g1,
            g2,
            s_g2,
            g1_points,
            g1_lagrange,
        }
    }
}

/// The default reference `CommitmentBackend`: a degree-256 BLS12-381 vector
/// commitment with BDFG20 batched openings.
#[derive(Debug, Clone)]
pub struct Bls12DegreeCommitment {
    srs: Srs,
}

impl Bls12DegreeCommitment {
    /// Builds a backend around the given SRS. `srs.g1_points` must be at
    /// least as long as the widest vector ever committed to (256 for this
    /// workspace's node width).
    pub fn new(srs: Srs) -> Self {
        Self { srs }
    }

    /// Convenience constructor wrapping [`Srs::insecure_for_testing`].
    pub fn new_for_testing(seed: u64, max_degree: usize) -> Self {
        Self::new(Srs::insecure_for_testing(seed, max_degree))
    }

    /// Monomial-basis MSM, for the quotient commitments in multi-proofs.
    fn msm(&self, coeffs: &[Scalar]) -> Result<G1Affine, VerkleError> {
        let points = self
            .srs
            .g1_points
            .get(..coeffs.len())
            .ok_or_else(|| VerkleError::Crypto("SRS too small for polynomial degree".into()))?;
        let proj = G1Projective::msm(points, coeffs)
            .map_err(|e| VerkleError::Crypto(format!("MSM failed: {e}")))?;
        Ok(G1Affine::from(proj))
    }

    /// Lagrange-basis MSM: commits directly to `values` at the integer
    /// domain `0..values.len()` without interpolating monomial coefficients.
    fn lagrange_msm(&self, values: &[Scalar]) -> Result<G1Affine, VerkleError> {
        let points = self
            .srs
            .g1_lagrange
            .get(..values.len())
            .ok_or_else(|| VerkleError::Crypto("SRS too small for vector length".into()))?;
        let proj = G1Projective::msm(points, values)
            .map_err(|e| VerkleError::Crypto(format!("MSM failed: {e}")))?;
        Ok(G1Affine::from(proj))
    }

    fn transcript_challenge(label: &[u8], parts: &[&[u8]]) -> Result<Scalar, VerkleError> {
        let mut data = Vec::new();
        data.extend_from_slice(label);
        for p in parts {
            data.extend_from_slice(p);
        }
        Scalar::hash_to_field(&data, TRANSCRIPT_DST)
            .map_err(|e| VerkleError::Crypto(format!("hash-to-field failed: {e:?}")))
    }
}

impl CommitmentBackend for Bls12DegreeCommitment {
    type Scalar = Scalar;
    type Point = Point;
    type Witness = Witness;
    type MultiProof = MultiProof;

    const POINT_BYTES: usize = 48;
    const SCALAR_BYTES: usize = 32;

    fn identity(&self) -> Self::Point {
        Point(G1Affine::from(G1Projective::from(self.srs.g1) * Scalar::zero()))
    }

    fn scalar_zero(&self) -> Self::Scalar {
        Scalar::zero()
    }

    fn commit_with_witness(
        &self,
        values: &[Self::Scalar],
    ) -> Result<(Self::Point, Self::Witness), VerkleError> {
        // The witness stays in monomial form for `create_multi_proof`'s
        // quotient division, but the commitment itself is a direct
        // Lagrange-basis MSM so it matches `update`'s per-coordinate delta.
        let poly = interpolate_at_integers(values)
            .map_err(VerkleError::Crypto)?;
        let point = self.lagrange_msm(values)?;
        Ok((Point(point), Witness(poly)))
    }

    fn update(
        &self,
        commitment: &Self::Point,
        index: usize,
        old: Self::Scalar,
        new: Self::Scalar,
    ) -> Result<Self::Point, VerkleError> {
        let srs_point = self
            .srs
            .g1_lagrange
            .get(index)
            .ok_or_else(|| VerkleError::Crypto("commitment index out of SRS range".into()))?;
        let delta = new - old;
        let delta_term = G1Projective::from(*srs_point) * delta;
        let updated = G1Projective::from(commitment.0.clone()) + delta_term;
        Ok(Point(G1Affine::from(updated)))
    }

    fn scalar_of(&self, point: &Self::Point) -> Self::Scalar {
        let bytes = point.0.to_compressed();
        Scalar::hash_to_field(bytes.as_ref(), VALUE_DST)
            .unwrap_or_else(|_| Scalar::zero())
    }

    fn scalar_from_value(&self, value: &[u8]) -> Self::Scalar {
        // Little-endian canonical embedding, zero-padded on the high end.
        // `value` is at most 31 bytes everywhere it's actually called (a
        // stem), which is always `< r`, so this never needs a reduction.
        let mut padded = [0u8; 32];
        let n = value.len().min(32);
        padded[..n].copy_from_slice(&value[..n]);
        Scalar::from_bytes(&padded).into_option().unwrap_or_else(Scalar::zero)
    }

    fn scalar_from_index(&self, index: u8) -> Self::Scalar {
        Scalar::from(index as u64)
    }

    fn create_multi_proof(
        &self,
        commitments: &[Self::Point],
        witnesses: &[Self::Witness],
        openings: &[Opening<Self::Scalar>],
    ) -> Result<Self::MultiProof, VerkleError> {
        if openings.is_empty() {
            return Err(VerkleError::NoKeyProvided);
        }
        let mut transcript_bytes = Vec::new();
        for c in commitments {
            transcript_bytes.extend_from_slice(&c.0.to_compressed());
        }
        for o in openings {
            transcript_bytes.extend_from_slice(&(o.commitment_index as u64).to_le_bytes());
            transcript_bytes.extend_from_slice(o.z.to_bytes().as_ref());
            transcript_bytes.extend_from_slice(o.y.to_bytes().as_ref());
        }
        let gamma = Self::transcript_challenge(b"gamma", &[&transcript_bytes])?;

        let mut gamma_pow = Scalar::one();
        let mut h = Polynomial { coeffs: vec![] };
        let mut quotients = Vec::with_capacity(openings.len());
        for opening in openings {
            let f_i = &witnesses
                .get(opening.commitment_index)
                .ok_or_else(|| VerkleError::Crypto("witness index out of range".into()))?
                .0;
            let shifted = poly_sub_scalar(f_i, opening.y);
            let q_i = poly_div_linear(&shifted, opening.z).map_err(VerkleError::Crypto)?;
            h = &h + &poly_scale(&q_i, gamma_pow);
            quotients.push(q_i);
            gamma_pow *= gamma;
        }
        let d = self.msm(&h.coeffs)?;

        let t = Self::transcript_challenge(b"t", &[&transcript_bytes, &d.to_compressed()])?;

        let mut rho_pow = Scalar::one();
        let mut l = Polynomial { coeffs: vec![] };
        for opening in openings {
            let f_i = &witnesses
                .get(opening.commitment_index)
                .ok_or_else(|| VerkleError::Crypto("witness index out of range".into()))?
                .0;
            let denom_inv = (t - opening.z)
                .invert()
                .into_option()
                .ok_or_else(|| VerkleError::Crypto("t collided with an opening point".into()))?;
            let rho_i = rho_pow * denom_inv;
            l = &l + &poly_scale(f_i, rho_i);
            rho_pow *= gamma;
        }
        let l_minus_h = &l - &h;
        let g = l_minus_h.eval(&t);
        let w = poly_div_linear(&poly_sub_scalar(&l_minus_h, g), t).map_err(VerkleError::Crypto)?;
        let pi = self.msm(&w.coeffs)?;

        Ok(MultiProof { d, pi })
    }

    fn check_multi_proof(
        &self,
        commitments: &[Self::Point],
        openings: &[Opening<Self::Scalar>],
        proof: &Self::MultiProof,
    ) -> Result<bool, VerkleError> {
        if openings.is_empty() {
            return Err(VerkleError::NoKeyProvided);
        }
        let mut transcript_bytes = Vec::new();
        for c in commitments {
            transcript_bytes.extend_from_slice(&c.0.to_compressed());
        }
        for o in openings {
            transcript_bytes.extend_from_slice(&(o.commitment_index as u64).to_le_bytes());
            transcript_bytes.extend_from_slice(o.z.to_bytes().as_ref());
            transcript_bytes.extend_from_slice(o.y.to_bytes().as_ref());
        }
        let gamma = Self::transcript_challenge(b"gamma", &[&transcript_bytes])?;
        let t = Self::transcript_challenge(b"t", &[&transcript_bytes, &proof.d.to_compressed()])?;

        let mut rho_pow = Scalar::one();
        let mut e = G1Projective::from(proof.d.clone()) * (-Scalar::one());
        let mut g = Scalar::zero();
        for opening in openings {
            let c_i = commitments
                .get(opening.commitment_index)
                .ok_or_else(|| VerkleError::Crypto("commitment index out of range".into()))?;
            let denom_inv = (t - opening.z)
                .invert()
                .into_option()
                .ok_or_else(|| VerkleError::Crypto("t collided with an opening point".into()))?;
            let rho_i = rho_pow * denom_inv;
            e = e + G1Projective::from(c_i.0.clone()) * rho_i;
            g += rho_i * opening.y;
            rho_pow *= gamma;
        }

        let lhs_point = G1Affine::from(e - G1Projective::from(self.srs.g1) * g);
        let rhs_g2 = G2Affine::from(G2Projective::from(self.srs.s_g2) - G2Projective::from(self.srs.g2) * t);

        let lhs = pairing(&lhs_point, &self.srs.g2);
        let rhs = pairing(&proof.pi, &rhs_g2);
        Ok(lhs == rhs)
    }

    fn point_to_bytes(&self, point: &Self::Point) -> Vec<u8> {
        point.0.to_compressed().as_ref().to_vec()
    }

    fn point_from_bytes(&self, bytes: &[u8]) -> Result<Self::Point, VerkleError> {
        let arr: [u8; 48] = bytes
            .try_into()
            .map_err(|_| VerkleError::InvalidCommitmentBytes)?;
        G1Affine::from_compressed(&arr)
            .map(Point)
            .map_err(|_| VerkleError::InvalidCommitmentBytes)
    }

    fn scalar_to_bytes(&self, scalar: &Self::Scalar) -> Vec<u8> {
        scalar.to_bytes().as_ref().to_vec()
    }

    fn scalar_from_bytes(&self, bytes: &[u8]) -> Result<Self::Scalar, VerkleError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| VerkleError::InvalidCommitmentBytes)?;
        Scalar::from_bytes(&arr)
            .into_option()
            .ok_or(VerkleError::InvalidCommitmentBytes)
    }

    fn proof_to_bytes(&self, proof: &Self::MultiProof) -> Vec<u8> {
        let mut out = proof.d.to_compressed().as_ref().to_vec();
        out.extend_from_slice(proof.pi.to_compressed().as_ref());
        out
    }

    fn proof_from_bytes(&self, bytes: &[u8]) -> Result<Self::MultiProof, VerkleError> {
        if bytes.len() != 96 {
            return Err(VerkleError::SerializedPayloadTooShort {
                need: 96,
                got: bytes.len(),
            });
        }
        let d_bytes: [u8; 48] = bytes[..48]
            .try_into()
            .map_err(|_| VerkleError::InvalidCommitmentBytes)?;
        let pi_bytes: [u8; 48] = bytes[48..]
            .try_into()
            .map_err(|_| VerkleError::InvalidCommitmentBytes)?;
        let d = G1Affine::from_compressed(&d_bytes).map_err(|_| VerkleError::InvalidCommitmentBytes)?;
        let pi = G1Affine::from_compressed(&pi_bytes).map_err(|_| VerkleError::InvalidCommitmentBytes)?;
        Ok(MultiProof { d, pi })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_backend() -> Bls12DegreeCommitment {
        Bls12DegreeCommitment::new_for_testing(424242, 256)
    }

    #[test]
    fn commit_is_deterministic() {
        let backend = sample_backend();
        let values: Vec<Scalar> = (0..8u64).map(Scalar::from).collect();
        let a = backend.commit(&values).expect("commit succeeds");
        let b = backend.commit(&values).expect("commit succeeds");
        assert_eq!(a, b);
    }

    #[test]
    fn update_matches_full_recommit() {
        let backend = sample_backend();
        let mut values: Vec<Scalar> = (0..16u64).map(Scalar::from).collect();
        let original = backend.commit(&values).expect("commit succeeds");

        let old = values[3];
        let new = Scalar::from(999u64);
        values[3] = new;
        let recommitted = backend.commit(&values).expect("commit succeeds");

        let updated = backend
            .update(&original, 3, old, new)
            .expect("delta update succeeds");
        assert_eq!(updated, recommitted);
    }

    #[test]
    fn single_opening_multiproof_round_trips() {
        let backend = sample_backend();
        let values: Vec<Scalar> = (0..32u64).map(|i| Scalar::from(i * 7 + 1)).collect();
        let (commitment, witness) = backend.commit_with_witness(&values).expect("commit succeeds");

        let index = 5usize;
        let opening = Opening {
            commitment_index: 0,
            z: backend.scalar_from_index(index as u8),
            y: values[index],
        };
        let proof = backend
            .create_multi_proof(&[commitment.clone()], &[witness], &[opening.clone()])
            .expect("proof creation succeeds");
        let ok = backend
            .check_multi_proof(&[commitment], &[opening], &proof)
            .expect("verification runs");
        assert!(ok);
    }

    #[test]
    fn batched_multiproof_across_two_commitments_round_trips() {
        let backend = sample_backend();
        let a_values: Vec<Scalar> = (0..16u64).map(|i| Scalar::from(i + 1)).collect();
        let b_values: Vec<Scalar> = (0..16u64).map(|i| Scalar::from(200 - i)).collect();
        let (a_commitment, a_witness) = backend.commit_with_witness(&a_values).expect("commit a");
        let (b_commitment, b_witness) = backend.commit_with_witness(&b_values).expect("commit b");

        let openings = vec![
            Opening {
                commitment_index: 0,
                z: backend.scalar_from_index(2),
                y: a_values[2],
            },
            Opening {
                commitment_index: 1,
                z: backend.scalar_from_index(9),
                y: b_values[9],
            },
        ];
        let commitments = vec![a_commitment, b_commitment];
        let witnesses = vec![a_witness, b_witness];
        let proof = backend
            .create_multi_proof(&commitments, &witnesses, &openings)
            .expect("batched proof succeeds");
        let ok = backend
            .check_multi_proof(&commitments, &openings, &proof)
            .expect("verification runs");
        assert!(ok);
    }

    #[test]
    fn tampered_opening_fails_verification() {
        let backend = sample_backend();
        let values: Vec<Scalar> = (0..8u64).map(Scalar::from).collect();
        let (commitment, witness) = backend.commit_with_witness(&values).expect("commit succeeds");
        let opening = Opening {
            commitment_index: 0,
            z: backend.scalar_from_index(3),
            y: values[3],
        };
        let proof = backend
            .create_multi_proof(&[commitment.clone()], &[witness], &[opening.clone()])
            .expect("proof creation succeeds");

        let wrong_opening = Opening {
            y: values[3] + Scalar::one(),
            ..opening
        };
        let ok = backend
            .check_multi_proof(&[commitment], &[wrong_opening], &proof)
            .expect("verification runs");
        assert!(!ok);
    }
}
