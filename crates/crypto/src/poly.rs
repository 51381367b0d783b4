// Path: crates/crypto/src/poly.rs
//! Polynomial arithmetic over the BLS12-381 scalar field, used to build and
//! open vector commitments.

use dcrypt::algorithms::ec::bls12_381::Bls12_381Scalar as Scalar;
use std::ops::{Add, Mul, Sub};

/// A polynomial in monomial form: `coeffs[i]` is the coefficient of `X^i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    /// Coefficients in ascending order of degree.
    pub coeffs: Vec<Scalar>,
}

impl Polynomial {
    /// An all-zero polynomial of the given degree.
    pub fn zero(degree: usize) -> Self {
        Self {
            coeffs: vec![Scalar::zero(); degree + 1],
        }
    }

    /// Evaluates the polynomial at `x` via Horner's method.
    pub fn eval(&self, x: &Scalar) -> Scalar {
        self.coeffs
            .iter()
            .rev()
            .fold(Scalar::zero(), |acc, coeff| acc * x + coeff)
    }
}

impl<'b> Add<&'b Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: &'b Polynomial) -> Polynomial {
        let max_len = self.coeffs.len().max(rhs.coeffs.len());
        let zero = Scalar::zero();
        let coeffs = (0..max_len)
            .map(|i| {
                *self.coeffs.get(i).unwrap_or(&zero) + *rhs.coeffs.get(i).unwrap_or(&zero)
            })
            .collect();
        Polynomial { coeffs }
    }
}

impl<'b> Sub<&'b Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: &'b Polynomial) -> Polynomial {
        let max_len = self.coeffs.len().max(rhs.coeffs.len());
        let zero = Scalar::zero();
        let coeffs = (0..max_len)
            .map(|i| {
                *self.coeffs.get(i).unwrap_or(&zero) - *rhs.coeffs.get(i).unwrap_or(&zero)
            })
            .collect();
        Polynomial { coeffs }
    }
}

impl<'b> Mul<&'b Polynomial> for &Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: &'b Polynomial) -> Polynomial {
        if self.coeffs.is_empty() || rhs.coeffs.is_empty() {
            return Polynomial { coeffs: vec![] };
        }
        let mut result = Polynomial::zero(self.coeffs.len() + rhs.coeffs.len() - 2);
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in rhs.coeffs.iter().enumerate() {
                if let Some(c) = result.coeffs.get_mut(i + j) {
                    *c += *a * *b;
                }
            }
        }
        result
    }
}

/// Scales every coefficient of `poly` by `scalar`.
pub fn poly_scale(poly: &Polynomial, scalar: Scalar) -> Polynomial {
    Polynomial {
        coeffs: poly.coeffs.iter().map(|c| *c * scalar).collect(),
    }
}

/// `p(X) - y`, a constant shift of the polynomial.
pub fn poly_sub_scalar(poly: &Polynomial, y: Scalar) -> Polynomial {
    if poly.coeffs.is_empty() {
        return Polynomial { coeffs: vec![-y] };
    }
    let mut result = poly.clone();
    if let Some(c0) = result.coeffs.get_mut(0) {
        *c0 -= y;
    }
    result
}

/// `p(X) / (X - z)` via synthetic division. Requires `p(z) == 0`, which
/// holds whenever `p` is `poly_sub_scalar(f, f.eval(&z))`.
pub fn poly_div_linear(poly: &Polynomial, z: Scalar) -> Result<Polynomial, String> {
    if poly.coeffs.is_empty() {
        return Ok(Polynomial { coeffs: vec![] });
    }
    let degree = poly.coeffs.len() - 1;
    if degree == 0 && poly.coeffs.first() == Some(&Scalar::zero()) {
        return Ok(Polynomial { coeffs: vec![] });
    }
    let mut quotient = vec![Scalar::zero(); degree];
    let mut last = Scalar::zero();
    for i in (0..=degree).rev() {
        let coeff = *poly
            .coeffs
            .get(i)
            .ok_or_else(|| format!("poly_div_linear: index {i} out of bounds"))?
            + last;
        if i > 0 {
            if let Some(q) = quotient.get_mut(i - 1) {
                *q = coeff;
            }
        } else if coeff != Scalar::zero() {
            return Err("poly_div_linear: non-zero remainder".into());
        }
        last = coeff * z;
    }
    Ok(Polynomial { coeffs: quotient })
}

/// Evaluates every Lagrange basis polynomial `L_i` for the integer domain
/// `x_i = i, i in 0..n` at `x`, via the textbook product formula
/// `L_i(x) = Π_{j≠i} (x - j) / (i - j)`.
///
/// Used to turn a monomial-basis SRS secret into a Lagrange-basis one: once
/// `L_i(s)` is known for the trapdoor `s`, `Σ values[i] · L_i(s) · G` commits
/// directly to the vector without first interpolating its coefficients, and
/// the per-coordinate delta `SRS[i] = L_i(s) · G` composes correctly with
/// that commitment.
pub fn lagrange_basis_at(x: Scalar, n: usize) -> Result<Vec<Scalar>, String> {
    let mut basis = Vec::with_capacity(n);
    for i in 0..n {
        let i_scalar = Scalar::from(i as u64);
        let mut numer = Scalar::one();
        let mut denom = Scalar::one();
        for j in 0..n {
            if j == i {
                continue;
            }
            let j_scalar = Scalar::from(j as u64);
            numer *= x - j_scalar;
            denom *= i_scalar - j_scalar;
        }
        let denom_inv = denom
            .invert()
            .into_option()
            .ok_or_else(|| "lagrange_basis_at: zero denominator".to_string())?;
        basis.push(numer * denom_inv);
    }
    Ok(basis)
}

/// Interpolates the unique degree-`<n` polynomial `P` such that
/// `P(i) == values[i]` for `i` in `0..values.len()`, via Newton's divided
/// differences over the integer domain `x_i = i`.
pub fn interpolate_at_integers(values: &[Scalar]) -> Result<Polynomial, String> {
    let n = values.len();
    if n == 0 {
        return Ok(Polynomial { coeffs: vec![] });
    }
    let mut dd = values.to_vec();
    let mut a = Vec::with_capacity(n);
    a.push(*dd.first().ok_or("interpolate: empty divided-difference table")?);

    for j in 1..n {
        let denom_inv = Scalar::from(j as u64)
            .invert()
            .into_option()
            .ok_or_else(|| "interpolate: zero denominator".to_string())?;
        for i in 0..(n - j) {
            let next = *dd.get(i + 1).ok_or("interpolate: index out of bounds")?;
            let cur = *dd.get(i).ok_or("interpolate: index out of bounds")?;
            let entry = dd.get_mut(i).ok_or("interpolate: index out of bounds")?;
            *entry = (next - cur) * denom_inv;
        }
        a.push(*dd.first().ok_or("interpolate: empty divided-difference table")?);
    }

    let mut coeffs = vec![Scalar::zero(); n];
    let mut basis = vec![Scalar::one()];
    for (k, ak) in a.iter().enumerate() {
        for (d, basis_d) in basis.iter().enumerate() {
            let c = coeffs.get_mut(d).ok_or("interpolate: coeffs out of bounds")?;
            *c += *basis_d * *ak;
        }
        if k + 1 < n {
            let t = Scalar::from(k as u64);
            let mut next = vec![Scalar::zero(); basis.len() + 1];
            for (d, basis_d) in basis.iter().enumerate() {
                *next.get_mut(d + 1).ok_or("interpolate: shift out of bounds")? += *basis_d;
                *next.get_mut(d).ok_or("interpolate: shift out of bounds")? -= *basis_d * t;
            }
            basis = next;
        }
    }
    Ok(Polynomial { coeffs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_reproduces_sample_points() {
        let values: Vec<Scalar> = (0..8u64).map(Scalar::from).collect();
        let poly = interpolate_at_integers(&values).expect("interpolation succeeds");
        for (i, v) in values.iter().enumerate() {
            assert_eq!(poly.eval(&Scalar::from(i as u64)), *v);
        }
    }

    #[test]
    fn lagrange_basis_reproduces_the_interpolated_polynomial() {
        let values: Vec<Scalar> = (0..6u64).map(|i| Scalar::from(i * 3 + 2)).collect();
        let poly = interpolate_at_integers(&values).expect("interpolation succeeds");
        let x = Scalar::from(777u64);
        let basis = lagrange_basis_at(x, values.len()).expect("basis evaluation succeeds");
        let via_basis = values
            .iter()
            .zip(basis.iter())
            .fold(Scalar::zero(), |acc, (v, l)| acc + *v * *l);
        assert_eq!(via_basis, poly.eval(&x));
    }

    #[test]
    fn division_by_linear_factor_has_zero_remainder() {
        let values: Vec<Scalar> = (0..5u64).map(|i| Scalar::from(i * i)).collect();
        let poly = interpolate_at_integers(&values).expect("interpolation succeeds");
        let z = Scalar::from(2u64);
        let y = poly.eval(&z);
        let shifted = poly_sub_scalar(&poly, y);
        let quotient = poly_div_linear(&shifted, z).expect("exact division");
        // (X - z) * quotient should reproduce `shifted`.
        let factor = Polynomial {
            coeffs: vec![-z, Scalar::one()],
        };
        let rebuilt = &factor * &quotient;
        for i in 0..shifted.coeffs.len() {
            let zero = Scalar::zero();
            assert_eq!(
                *rebuilt.coeffs.get(i).unwrap_or(&zero),
                *shifted.coeffs.get(i).unwrap_or(&zero)
            );
        }
    }
}
