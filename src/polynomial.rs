use rand::{CryptoRng, Rng};

use crate::error::Error;
use crate::field::Gf256;

/// Represents a polynomial over the Galois field GF(2^8).
///
/// `coefficients[0]` is the constant term: the secret when dealing shares, zero when masking
/// shares during renewal. Polynomials are built for a single operation and dropped once their
/// evaluations are taken; they deliberately do not implement `Serialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    coefficients: Vec<Gf256>,
}

impl Polynomial {
    /// Wraps explicit coefficients, lowest degree first.
    pub fn new(coefficients: Vec<Gf256>) -> Self {
        Polynomial { coefficients }
    }

    pub fn coefficients(&self) -> &[Gf256] {
        &self.coefficients
    }

    /// Number of coefficients minus one, or 0 for an empty polynomial.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn constant(&self) -> Gf256 {
        self.coefficients.first().copied().unwrap_or(Gf256::ZERO)
    }

    /// Evaluates the polynomial at a given point as `sum(a_j * x^j)`.
    ///
    /// `x^0` is one even at `x = 0`, so `evaluate(0)` yields the constant term.
    pub fn evaluate(&self, x: Gf256) -> Gf256 {
        let mut result = Gf256::ZERO;
        let mut term = Gf256::ONE;

        for &coeff in &self.coefficients {
            result = result.add(coeff.mul(term));
            term = term.mul(x);
        }

        result
    }
}

/// Draws a polynomial with `k` coefficients whose constant term is `constant`, using the thread
/// local CSPRNG.
pub fn generate_polynomial(k: u8, constant: Gf256) -> Result<Polynomial, Error> {
    generate_polynomial_with_rng(k, constant, &mut rand::thread_rng())
}

/// Draws a polynomial with `k` coefficients whose constant term is `constant`.
///
/// Coefficients `1..k` are independent uniform draws from the non-zero field elements.
///
/// # Errors
///
/// Returns [`Error::InvalidThreshold`] when `k` is zero.
pub fn generate_polynomial_with_rng<R>(
    k: u8,
    constant: Gf256,
    rng: &mut R,
) -> Result<Polynomial, Error>
where
    R: Rng + CryptoRng,
{
    if k == 0 {
        return Err(Error::InvalidThreshold);
    }

    let mut coefficients = vec![constant; k as usize];
    for coeff in coefficients.iter_mut().skip(1) {
        *coeff = Gf256::new(rng.gen_range(1..=255u8));
    }

    Ok(Polynomial { coefficients })
}
