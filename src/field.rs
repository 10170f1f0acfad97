use core::fmt;
use std::iter::Sum;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::constants::{FIELD_ORDER, GENERATOR, IRREDUCIBLE_POLYNOMIAL};
use crate::error::Error;

lazy_static! {
    /// Process-wide Exp/Log tables. Built on first use and only read afterwards, so any number of
    /// threads may share them without locking.
    static ref TABLES: FieldTables = FieldTables::build();
}

/// Exponent and logarithm tables of GF(2^8) for the generator `0x02`.
///
/// `exp[i]` is `0x02^i` and `log[v]` is the discrete logarithm of `v`. `exp[255]` wraps around to
/// 1 and `log[0]` is never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTables {
    pub exp: [u8; FIELD_ORDER],
    pub log: [u8; FIELD_ORDER],
}

impl FieldTables {
    /// Walks the cyclic group generated by `0x02`, one Russian-peasant multiplication per step.
    pub fn build() -> Self {
        let mut exp = [0u8; FIELD_ORDER];
        let mut log = [0u8; FIELD_ORDER];

        let mut value = 1u8;
        for i in 0..FIELD_ORDER {
            exp[i] = value;
            if i < FIELD_ORDER - 1 {
                log[value as usize] = i as u8;
            }
            value = peasant_mul(GENERATOR, value);
        }

        FieldTables { exp, log }
    }
}

/// Builds a fresh pair of `(Exp, Log)` tables.
///
/// The result is deterministic and byte-identical to the tables used by [`Gf256`].
pub fn build_field_tables() -> ([u8; FIELD_ORDER], [u8; FIELD_ORDER]) {
    let tables = FieldTables::build();
    (tables.exp, tables.log)
}

/// Carry-less multiplication reduced modulo the irreducible polynomial.
fn peasant_mul(mut a: u8, mut b: u8) -> u8 {
    let reduction = (IRREDUCIBLE_POLYNOMIAL & 0xFF) as u8;
    let mut result = 0u8;

    while b != 0 {
        if b & 1 != 0 {
            result ^= a;
        }
        let overflow = a & 0x80 != 0;
        a <<= 1;
        if overflow {
            a ^= reduction;
        }
        b >>= 1;
    }

    result
}

/// An element of GF(2^8) built on the polynomial `x^8 + x^4 + x^3 + x^2 + 1`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gf256(u8);

impl Gf256 {
    pub const ZERO: Gf256 = Gf256(0);
    pub const ONE: Gf256 = Gf256(1);

    pub const fn new(value: u8) -> Self {
        Gf256(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Field addition (XOR).
    pub const fn add(self, other: Gf256) -> Gf256 {
        Gf256(self.0 ^ other.0)
    }

    /// Field subtraction, identical to addition in characteristic 2.
    pub const fn sub(self, other: Gf256) -> Gf256 {
        Gf256(self.0 ^ other.0)
    }

    pub fn mul(self, other: Gf256) -> Gf256 {
        if self.is_zero() || other.is_zero() {
            return Gf256::ZERO;
        }
        let tables = &*TABLES;
        let index = (tables.log[self.0 as usize] as usize + tables.log[other.0 as usize] as usize)
            % (FIELD_ORDER - 1);
        Gf256(tables.exp[index])
    }

    /// Field division.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DivisionByZero`] when `other` is zero.
    pub fn div(self, other: Gf256) -> Result<Gf256, Error> {
        if other.is_zero() {
            return Err(Error::DivisionByZero);
        }
        if self.is_zero() {
            return Ok(Gf256::ZERO);
        }
        let tables = &*TABLES;
        let index = ((FIELD_ORDER - 1) + tables.log[self.0 as usize] as usize
            - tables.log[other.0 as usize] as usize)
            % (FIELD_ORDER - 1);
        Ok(Gf256(tables.exp[index]))
    }

    /// Repeated multiplication. `pow(x, 0)` is one for every `x`, zero included, so that the
    /// constant term of a polynomial evaluates to itself at `x = 0`.
    pub fn pow(self, exponent: u8) -> Gf256 {
        (0..exponent).fold(Gf256::ONE, |acc, _| acc.mul(self))
    }
}

impl From<u8> for Gf256 {
    fn from(value: u8) -> Self {
        Gf256(value)
    }
}

impl From<Gf256> for u8 {
    fn from(value: Gf256) -> Self {
        value.0
    }
}

impl fmt::Display for Gf256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Gf256 {
    fn sum<I: Iterator<Item = Gf256>>(iter: I) -> Self {
        iter.fold(Gf256::ZERO, Gf256::add)
    }
}

impl<'a> Sum<&'a Gf256> for Gf256 {
    fn sum<I: Iterator<Item = &'a Gf256>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
