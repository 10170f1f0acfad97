//! # Threshold Secret Sharing with Proactive Share Renewal
//!
//! This library implements Shamir's Secret Sharing (SSS) over GF(2^8) together with a proactive
//! renewal protocol that re-randomizes shares without changing the secret they encode.
//!
//! ## Shamir's Secret Sharing (SSS)
//!
//! A secret byte `S` is hidden as the constant term of a random polynomial of degree `k-1`:
//!
//! ```ignore
//! f(x) = S + a1*x + a2*x^2 + ... + a(k-1)*x^(k-1)
//! ```
//!
//! Player `i` receives the point `(i, f(i))`. Any `k` points determine `f` and therefore `f(0) = S`
//! by Lagrange interpolation, while `k-1` points are consistent with every possible secret.
//!
//! Arithmetic uses the field built on `x^8 + x^4 + x^3 + x^2 + 1` (0x11D) with generator `0x02`.
//! Multiplication and division go through Exp/Log tables that are built once per process and then
//! shared read-only.
//!
//! ### Proactive Secret Sharing
//!
//! In every renewal epoch each player draws a polynomial with a zero constant term and sends its
//! evaluation at every other player's x-coordinate (a subshare). A player adds all subshares it
//! received to its share. The secret is unchanged, but shares from different epochs cannot be
//! mixed, so an adversary has to compromise `k` players within a single epoch.
//!
//! ### Example: Splitting and Refreshing a Secret
//!
//! ```rust
//! use reshard::renewal::refresh_shares;
//! use reshard::sss::{combine_shares, split_secret};
//!
//! let mut shares = split_secret(b"correct horse", 3, 5).unwrap();
//! refresh_shares(&mut shares, 3).unwrap();
//!
//! assert_eq!(combine_shares(&shares[2..], 3).unwrap(), b"correct horse");
//! ```
//!
//! ## Modules
//!
//! - `field`: GF(2^8) element and table construction.
//! - `polynomial`: random polynomials with a chosen constant term.
//! - `share`: single-byte shares and per-player share entries.
//! - `sss`: share generation and secret reconstruction.
//! - `renewal`: subshare generation and combination.
//! - `repository`: file and in-memory share storage.
//! - `config`: defaults for the command line tool.

/// Constants shared across the crate: field parameters, file naming and CLI defaults.
pub mod constants;

/// The crate's error type.
pub mod error;

/// Arithmetic over GF(2^8) backed by precomputed Exp/Log tables.
pub mod field;

/// Polynomials over GF(2^8), used both to deal shares and to mask them during renewal.
pub mod polynomial;

/// Share types and the persisted share byte layout.
pub mod share;

/// The `sss` module splits secrets into shares and reconstructs them. It works on single field
/// elements and on byte strings, one independent sharing per byte.
pub mod sss;

/// The `renewal` module implements the proactive share renewal protocol: subshare generation
/// by each player, combination into new shares, and bundles that carry one dealer's subshares
/// for a whole byte string.
pub mod renewal;

/// The `repository` module persists share entries, either as share files in a directory or in
/// memory.
pub mod repository;

pub mod config;

pub use error::Error;
pub use field::{build_field_tables, Gf256};
pub use share::{Share, ShareEntry};
