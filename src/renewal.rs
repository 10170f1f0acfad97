//! https://en.wikipedia.org/wiki/Proactive_secret_sharing#Mathematics
//!
//! Every player samples a polynomial with a zero constant term and hands its evaluation at each
//! player's x-coordinate to that player. Each player then adds everything it received to its
//! current share. The sum of the masks is itself a zero-constant polynomial of degree below `k`,
//! so interpolation at `x = 0` still yields the old secret while the individual shares are
//! re-randomized.

use std::collections::HashSet;

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::field::Gf256;
use crate::polynomial::generate_polynomial_with_rng;
use crate::share::{Share, ShareEntry};

/// Generates one player's subshares: a fresh zero-constant polynomial evaluated at every entry
/// of `xs`, in order.
pub fn generate_subshares(xs: &[Gf256], k: u8) -> Result<Vec<Gf256>, Error> {
    generate_subshares_with_rng(xs, k, &mut rand::thread_rng())
}

/// Same as [`generate_subshares`] with an explicit randomness source.
///
/// # Errors
///
/// * [`Error::InvalidThreshold`] if `k` is zero or `xs` is empty.
/// * [`Error::TooFewPlayers`] if `xs` holds fewer than `k` abscissas.
pub fn generate_subshares_with_rng<R>(xs: &[Gf256], k: u8, rng: &mut R) -> Result<Vec<Gf256>, Error>
where
    R: Rng + CryptoRng,
{
    if k == 0 || xs.is_empty() {
        return Err(Error::InvalidThreshold);
    }
    if xs.len() < k as usize {
        return Err(Error::TooFewPlayers {
            threshold: k,
            players: xs.len(),
        });
    }

    let mask = generate_polynomial_with_rng(k, Gf256::ZERO, rng)?;
    Ok(xs.iter().map(|&x| mask.evaluate(x)).collect())
}

/// Adds every received subshare to `old`'s y-value; the x-coordinate is kept.
///
/// # Errors
///
/// Returns [`Error::EmptySubshareSet`] if `subshares` is empty.
pub fn combine_new_share(old: Share, subshares: &[Gf256]) -> Result<Share, Error> {
    if subshares.is_empty() {
        return Err(Error::EmptySubshareSet);
    }
    let mask: Gf256 = subshares.iter().sum();
    Ok(Share::new(old.x, old.y.add(mask)))
}

/// Turns raw player x-coordinates into a sorted, deduplicated list of abscissas.
///
/// A dealer only needs the other players' x-coordinates, never their share files.
///
/// # Arguments
///
/// * `raw` - The players' x-coordinates, in any order.
///
/// # Returns
///
/// The abscissas in ascending order without repeats.
///
/// # Errors
///
/// Returns [`Error::ZeroAbscissa`] if any coordinate is zero.
///
/// # Examples
///
/// ```rust
/// use reshard::field::Gf256;
/// use reshard::renewal::player_abscissas;
///
/// let xs = player_abscissas(&[3, 1, 2, 3]).unwrap();
/// assert_eq!(xs, vec![Gf256::new(1), Gf256::new(2), Gf256::new(3)]);
/// assert!(player_abscissas(&[1, 0]).is_err());
/// ```
pub fn player_abscissas(raw: &[u8]) -> Result<Vec<Gf256>, Error> {
    if raw.contains(&0) {
        return Err(Error::ZeroAbscissa);
    }
    let mut xs: Vec<Gf256> = raw.iter().copied().map(Gf256::new).collect();
    xs.sort();
    xs.dedup();
    Ok(xs)
}

/// The subshares one dealer produced for each recipient, covering every byte of the secret.
///
/// # Fields
///
/// * `dealer` - The x-coordinate of the player that drew the masks.
/// * `rows` - One row per recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubshareBundle {
    pub dealer: Gf256,
    pub rows: Vec<SubshareRow>,
}

/// The subshares a single recipient gets from one dealer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubshareRow {
    pub recipient: Gf256,
    /// One subshare per secret byte.
    pub values: Vec<u8>,
}

impl SubshareBundle {
    /// Finds the row addressed to `recipient`.
    ///
    /// # Errors
    ///
    /// * [`Error::MissingSubshare`] if no row is addressed to `recipient`.
    /// * [`Error::DuplicateRecipient`] if more than one is.
    pub fn row_for(&self, recipient: Gf256) -> Result<&SubshareRow, Error> {
        let mut matching = self.rows.iter().filter(|row| row.recipient == recipient);
        let row = matching.next().ok_or(Error::MissingSubshare {
            dealer: self.dealer.value(),
            recipient: recipient.value(),
        })?;
        if matching.next().is_some() {
            return Err(Error::DuplicateRecipient {
                dealer: self.dealer.value(),
                recipient: recipient.value(),
            });
        }
        Ok(row)
    }

    /// Encodes the bundle as CBOR for handing to a transport.
    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    /// Decodes a bundle produced by [`SubshareBundle::to_cbor`].
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}

/// Deals subshares for every byte held by `dealer`, addressed to the players at `xs`.
///
/// # Arguments
///
/// * `dealer` - The dealing player's share entry. Only its x-coordinate and length are used.
/// * `xs` - The x-coordinates of every player, the dealer included.
/// * `k` - The reconstruction threshold.
///
/// # Returns
///
/// A bundle with one row per entry of `xs`, each holding `dealer.len()` subshares.
///
/// # Examples
///
/// ```rust
/// use reshard::field::Gf256;
/// use reshard::renewal::{apply_subshares, deal_subshares};
/// use reshard::sss::{combine_shares, split_secret};
///
/// let entries = split_secret(b"epoch", 2, 3).unwrap();
/// let xs: Vec<Gf256> = entries.iter().map(|e| e.x).collect();
/// let bundles: Vec<_> = entries
///     .iter()
///     .map(|dealer| deal_subshares(dealer, &xs, 2).unwrap())
///     .collect();
///
/// let renewed: Vec<_> = entries
///     .iter()
///     .map(|entry| apply_subshares(entry, &bundles).unwrap())
///     .collect();
/// assert_eq!(combine_shares(&renewed[1..], 2).unwrap(), b"epoch");
/// ```
pub fn deal_subshares(dealer: &ShareEntry, xs: &[Gf256], k: u8) -> Result<SubshareBundle, Error> {
    deal_subshares_with_rng(dealer, xs, k, &mut rand::thread_rng())
}

/// Same as [`deal_subshares`] with an explicit randomness source.
///
/// A fresh mask polynomial is drawn for each byte position.
///
/// # Errors
///
/// Same as [`generate_subshares`].
pub fn deal_subshares_with_rng<R>(
    dealer: &ShareEntry,
    xs: &[Gf256],
    k: u8,
    rng: &mut R,
) -> Result<SubshareBundle, Error>
where
    R: Rng + CryptoRng,
{
    let mut rows: Vec<SubshareRow> = xs
        .iter()
        .map(|&recipient| SubshareRow {
            recipient,
            values: Vec::with_capacity(dealer.len()),
        })
        .collect();

    // validate even when there is nothing to mask
    if dealer.is_empty() {
        generate_subshares_with_rng(xs, k, rng)?;
    }

    for _ in 0..dealer.len() {
        let subshares = generate_subshares_with_rng(xs, k, rng)?;
        for (row, value) in rows.iter_mut().zip(subshares) {
            row.values.push(value.value());
        }
    }

    Ok(SubshareBundle {
        dealer: dealer.x,
        rows,
    })
}

/// Combines the bundles received from every dealer into a refreshed copy of `entry`.
///
/// Each dealer must contribute exactly once: a mask added twice moves the share off the
/// sharing polynomial.
///
/// # Arguments
///
/// * `entry` - The receiving player's current share entry.
/// * `bundles` - One bundle from every dealer, the receiving player's own included.
///
/// # Returns
///
/// The renewed entry, with the same x-coordinate.
///
/// # Errors
///
/// * [`Error::EmptySubshareSet`] if `bundles` is empty.
/// * [`Error::DuplicateDealer`] if two bundles come from the same dealer.
/// * [`Error::MissingSubshare`] if a bundle carries no row for `entry.x`.
/// * [`Error::DuplicateRecipient`] if a bundle carries several rows for `entry.x`.
/// * [`Error::LengthMismatch`] if a row does not cover exactly `entry.len()` bytes.
pub fn apply_subshares(entry: &ShareEntry, bundles: &[SubshareBundle]) -> Result<ShareEntry, Error> {
    if bundles.is_empty() {
        return Err(Error::EmptySubshareSet);
    }

    let mut dealers = HashSet::with_capacity(bundles.len());
    let mut rows = Vec::with_capacity(bundles.len());
    for bundle in bundles {
        if !dealers.insert(bundle.dealer) {
            return Err(Error::DuplicateDealer {
                dealer: bundle.dealer.value(),
            });
        }
        let row = bundle.row_for(entry.x)?;
        if row.values.len() != entry.len() {
            return Err(Error::LengthMismatch {
                expected: entry.len(),
                found: row.values.len(),
            });
        }
        rows.push(row);
    }

    let mut received = Vec::with_capacity(rows.len());
    let mut ys = Vec::with_capacity(entry.len());
    for (i, &y) in entry.ys.iter().enumerate() {
        received.clear();
        received.extend(rows.iter().map(|row| Gf256::new(row.values[i])));
        let share = combine_new_share(Share::new(entry.x, Gf256::new(y)), &received)?;
        ys.push(share.y.value());
    }

    Ok(ShareEntry::new(entry.x, ys))
}

/// Runs one complete renewal epoch over `entries`, every entry acting as a dealer.
///
/// Either every entry is refreshed or, on error, none is.
///
/// # Arguments
///
/// * `entries` - Every player's share entry, updated in place.
/// * `k` - The reconstruction threshold.
///
/// # Errors
///
/// * [`Error::InvalidThreshold`] if `k` is zero or `entries` is empty.
/// * [`Error::TooFewPlayers`] if there are fewer entries than `k`.
/// * [`Error::LengthMismatch`] if the entries cover different numbers of bytes.
///
/// # Examples
///
/// ```rust
/// use reshard::renewal::refresh_shares;
/// use reshard::sss::{combine_shares, split_secret};
///
/// let mut entries = split_secret(b"rotate me", 3, 5).unwrap();
/// refresh_shares(&mut entries, 3).unwrap();
/// assert_eq!(combine_shares(&entries[..3], 3).unwrap(), b"rotate me");
/// ```
pub fn refresh_shares(entries: &mut [ShareEntry], k: u8) -> Result<(), Error> {
    refresh_shares_with_rng(entries, k, &mut rand::thread_rng())
}

/// Same as [`refresh_shares`] with an explicit randomness source, drawing every dealer's masks
/// from `rng`.
pub fn refresh_shares_with_rng<R>(entries: &mut [ShareEntry], k: u8, rng: &mut R) -> Result<(), Error>
where
    R: Rng + CryptoRng,
{
    if k == 0 || entries.is_empty() {
        return Err(Error::InvalidThreshold);
    }

    let xs: Vec<Gf256> = entries.iter().map(|e| e.x).collect();

    let bundles = entries
        .iter()
        .map(|dealer| deal_subshares_with_rng(dealer, &xs, k, rng))
        .collect::<Result<Vec<_>, _>>()?;

    let refreshed = entries
        .iter()
        .map(|entry| apply_subshares(entry, &bundles))
        .collect::<Result<Vec<_>, _>>()?;

    for (entry, new_entry) in entries.iter_mut().zip(refreshed) {
        *entry = new_entry;
    }

    Ok(())
}
