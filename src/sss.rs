use rand::{CryptoRng, Rng};

use crate::error::Error;
use crate::field::Gf256;
use crate::polynomial::{generate_polynomial_with_rng, Polynomial};
use crate::share::{Share, ShareEntry};

/// Validates a `(k, n)` pair for dealing shares.
fn check_parameters(k: u8, n: u8) -> Result<(), Error> {
    if k == 0 || n == 0 {
        return Err(Error::InvalidThreshold);
    }
    if k > n {
        return Err(Error::ThresholdExceedsShareCount {
            threshold: k,
            shares: n,
        });
    }
    Ok(())
}

/// Splits a single secret byte into `n` shares, any `k` of which recover it.
///
/// # Arguments
///
/// * `k` - The number of shares needed to recover the secret.
/// * `n` - The number of shares to produce, at x-coordinates `1..=n`.
/// * `secret` - The field element to share.
///
/// # Returns
///
/// `n` shares ordered by x-coordinate.
///
/// # Examples
/// ```rust
/// use reshard::field::Gf256;
/// use reshard::sss::{generate_shares, reconstruct};
///
/// let shares = generate_shares(3, 5, Gf256::new(17)).unwrap();
/// assert_eq!(shares.len(), 5);
/// assert_eq!(reconstruct(&shares[2..], 3).unwrap(), Gf256::new(17));
/// ```
pub fn generate_shares(k: u8, n: u8, secret: Gf256) -> Result<Vec<Share>, Error> {
    generate_shares_with_rng(k, n, secret, &mut rand::thread_rng())
}

/// Same as [`generate_shares`] with an explicit randomness source.
///
/// # Errors
///
/// * [`Error::InvalidThreshold`] if `k` or `n` is zero.
/// * [`Error::ThresholdExceedsShareCount`] if `k > n`.
pub fn generate_shares_with_rng<R>(
    k: u8,
    n: u8,
    secret: Gf256,
    rng: &mut R,
) -> Result<Vec<Share>, Error>
where
    R: Rng + CryptoRng,
{
    check_parameters(k, n)?;
    let poly = generate_polynomial_with_rng(k, secret, rng)?;
    Ok(shares_from_polynomial(&poly, n))
}

/// Evaluates `poly` at `x = 1..=n`.
///
/// # Examples
/// ```rust
/// use reshard::field::Gf256;
/// use reshard::polynomial::Polynomial;
/// use reshard::sss::shares_from_polynomial;
///
/// let poly = Polynomial::new(vec![Gf256::new(17), Gf256::new(3), Gf256::new(5)]);
/// let shares = shares_from_polynomial(&poly, 2);
/// assert_eq!(shares[0].y, Gf256::new(23));
/// ```
pub fn shares_from_polynomial(poly: &Polynomial, n: u8) -> Vec<Share> {
    (1..=n)
        .map(|i| {
            let x = Gf256::new(i);
            Share::new(x, poly.evaluate(x))
        })
        .collect()
}

/// Recovers the secret from the first `k` entries of `shares` by Lagrange interpolation at
/// `x = 0`.
///
/// Shares beyond the first `k` are ignored. x-coordinates are not checked for distinctness;
/// a repeated one surfaces as [`Error::DivisionByZero`].
///
/// # Errors
///
/// * [`Error::InvalidThreshold`] if `k` is zero.
/// * [`Error::InsufficientShares`] if fewer than `k` shares are supplied.
/// * [`Error::DivisionByZero`] if two of the used shares share an x-coordinate.
pub fn reconstruct(shares: &[Share], k: u8) -> Result<Gf256, Error> {
    if k == 0 {
        return Err(Error::InvalidThreshold);
    }
    if shares.len() < k as usize {
        return Err(Error::InsufficientShares {
            threshold: k,
            supplied: shares.len(),
        });
    }

    let points = &shares[..k as usize];
    let mut secret = Gf256::ZERO;

    for (i, a) in points.iter().enumerate() {
        let mut term = a.y;
        for (j, b) in points.iter().enumerate() {
            if i != j {
                term = term.mul(b.x.div(b.x.sub(a.x))?);
            }
        }
        secret = secret.add(term);
    }

    Ok(secret)
}

/// Splits a byte string into `n` share entries with x-coordinates `1..=n`.
///
/// Each byte is shared independently with a fresh polynomial; entry `i` holds the `i`-th
/// player's y-value for every byte.
///
/// # Arguments
///
/// * `secret` - The bytes to share. May be empty.
/// * `k` - The reconstruction threshold.
/// * `n` - The number of entries to produce.
///
/// # Errors
///
/// * [`Error::InvalidThreshold`] if `k` or `n` is zero.
/// * [`Error::ThresholdExceedsShareCount`] if `k > n`.
///
/// # Examples
/// ```rust
/// use reshard::sss::{combine_shares, split_secret};
///
/// let entries = split_secret(b"hello world", 3, 5).unwrap();
/// assert_eq!(combine_shares(&entries[1..4], 3).unwrap(), b"hello world");
/// ```
pub fn split_secret(secret: &[u8], k: u8, n: u8) -> Result<Vec<ShareEntry>, Error> {
    split_secret_with_rng(secret, k, n, &mut rand::thread_rng())
}

/// Same as [`split_secret`] with an explicit randomness source.
///
/// Every byte's polynomial is drawn from `rng`, so a seeded generator gives reproducible entries.
///
/// # Examples
/// ```rust
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
/// use reshard::sss::split_secret_with_rng;
///
/// let a = split_secret_with_rng(b"seeded", 2, 3, &mut ChaCha20Rng::seed_from_u64(7)).unwrap();
/// let b = split_secret_with_rng(b"seeded", 2, 3, &mut ChaCha20Rng::seed_from_u64(7)).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn split_secret_with_rng<R>(
    secret: &[u8],
    k: u8,
    n: u8,
    rng: &mut R,
) -> Result<Vec<ShareEntry>, Error>
where
    R: Rng + CryptoRng,
{
    check_parameters(k, n)?;

    let mut entries: Vec<ShareEntry> = (1..=n)
        .map(|i| ShareEntry::new(Gf256::new(i), Vec::with_capacity(secret.len())))
        .collect();

    for &byte in secret {
        let shares = generate_shares_with_rng(k, n, Gf256::new(byte), rng)?;
        for (entry, share) in entries.iter_mut().zip(shares) {
            entry.ys.push(share.y.value());
        }
    }

    Ok(entries)
}

/// Rebuilds a byte string from the first `k` share entries.
///
/// # Arguments
///
/// * `entries` - Share entries from distinct players, all for the same secret and epoch.
/// * `k` - The reconstruction threshold the secret was split with.
///
/// # Returns
///
/// The secret bytes. A wrong `k` or entries from mixed epochs produce garbage, not an error.
///
/// # Errors
///
/// Same as [`reconstruct`], plus [`Error::LengthMismatch`] when the used entries cover a
/// different number of bytes.
pub fn combine_shares(entries: &[ShareEntry], k: u8) -> Result<Vec<u8>, Error> {
    if k == 0 {
        return Err(Error::InvalidThreshold);
    }
    if entries.len() < k as usize {
        return Err(Error::InsufficientShares {
            threshold: k,
            supplied: entries.len(),
        });
    }

    let used = &entries[..k as usize];
    let secret_length = used[0].len();
    if let Some(bad) = used.iter().find(|e| e.len() != secret_length) {
        return Err(Error::LengthMismatch {
            expected: secret_length,
            found: bad.len(),
        });
    }

    let mut points = Vec::with_capacity(used.len());
    let mut secret = Vec::with_capacity(secret_length);
    for i in 0..secret_length {
        points.clear();
        points.extend(used.iter().map(|e| Share::new(e.x, Gf256::new(e.ys[i]))));
        secret.push(reconstruct(&points, k)?.value());
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::IteratorRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_generate_and_reconstruct() {
        for secret in 0..=255u8 {
            let shares = generate_shares(3, 5, Gf256::new(secret)).unwrap();
            assert_eq!(reconstruct(&shares, 3).unwrap(), Gf256::new(secret));
        }
    }

    #[test]
    fn test_share_coordinates() {
        let shares = generate_shares(2, 7, Gf256::new(1)).unwrap();
        let xs: Vec<u8> = shares.iter().map(|s| s.x.value()).collect();
        assert_eq!(xs, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_threshold_of_one() {
        let shares = generate_shares(1, 4, Gf256::new(99)).unwrap();
        assert!(shares.iter().all(|s| s.y == Gf256::new(99)));
        assert_eq!(reconstruct(&shares[3..], 1).unwrap(), Gf256::new(99));
    }

    #[test]
    fn test_fixed_polynomial_scenario() {
        let poly = Polynomial::new(vec![Gf256::new(17), Gf256::new(3), Gf256::new(5)]);
        let shares = shares_from_polynomial(&poly, 5);
        assert_eq!(shares[0], Share::new(Gf256::new(1), Gf256::new(23)));
        assert_eq!(shares[1], Share::new(Gf256::new(2), Gf256::new(3)));

        let first = [shares[0], shares[2], shares[4]];
        let second = [shares[1], shares[3], shares[4]];
        assert_eq!(reconstruct(&first, 3).unwrap(), Gf256::new(17));
        assert_eq!(reconstruct(&second, 3).unwrap(), Gf256::new(17));
    }

    #[test]
    fn test_invalid_parameters() {
        let secret = Gf256::new(9);
        assert_eq!(generate_shares(0, 5, secret), Err(Error::InvalidThreshold));
        assert_eq!(generate_shares(3, 0, secret), Err(Error::InvalidThreshold));
        assert_eq!(
            generate_shares(6, 5, secret),
            Err(Error::ThresholdExceedsShareCount {
                threshold: 6,
                shares: 5
            })
        );
    }

    #[test]
    fn test_reconstruct_failures() {
        let shares = generate_shares(3, 5, Gf256::new(9)).unwrap();
        assert_eq!(reconstruct(&shares, 0), Err(Error::InvalidThreshold));
        assert_eq!(
            reconstruct(&shares[..2], 3),
            Err(Error::InsufficientShares {
                threshold: 3,
                supplied: 2
            })
        );
        assert_eq!(
            reconstruct(&[], 1),
            Err(Error::InsufficientShares {
                threshold: 1,
                supplied: 0
            })
        );

        let duplicated = [shares[0], shares[1], shares[0]];
        assert_eq!(reconstruct(&duplicated, 3), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_below_threshold_is_not_the_secret_interpolation() {
        // k - 1 shares interpolate a lower degree polynomial, not the dealt one
        let poly = Polynomial::new(vec![Gf256::new(17), Gf256::new(3), Gf256::new(5)]);
        let shares = shares_from_polynomial(&poly, 5);
        assert_ne!(reconstruct(&shares, 2).unwrap(), Gf256::new(17));
    }

    #[test]
    fn test_split_and_combine_secret() {
        let secret = "test secret";
        let shares = split_secret(secret.as_bytes(), 3, 5).unwrap();
        assert_eq!(shares.len(), 5);
        assert!(shares.iter().all(|e| e.len() == secret.len()));

        let recovered = combine_shares(&shares, 3).unwrap();
        assert_eq!(secret.as_bytes(), recovered.as_slice());
    }

    #[test]
    fn test_share_subset_combination() {
        let secret = b"subset test";
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let shares = split_secret_with_rng(secret, 4, 9, &mut rng).unwrap();

        for _ in 0..20 {
            let subset: Vec<ShareEntry> = shares.iter().cloned().choose_multiple(&mut rng, 4);
            assert_eq!(combine_shares(&subset, 4).unwrap(), secret);
        }
    }

    #[test]
    fn test_split_empty_secret() {
        let shares = split_secret(b"", 2, 3).unwrap();
        assert_eq!(shares.len(), 3);
        assert!(shares.iter().all(ShareEntry::is_empty));
        assert_eq!(combine_shares(&shares, 2).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_combine_length_mismatch() {
        let mut shares = split_secret(b"length", 2, 3).unwrap();
        shares[1].ys.pop();
        assert_eq!(
            combine_shares(&shares, 2),
            Err(Error::LengthMismatch {
                expected: 6,
                found: 5
            })
        );
    }

    #[test]
    fn test_combine_with_too_few_entries() {
        let shares = split_secret(b"Remember what the dormouse said.", 12, 30).unwrap();
        assert!(matches!(
            combine_shares(&shares[..11], 12),
            Err(Error::InsufficientShares { .. })
        ));
    }
}
