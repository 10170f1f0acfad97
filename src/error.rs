use thiserror::Error;

/// Failures raised by the sharing, reconstruction and renewal operations.
///
/// All of them are usage errors: nothing is retried and no partially computed share is ever
/// returned alongside an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The threshold or the number of shares is zero.
    #[error("threshold and share count must be non-zero")]
    InvalidThreshold,

    #[error("threshold {threshold} exceeds share count {shares}")]
    ThresholdExceedsShareCount { threshold: u8, shares: u8 },

    /// Fewer player abscissas than the threshold were supplied for renewal.
    #[error("{players} players cannot renew shares with threshold {threshold}")]
    TooFewPlayers { threshold: u8, players: usize },

    #[error("{supplied} shares supplied, {threshold} required")]
    InsufficientShares { threshold: u8, supplied: usize },

    /// A field division hit a zero divisor, usually two shares with the same x-coordinate.
    #[error("division by zero in GF(2^8)")]
    DivisionByZero,

    #[error("no subshares supplied")]
    EmptySubshareSet,

    #[error("share length mismatch: expected {expected} bytes, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("bundle from dealer {dealer} has no subshare for player {recipient}")]
    MissingSubshare { dealer: u8, recipient: u8 },

    /// The same dealer's masks were supplied twice in one renewal.
    #[error("more than one bundle from dealer {dealer}")]
    DuplicateDealer { dealer: u8 },

    #[error("bundle from dealer {dealer} has more than one subshare row for player {recipient}")]
    DuplicateRecipient { dealer: u8, recipient: u8 },

    #[error("malformed share: {0}")]
    MalformedShare(String),

    /// x = 0 would hold the secret itself.
    #[error("share x-coordinate must be non-zero")]
    ZeroAbscissa,
}
