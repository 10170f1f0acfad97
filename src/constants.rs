/// Number of elements in GF(2^8).
pub const FIELD_ORDER: usize = 256;

/// x^8 + x^4 + x^3 + x^2 + 1
pub const IRREDUCIBLE_POLYNOMIAL: u16 = 0x11D;

/// Generator of the multiplicative group used to build the Exp/Log tables.
pub const GENERATOR: u8 = 0x02;

/// Share files are named `{prefix}{x}.{extension}`, e.g. `output3.share`.
pub const SHARE_FILE_PREFIX: &str = "output";
pub const SHARE_FILE_EXTENSION: &str = "share";

pub const DEFAULT_CONFIG_DIR: &str = ".reshard";
pub const DEFAULT_THRESHOLD: u8 = 3;
pub const DEFAULT_SHARES: u8 = 5;
