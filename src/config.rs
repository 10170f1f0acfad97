use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::{DEFAULT_SHARES, DEFAULT_THRESHOLD, SHARE_FILE_PREFIX};

/// Defaults for the command line tool, read from `conf.toml` and `RESHARD_*` variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshardConfig {
    /// Directory where `split` writes share files.
    pub share_dir: PathBuf,
    pub file_prefix: String,
    pub threshold: u8,
    pub shares: u8,
}

impl Default for ReshardConfig {
    fn default() -> Self {
        ReshardConfig {
            share_dir: PathBuf::from("."),
            file_prefix: SHARE_FILE_PREFIX.to_string(),
            threshold: DEFAULT_THRESHOLD,
            shares: DEFAULT_SHARES,
        }
    }
}

impl ReshardConfig {
    /// Loads `dir/conf.toml`, writing one with default values first if it is missing.
    ///
    /// Environment variables such as `RESHARD_THRESHOLD=4` override the file.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let foreign = |err: std::io::Error| ConfigError::Foreign(Box::new(err));

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(foreign)?;
        }

        let conf_file = dir.join("conf.toml");
        if !conf_file.exists() {
            let toml = toml::to_string_pretty(&ReshardConfig::default())
                .map_err(|err| ConfigError::Foreign(Box::new(err)))?;
            fs::write(&conf_file, toml).map_err(foreign)?;
        }

        debug!("📝 Loading config from {:?}", conf_file);
        let settings = Config::builder()
            .add_source(File::from(conf_file))
            .add_source(Environment::with_prefix("RESHARD").try_parsing(true))
            .build()?;

        settings.try_deserialize()
    }
}
