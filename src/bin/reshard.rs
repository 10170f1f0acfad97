use clap::{crate_version, Parser};

use serde_json::json;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use reshard::config::ReshardConfig;
use reshard::constants::DEFAULT_CONFIG_DIR;
use reshard::field::build_field_tables;
use reshard::renewal::{
    apply_subshares, deal_subshares, player_abscissas, refresh_shares, SubshareBundle,
};
use reshard::repository::{FileShareStore, ShareStore};
use reshard::share::ShareEntry;
use reshard::sss::{combine_shares, split_secret};

#[derive(Debug, Parser)]
#[command(name = "reshard")]
#[command(version = crate_version!())]
#[command(
    about = "RESHARD - threshold secret sharing with proactive share renewal",
    long_about = "reshard splits a file into share files, any threshold of which rebuild it, using Shamir's Secret Sharing over GF(2^8). Share files can be renewed without changing the secret: every player deals a bundle of subshares to the others and applies the bundles it receives, or a whole epoch can be run locally with the refresh command. Each share file holds the player's x-coordinate in its first byte followed by one share byte per secret byte."
)]
enum CliArgument {
    /// Split a secret file into share files.
    Split {
        /// File holding the secret.
        #[clap(long, short)]
        secret_file: PathBuf,

        /// Share threshold, defaults to the configured value.
        #[clap(long, short)]
        threshold: Option<u8>,

        /// Number of shares to generate, defaults to the configured value.
        #[clap(long, short = 'n')]
        shares: Option<u8>,

        /// Output directory, defaults to the configured share directory.
        #[clap(long, short)]
        out_dir: Option<PathBuf>,

        /// Verbose mode displays the shares
        #[clap(long, short)]
        verbose: bool,
    },
    /// Combine share files to rebuild a secret.
    Combine {
        /// Share threshold. The first `threshold` files are used.
        #[clap(long, short)]
        threshold: u8,

        /// Write the secret to this file instead of printing it as hex.
        #[clap(long, short)]
        output: Option<PathBuf>,

        /// Share files.
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Deal one player's renewal subshares to every player.
    Deal {
        /// The dealing player's share file.
        #[clap(long, short)]
        share: PathBuf,

        /// Share threshold.
        #[clap(long, short)]
        threshold: u8,

        /// Where to write the CBOR subshare bundle.
        #[clap(long, short)]
        out: PathBuf,

        /// x-coordinates of all players receiving subshares, e.g. `--players 1,2,3,4,5`.
        #[clap(long, short, value_delimiter = ',', required = true)]
        players: Vec<u8>,
    },
    /// Apply received subshare bundles to a player's share file.
    Apply {
        /// The receiving player's share file, updated in place.
        #[clap(long, short)]
        share: PathBuf,

        /// Bundles from every dealer, including the player itself.
        #[clap(required = true)]
        bundles: Vec<PathBuf>,
    },
    /// Run a full renewal epoch over local share files, updating them in place.
    Refresh {
        /// Share threshold.
        #[clap(long, short)]
        threshold: u8,

        /// Share files of all players.
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a JSON summary of a share file.
    Inspect {
        file: PathBuf,
    },
    /// Print the Exp/Log tables of the field.
    Tables,
}

#[derive(Parser, Debug)]
#[clap(name = "reshard")]
struct Opt {
    /// Configuration directory holding conf.toml.
    #[clap(long, short, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Subcommand to run.
    #[clap(subcommand)]
    argument: CliArgument,
}

fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let opt = Opt::parse();
    let config = ReshardConfig::load(&opt.config_dir)?;
    debug!("Using config: {:?}", config);

    match opt.argument {
        CliArgument::Split {
            secret_file,
            threshold,
            shares,
            out_dir,
            verbose,
        } => {
            let threshold = threshold.unwrap_or(config.threshold);
            let shares = shares.unwrap_or(config.shares);
            let out_dir = out_dir.unwrap_or(config.share_dir);

            let secret = fs::read(&secret_file)?;
            info!("Splitting {} bytes into {} shares", secret.len(), shares);
            let entries = split_secret(&secret, threshold, shares)?;

            let store = FileShareStore::open(&out_dir, &config.file_prefix)?;
            for entry in &entries {
                store.put(entry)?;
            }

            if verbose {
                println!("🐛 shares: ");
                for entry in &entries {
                    println!("  {}", hex::encode(entry.to_bytes()));
                }
            }

            println!("✂️  Secret has been split into share files.");
            println!("    directory: {:?}", store.dir());
            println!("    threshold: {}", threshold);
            println!("    shares: {}", shares);
            println!("    sha256: {}", fingerprint(&secret));
        }

        CliArgument::Combine {
            threshold,
            output,
            files,
        } => {
            let entries = read_entries(&files)?;
            let secret = combine_shares(&entries, threshold)?;
            debug!("Combined {} shares", threshold);

            match output {
                Some(path) => {
                    fs::write(&path, &secret)?;
                    println!("🔑 secret written to {:?}", path);
                }
                None => println!("🔑 secret: {}", hex::encode(&secret)),
            }
            println!("    sha256: {}", fingerprint(&secret));
        }

        CliArgument::Deal {
            share,
            threshold,
            out,
            players,
        } => {
            let dealer = FileShareStore::read_file(&share)?;
            let mut xs = player_abscissas(&players)?;
            if let Err(pos) = xs.binary_search(&dealer.x) {
                xs.insert(pos, dealer.x);
            }

            let bundle = deal_subshares(&dealer, &xs, threshold)?;
            fs::write(&out, bundle.to_cbor()?)?;
            println!(
                "📦 Dealt subshares from player {} to {} players: {:?}",
                dealer.x,
                xs.len(),
                out
            );
        }

        CliArgument::Apply { share, bundles } => {
            let entry = FileShareStore::read_file(&share)?;
            let bundles = bundles
                .iter()
                .map(|path| -> Result<SubshareBundle, Box<dyn Error>> {
                    Ok(SubshareBundle::from_cbor(&fs::read(path)?)?)
                })
                .collect::<Result<Vec<_>, _>>()?;

            let renewed = apply_subshares(&entry, &bundles)?;
            let x = renewed.x;
            FileShareStore::write_files(&[(share.clone(), renewed)])?;
            println!(
                "🔄 Applied {} bundles to share {}: {:?}",
                bundles.len(),
                x,
                share
            );
        }

        CliArgument::Refresh { threshold, files } => {
            let mut entries = read_entries(&files)?;
            refresh_shares(&mut entries, threshold)?;
            let count = entries.len();
            let updates: Vec<(PathBuf, ShareEntry)> = files.into_iter().zip(entries).collect();
            FileShareStore::write_files(&updates)?;
            println!("🔄 Refreshed {} shares", count);
        }

        CliArgument::Inspect { file } => {
            let entry = FileShareStore::read_file(&file)?;
            let summary = json!({
                "file": file,
                "x": entry.x,
                "bytes": entry.len(),
                "ys": hex::encode(&entry.ys),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        CliArgument::Tables => {
            let (exp, log) = build_field_tables();
            println!("Exp:");
            print_table(&exp);
            println!("Log:");
            print_table(&log);
        }
    }

    Ok(())
}

fn read_entries(paths: &[PathBuf]) -> Result<Vec<ShareEntry>, Box<dyn Error>> {
    paths
        .iter()
        .map(|path| FileShareStore::read_file(path).map_err(Into::into))
        .collect()
}

fn fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn print_table(table: &[u8]) {
    for row in table.chunks(16) {
        println!("  {}", hex::encode(row));
    }
}
