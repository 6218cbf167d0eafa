//! donation-proof
//!
//! Builds charity trees from a JSON export of donations and issues or checks
//! inclusion proofs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use donation_merkle::{
    Blake2sHasher, Blake3Hasher, Donation, HashFamily, InMemoryDonations, InclusionService,
    MerkleConfig, MerkleHasher, Sha256Hasher, VerifyRequest,
};

/// Merkle inclusion proofs for charity donations
#[derive(Parser)]
#[command(name = "donation-proof")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Tree settings as JSON; missing fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current root of a charity's tree
    Root {
        /// JSON array of donations
        donations: PathBuf,

        /// Charity to summarise (defaults to the first donation's charity)
        #[arg(long)]
        charity: Option<u64>,
    },

    /// Generate an inclusion proof for one donation
    Prove {
        /// JSON array of donations
        donations: PathBuf,

        /// Donation id
        id: u64,
    },

    /// Verify a proof produced by `prove` against the current donations
    Verify {
        /// JSON array of donations
        donations: PathBuf,

        /// Proof JSON (the output of `prove`)
        proof: PathBuf,
    },
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => read_json::<MerkleConfig>(path).context("failed to load config")?,
        None => MerkleConfig::default(),
    };
    debug!(hash = %config.hash, max_leaves = config.max_leaves, "loaded config");

    match config.hash {
        HashFamily::Sha256 => execute::<Sha256Hasher>(cli.command, config),
        HashFamily::Blake2s => execute::<Blake2sHasher>(cli.command, config),
        HashFamily::Blake3 => execute::<Blake3Hasher>(cli.command, config),
    }
}

/// Runs one command; `Ok(false)` means a proof was checked and rejected.
fn execute<H: MerkleHasher>(command: Commands, config: MerkleConfig) -> Result<bool> {
    match command {
        Commands::Root { donations, charity } => {
            let records = load_donations(&donations)?;
            let charity = match charity.or_else(|| records.first().map(|d| d.charity_id)) {
                Some(charity) => charity,
                None => bail!("{} contains no donations", donations.display()),
            };
            let service = service::<H>(records, config)?;
            let summary = service
                .merkle_info(charity)
                .with_context(|| format!("no tree for charity {charity}"))?;
            print_json(&summary)?;
            Ok(true)
        }
        Commands::Prove { donations, id } => {
            let service = service::<H>(load_donations(&donations)?, config)?;
            let response = service
                .generate_proof(id)
                .with_context(|| format!("cannot prove donation {id}"))?;
            print_json(&response)?;
            Ok(true)
        }
        Commands::Verify { donations, proof } => {
            let service = service::<H>(load_donations(&donations)?, config)?;
            let request: VerifyRequest = read_json(&proof).context("failed to load proof")?;
            let report = service
                .verify_inclusion(&request)
                .with_context(|| format!("cannot verify donation {}", request.donation_id))?;
            info!(verified = report.verified, "verification finished");
            print_json(&report)?;
            Ok(report.verified)
        }
    }
}

fn service<H: MerkleHasher>(
    donations: Vec<Donation>,
    config: MerkleConfig,
) -> Result<InclusionService<InMemoryDonations, H>> {
    let store: InMemoryDonations = donations.into_iter().collect();
    InclusionService::with_config(store, config).context("invalid tree configuration")
}

fn load_donations(path: &Path) -> Result<Vec<Donation>> {
    let donations: Vec<Donation> = read_json(path)?;
    info!(count = donations.len(), path = %path.display(), "loaded donations");
    Ok(donations)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
