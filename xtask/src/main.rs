// Tooling crate: unwrap/expect/panic acceptable outside the libraries.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::use_debug)]
#![allow(missing_docs)]

mod check;
mod doc;
mod profile_tools;
mod simulate;
mod test;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Codec power engine development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check, lint and format-check the workspace
    Check,
    /// Run all tests (unit, integration, doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Build and optionally open documentation
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
    },
    /// Resolve a codec's configuration from a profile document and print it as JSON
    Resolve {
        /// Profile document (JSON)
        #[arg(long)]
        profiles: PathBuf,
        #[command(flatten)]
        codec: profile_tools::CodecArgs,
        /// Role whose override to apply: engine, power-hook, probe-init
        #[arg(long, default_value = "engine")]
        role: String,
    },
    /// Validate a profile document and report entries that would be skipped
    Lint {
        /// Profile document (JSON)
        #[arg(long)]
        profiles: PathBuf,
    },
    /// Run probe init and an engine power cycle against a simulated codec
    Simulate {
        /// Profile document (JSON)
        #[arg(long)]
        profiles: PathBuf,
        #[command(flatten)]
        codec: profile_tools::CodecArgs,
        /// EAPD-capable node ids on the simulated codec
        #[arg(long, value_delimiter = ',', value_parser = profile_tools::parse_u8)]
        eapd: Vec<u8>,
        /// Sleep/wake cycles to run after the first activation
        #[arg(long, default_value_t = 1)]
        cycles: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Doc { open } => doc::run(open),
        Commands::Resolve {
            profiles,
            codec,
            role,
        } => profile_tools::resolve(&profiles, &codec, &role),
        Commands::Lint { profiles } => profile_tools::lint(&profiles),
        Commands::Simulate {
            profiles,
            codec,
            eapd,
            cycles,
        } => simulate::run(&profiles, &codec, &eapd, cycles),
    }
}
