//! # ca-cli
//!
//! Command-line interface for the conditional access compliance audit.
//!
//! - `ca-audit check` — audit a policy export against the baseline
//! - `ca-audit baseline` — validate a baseline and list its requirements
//!
//! Policy retrieval is not part of this tool: export the tenant's
//! conditional access policies to JSON first, then point `--policies` at
//! the file.

mod commands;
mod config;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{AuditConfig, DEFAULT_CONFIG_FILE};

/// Audit conditional access policies against a compliance baseline.
#[derive(Parser)]
#[command(name = "ca-audit", version, about)]
struct Cli {
    /// Config file (defaults to ./ca-audit.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a policy export against the baseline.
    Check(commands::check::CheckArgs),
    /// Validate a baseline and list its requirements.
    Baseline {
        /// Baseline YAML (defaults to policy_requirements.yaml).
        #[arg(long)]
        requirements: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ca_policy=info".parse()?)
                .add_directive("ca_audit=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AuditConfig::load(path)?,
        None => AuditConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };

    match &cli.command {
        Commands::Check(args) => commands::check::execute(args, &config),
        Commands::Baseline { requirements } => {
            commands::baseline::execute(requirements.as_deref(), &config)
        }
    }
}
