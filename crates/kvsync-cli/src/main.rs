//! kvsync CLI
//!
//! Mirrors a local directory and a Consul KV prefix, one way (`fetch`) or
//! both ways (`sync`).

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::{FileConfig, Overrides, Settings};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let mut overrides = Overrides {
        address: cli.address,
        token: cli.token,
        timeout_secs: cli.timeout,
        cas_try: None,
    };

    match cli.command {
        Commands::Fetch { target, dry_run } => {
            let settings = Settings::resolve(file, overrides)?;
            commands::run_fetch(&settings, &target, dry_run, cli.json)
        }
        Commands::Sync {
            target,
            cas_try,
            dry_run,
        } => {
            overrides.cas_try = cas_try;
            let settings = Settings::resolve(file, overrides)?;
            commands::run_sync(&settings, &target, dry_run, cli.json)
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings only, or debug with
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}
