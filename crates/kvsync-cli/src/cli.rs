//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// kvsync - Mirror a local directory and a Consul KV prefix
#[derive(Parser, Debug)]
#[command(name = "kvsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the run report as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Consul agent address (host:port or http(s) URL)
    #[arg(long, global = true, env = "CONSUL_HTTP_ADDR", value_name = "ADDR")]
    pub address: Option<String>,

    /// ACL token sent with every request
    #[arg(
        long,
        global = true,
        env = "CONSUL_HTTP_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Settings file (.toml or .json)
    #[arg(long, global = true, env = "KVSYNC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write every key under the store prefix into the local directory
    ///
    /// Existing local files are overwritten. Local files with no key are
    /// left alone.
    Fetch {
        #[command(flatten)]
        target: Target,

        /// Report what would be written without touching disk
        #[arg(long)]
        dry_run: bool,
    },

    /// Push the local directory into the store and delete orphaned keys
    ///
    /// Every regular file is written with compare-and-swap. Keys under the
    /// prefix whose local file is gone are deleted afterwards.
    Sync {
        #[command(flatten)]
        target: Target,

        /// Conditional attempts per key before giving up
        #[arg(long, env = "KVSYNC_CAS_TRY", value_name = "N",
              value_parser = clap::value_parser!(u32).range(1..))]
        cas_try: Option<u32>,

        /// Preview changes without writing to the store
        #[arg(long)]
        dry_run: bool,
    },
}

/// Which directory pairs with which prefix.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Local directory to mirror
    #[arg(long, value_name = "DIR")]
    pub local_path: PathBuf,

    /// Store key prefix, empty for the store root
    #[arg(long, value_name = "KEY", default_value = "")]
    pub store_path: String,
}
