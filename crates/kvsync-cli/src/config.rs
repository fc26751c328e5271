//! Layered settings for a run
//!
//! Precedence, lowest first: built-in defaults, the `--config` file,
//! environment variables, command-line flags. Clap already folds the
//! environment into the flag values, so only the file layer is merged here.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use kvsync_core::DEFAULT_CAS_TRY;
use kvsync_fs::{ConfigStore, NormalizedPath};
use kvsync_store::StoreConfig;

use crate::error::{CliError, Result};

/// Contents of a settings file. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub address: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub cas_try: Option<u32>,
}

impl FileConfig {
    /// Load a `.toml` or `.json` settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = ConfigStore::new().load(&NormalizedPath::new(path))?;
        tracing::debug!(path = %path.display(), ?config, "loaded settings file");
        Ok(config)
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub address: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
    pub cas_try: Option<u32>,
}

/// Effective settings after layering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store: StoreConfig,
    pub cas_try: u32,
}

impl Settings {
    /// Merge the layers and validate the result.
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let mut store = StoreConfig::default();

        if let Some(address) = overrides.address.or(file.address) {
            store.address = address;
        }
        if let Some(token) = overrides.token.or(file.token) {
            store = store.with_token(token);
        }
        if let Some(secs) = overrides.timeout_secs.or(file.timeout_secs) {
            if secs == 0 {
                return Err(CliError::user("timeout must be at least 1 second"));
            }
            store = store.with_timeout(Duration::from_secs(secs));
        }

        let cas_try = overrides.cas_try.or(file.cas_try).unwrap_or(DEFAULT_CAS_TRY);
        if cas_try == 0 {
            return Err(CliError::user("cas_try must be at least 1"));
        }

        // Fail on a malformed address before any command starts.
        store.base_url()?;

        Ok(Self { store, cas_try })
    }
}
