//! Error types for kvsync-core

use kvsync_fs::NormalizedPath;
use kvsync_store::StoreError;

/// Result type for kvsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching or syncing
///
/// Every variant names the key or path involved. Nothing is recovered
/// locally; the first error ends the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The retry budget must allow at least one attempt
    #[error("CAS retry budget must be at least 1, got {0}")]
    InvalidCasTry(u32),

    /// The store client could not be constructed
    #[error("Failed to create store client")]
    Connect(#[source] StoreError),

    /// A store call failed at the transport or protocol level
    #[error("Failed to {op} key '{key}'")]
    Store {
        op: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },

    /// Optimistic write or delete lost every race it was allowed
    #[error("Failed to {op} '{key}' after {attempts} tries")]
    CasExhausted {
        op: &'static str,
        key: String,
        attempts: u32,
    },

    /// Local filesystem failure
    #[error("Failed to {action} local path {path}")]
    Local {
        action: &'static str,
        path: NormalizedPath,
        #[source]
        source: kvsync_fs::Error,
    },

    /// A local path handed to the mapping lives outside the local root
    #[error("{path} is outside the local root {root}")]
    OutsideRoot {
        path: NormalizedPath,
        root: NormalizedPath,
    },

    /// A store key handed to the mapping lives outside the prefix
    #[error("Key '{key}' is outside the store prefix '{prefix}'")]
    OutsidePrefix { key: String, prefix: String },

    /// A key whose segments would resolve outside the local root
    #[error("Refusing key '{key}': segment '{segment}' would escape the local root")]
    UnsafeKey { key: String, segment: String },
}

impl Error {
    pub(crate) fn store(op: &'static str, key: &str) -> impl FnOnce(StoreError) -> Self {
        let key = key.to_string();
        move |source| Self::Store { op, key, source }
    }

    pub(crate) fn local(
        action: &'static str,
        path: &NormalizedPath,
    ) -> impl FnOnce(kvsync_fs::Error) -> Self {
        let path = path.clone();
        move |source| Self::Local {
            action,
            path,
            source,
        }
    }
}
