//! Error types for kvsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from kvsync-core
    #[error(transparent)]
    Core(#[from] kvsync_core::Error),

    /// Error from kvsync-fs
    #[error(transparent)]
    Fs(#[from] kvsync_fs::Error),

    /// Error from kvsync-store
    #[error(transparent)]
    Store(#[from] kvsync_store::StoreError),

    /// Report serialization failed
    #[error("Failed to render report as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
