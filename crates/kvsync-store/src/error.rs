//! Error types for kvsync-store

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while talking to a key-value store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The configured address cannot be turned into a base URL
    #[error("Invalid store address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("Failed to create store client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The request never produced a response
    #[error("{op} {key} failed: {source}")]
    Transport {
        op: &'static str,
        key: String,
        #[source]
        source: reqwest::Error,
    },

    /// The store answered with an unexpected status
    #[error("{op} {key} returned HTTP {status}: {body}")]
    Status {
        op: &'static str,
        key: String,
        status: u16,
        body: String,
    },

    /// The response body could not be understood
    #[error("Failed to decode {op} response for {key}: {message}")]
    Decode {
        op: &'static str,
        key: String,
        message: String,
    },

    /// An unconditional write was refused
    #[error("Store refused to write {key}")]
    Rejected { key: String },

    /// A key written a moment ago could not be read back
    #[error("Key {key} vanished right after it was written")]
    Vanished { key: String },
}
