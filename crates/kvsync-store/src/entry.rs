//! Store entries and their versions

use serde::{Deserialize, Serialize};

/// Per-key version token.
///
/// Grows monotonically with every write to a key. Only meaningful when
/// handed back to the store in a conditional write or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifyIndex(pub u64);

impl std::fmt::Display for ModifyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single key, its raw value, and the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub version: ModifyIndex,
}

impl StoreEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>, version: ModifyIndex) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            version,
        }
    }

    /// Keys ending in a separator are empty-directory placeholders, not content.
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}
