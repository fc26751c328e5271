//! Summaries returned by fetch and sync

use serde::Serialize;

/// One store entry written to disk by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedFile {
    pub key: String,
    pub path: String,
}

/// Result of a completed fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    /// Nothing was written to disk
    pub dry_run: bool,
    /// Entries in store listing order
    pub fetched: Vec<FetchedFile>,
}

/// Result of a completed sync, keys grouped by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Nothing was written to or deleted from the store
    pub dry_run: bool,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub deleted: Vec<String>,
    pub retained: Vec<String>,
}

impl SyncReport {
    /// Number of keys created, updated, or deleted.
    pub fn changes(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    /// Whether store and local tree already agreed.
    pub fn is_noop(&self) -> bool {
        self.changes() == 0
    }
}
