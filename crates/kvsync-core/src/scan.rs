//! Store enumeration shared by fetch and sync

use kvsync_store::{KvStore, StoreEntry};

use crate::{Error, Mapping, Result};

/// Content entries under the mapping's prefix, in store order.
///
/// Directory markers are dropped here and never reach value operations.
pub(crate) fn content_entries<S: KvStore>(store: &S, mapping: &Mapping) -> Result<Vec<StoreEntry>> {
    let prefix = mapping.list_prefix();
    let entries = store
        .list(&prefix)
        .map_err(Error::store("list", &prefix))?;

    let total = entries.len();
    let content: Vec<StoreEntry> = entries
        .into_iter()
        .filter(|entry| !entry.is_directory_marker())
        .collect();

    tracing::debug!(
        prefix = %prefix,
        total,
        markers = total - content.len(),
        "listed store entries"
    );
    Ok(content)
}
