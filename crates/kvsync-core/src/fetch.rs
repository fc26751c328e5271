//! One-way mirror from the store onto the local tree

use std::sync::Arc;

use kvsync_fs::io;
use kvsync_store::{ConsulStore, KvStore, StoreConfig};

use crate::event::{EventKind, SyncEvent, SyncObserver, TracingObserver};
use crate::report::{FetchReport, FetchedFile};
use crate::{Error, Mapping, Result, scan};

/// Writes every content entry under the store prefix to its local path.
///
/// Existing files are overwritten unconditionally and local files without
/// a store counterpart are left alone. The store is never modified.
pub struct Fetcher<S> {
    store: S,
    mapping: Mapping,
    dry_run: bool,
    observer: Arc<dyn SyncObserver>,
}

impl Fetcher<ConsulStore> {
    /// Create a fetcher talking to the Consul agent described by `config`.
    pub fn connect(config: &StoreConfig, mapping: Mapping) -> Result<Self> {
        let store = ConsulStore::new(config).map_err(Error::Connect)?;
        Ok(Self::new(store, mapping))
    }
}

impl<S: KvStore> Fetcher<S> {
    pub fn new(store: S, mapping: Mapping) -> Self {
        Self {
            store,
            mapping,
            dry_run: false,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Report what would be written without touching the disk.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Mirror the store prefix onto the local root.
    ///
    /// Stops at the first entry that cannot be mapped or written; files
    /// written before that point stay on disk.
    pub fn fetch(&self) -> Result<FetchReport> {
        let mut report = FetchReport {
            dry_run: self.dry_run,
            ..FetchReport::default()
        };

        for entry in scan::content_entries(&self.store, &self.mapping)? {
            let path = self.mapping.to_local_path(&entry.key)?;

            let detail = if self.dry_run {
                format!("dry-run, would write {path}")
            } else {
                io::write_atomic(&path, &entry.value).map_err(Error::local("write", &path))?;
                path.to_string()
            };

            self.observer
                .on_event(&SyncEvent::new(EventKind::Fetched, entry.key.as_str(), detail));
            report.fetched.push(FetchedFile {
                key: entry.key,
                path: path.to_string(),
            });
        }

        Ok(report)
    }
}
