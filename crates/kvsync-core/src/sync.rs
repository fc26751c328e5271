//! Two-way reconciliation between the local tree and the store
//!
//! A sync runs two phases and both must finish for the run to succeed:
//!
//! 1. **Upsert**: every regular local file is pushed to its key. Absent keys
//!    are created, identical keys are left alone, differing keys are swapped
//!    against the version just read.
//! 2. **Orphans**: every content key under the prefix whose local file is
//!    gone is deleted, starting from the version it was listed at and
//!    re-reading the key after every lost attempt.
//!
//! Conditional writes and deletes that lose to a concurrent writer are
//! retried up to `cas_try` times. Everything else fails the run at once.
//! Nothing is rolled back; re-running converges.

use std::sync::Arc;

use kvsync_fs::io;
use kvsync_store::{ConsulStore, KvStore, StoreConfig, StoreEntry};

use crate::event::{EventKind, SyncEvent, SyncObserver, TracingObserver};
use crate::report::SyncReport;
use crate::{Error, Mapping, Result, scan};

/// Default number of compare-and-swap attempts per key.
pub const DEFAULT_CAS_TRY: u32 = 3;

/// Tunables for a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Conditional attempts per key before giving up (at least 1)
    pub cas_try: u32,
    /// Compute outcomes without writing to or deleting from the store
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            cas_try: DEFAULT_CAS_TRY,
            dry_run: false,
        }
    }
}

impl SyncOptions {
    pub fn validate(&self) -> Result<()> {
        if self.cas_try == 0 {
            return Err(Error::InvalidCasTry(self.cas_try));
        }
        Ok(())
    }
}

/// Final outcome of pushing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upsert {
    Created,
    Updated,
    Unchanged,
}

/// Reconciles a local tree into a store prefix.
pub struct Syncer<S> {
    store: S,
    mapping: Mapping,
    options: SyncOptions,
    observer: Arc<dyn SyncObserver>,
}

impl Syncer<ConsulStore> {
    /// Create a syncer talking to the Consul agent described by `config`.
    pub fn connect(config: &StoreConfig, mapping: Mapping, options: SyncOptions) -> Result<Self> {
        options.validate()?;
        let store = ConsulStore::new(config).map_err(Error::Connect)?;
        Self::new(store, mapping, options)
    }
}

impl<S: KvStore> Syncer<S> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidCasTry`] when `options.cas_try` is zero.
    pub fn new(store: S, mapping: Mapping, options: SyncOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            store,
            mapping,
            options,
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Run both phases.
    pub fn sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport {
            dry_run: self.options.dry_run,
            ..SyncReport::default()
        };

        self.push_local(&mut report)?;
        self.delete_orphans(&mut report)?;

        tracing::debug!(
            prefix = self.mapping.store_prefix(),
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            deleted = report.deleted.len(),
            "sync finished"
        );
        Ok(report)
    }

    fn push_local(&self, report: &mut SyncReport) -> Result<()> {
        let root = self.mapping.local_root();
        let files = io::walk_files(root).map_err(Error::local("walk", root))?;

        for file in files {
            let content = io::read_bytes(&file).map_err(Error::local("read", &file))?;
            let key = self.mapping.to_store_key(&file)?;

            match self.set(&key, &content)? {
                Upsert::Created => report.created.push(key),
                Upsert::Updated => report.updated.push(key),
                Upsert::Unchanged => report.unchanged.push(key),
            }
        }
        Ok(())
    }

    /// Write `value` at `key` unless it is already there.
    ///
    /// Each attempt re-reads the key, so a retry swaps against whatever
    /// the concurrent writer left behind.
    fn set(&self, key: &str, value: &[u8]) -> Result<Upsert> {
        let cas_try = self.options.cas_try;

        for attempt in 1..=cas_try {
            let current = self.store.get(key).map_err(Error::store("read", key))?;

            let Some(current) = current else {
                let detail = if self.options.dry_run {
                    "dry-run".to_string()
                } else {
                    let version = self.store.put(key, value).map_err(Error::store("create", key))?;
                    format!("version {version}")
                };
                self.emit(EventKind::Created, key, detail);
                return Ok(Upsert::Created);
            };

            if current.value == value {
                self.emit(EventKind::Unchanged, key, "");
                return Ok(Upsert::Unchanged);
            }

            if self.options.dry_run {
                self.emit(EventKind::Updated, key, "dry-run");
                return Ok(Upsert::Updated);
            }

            let swapped = self
                .store
                .compare_and_swap(key, value, current.version)
                .map_err(Error::store("update", key))?;
            if swapped {
                self.emit(EventKind::Updated, key, format!("from version {}", current.version));
                return Ok(Upsert::Updated);
            }

            self.emit(
                EventKind::CasRetry,
                key,
                format!("attempt {attempt}/{cas_try} lost at version {}", current.version),
            );
        }

        Err(Error::CasExhausted {
            op: "update",
            key: key.to_string(),
            attempts: cas_try,
        })
    }

    fn delete_orphans(&self, report: &mut SyncReport) -> Result<()> {
        for entry in scan::content_entries(&self.store, &self.mapping)? {
            let path = self.mapping.to_local_path(&entry.key)?;
            let exists = io::file_exists(&path).map_err(Error::local("check", &path))?;

            if exists {
                self.emit(EventKind::Retained, &entry.key, "");
                report.retained.push(entry.key);
                continue;
            }

            self.delete(&entry)?;
            report.deleted.push(entry.key);
        }
        Ok(())
    }

    /// Delete an orphaned entry, starting from the version it was listed at.
    ///
    /// After a lost race the key is read again: if it is gone the delete is
    /// complete, otherwise the next attempt uses the fresh version.
    fn delete(&self, entry: &StoreEntry) -> Result<()> {
        let key = entry.key.as_str();
        let cas_try = self.options.cas_try;

        if self.options.dry_run {
            self.emit(EventKind::Deleted, key, "dry-run");
            return Ok(());
        }

        let mut version = entry.version;
        for attempt in 1..=cas_try {
            let deleted = self
                .store
                .compare_and_delete(key, version)
                .map_err(Error::store("delete", key))?;
            if deleted {
                self.emit(EventKind::Deleted, key, format!("at version {version}"));
                return Ok(());
            }

            self.emit(
                EventKind::DeleteRetry,
                key,
                format!("attempt {attempt}/{cas_try} lost at version {version}"),
            );

            if attempt < cas_try {
                match self.store.get(key).map_err(Error::store("read", key))? {
                    Some(current) => version = current.version,
                    None => {
                        self.emit(EventKind::Deleted, key, "already absent");
                        return Ok(());
                    }
                }
            }
        }

        Err(Error::CasExhausted {
            op: "delete",
            key: key.to_string(),
            attempts: cas_try,
        })
    }

    fn emit(&self, kind: EventKind, key: &str, detail: impl Into<String>) {
        self.observer.on_event(&SyncEvent::new(kind, key, detail));
    }
}
