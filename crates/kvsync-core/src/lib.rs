//! Reconciliation engine for kvsync
//!
//! Keeps a local directory tree and a key prefix in a key-value store
//! mirrored:
//!
//! - **Mapping**: bijective translation between local paths and store keys
//! - **Fetcher**: one-way mirror from the store onto disk
//! - **Syncer**: two-way reconcile pushing local files with compare-and-swap
//!   writes, then deleting store keys that no longer exist locally
//! - **Events**: injectable observer receiving one event per key outcome
//!
//! # Architecture
//!
//! ```text
//!                 kvsync-cli
//!                     |
//!                kvsync-core
//!                  /      \
//!          kvsync-fs    kvsync-store
//! ```
//!
//! # Example
//!
//! ```no_run
//! use kvsync_core::{Mapping, SyncOptions, Syncer};
//! use kvsync_store::StoreConfig;
//!
//! fn push() -> kvsync_core::Result<()> {
//!     let mapping = Mapping::new("./config", "services/web");
//!     let syncer = Syncer::connect(&StoreConfig::default(), mapping, SyncOptions::default())?;
//!     let report = syncer.sync()?;
//!     println!("{} keys changed", report.changes());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod event;
pub mod fetch;
pub mod mapping;
pub mod report;
mod scan;
pub mod sync;

pub use error::{Error, Result};
pub use event::{EventKind, RecordingObserver, SyncEvent, SyncObserver, TracingObserver};
pub use fetch::Fetcher;
pub use mapping::Mapping;
pub use report::{FetchReport, FetchedFile, SyncReport};
pub use sync::{DEFAULT_CAS_TRY, SyncOptions, Syncer};
