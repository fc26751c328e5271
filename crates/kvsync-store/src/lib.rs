//! Key-value store clients for kvsync
//!
//! The reconciliation engine only ever talks to a [`KvStore`]. This crate
//! defines that contract together with two implementations:
//!
//! - [`ConsulStore`]: blocking HTTP adapter for the Consul KV API
//! - [`MemoryStore`]: in-process store with the same versioning rules
//!
//! Every key carries a [`ModifyIndex`] that grows on each write. Writes and
//! deletes conditioned on an index are atomic per key, which is all the
//! engine needs to stay safe against concurrent external writers.

pub mod client;
pub mod config;
pub mod consul;
pub mod entry;
pub mod error;
pub mod memory;

pub use client::KvStore;
pub use config::StoreConfig;
pub use consul::ConsulStore;
pub use entry::{ModifyIndex, StoreEntry};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
